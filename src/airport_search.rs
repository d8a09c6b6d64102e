//! Autocomplete state for the origin/destination fields.
//!
//! Two sources feed one option list: a debounced free-text search against
//! the aggregator (active from 2 characters), and a geolocation-seeded
//! nearby-airport list installed once at startup. Both form fields share
//! this controller, matching the single suggestion pool of the form.

use crate::cache::{CacheOptions, QueryCache};
use crate::models::Airport;
use std::time::{Duration, Instant};

pub const MIN_QUERY_LEN: usize = 2;
pub const DEBOUNCE: Duration = Duration::from_millis(300);

const STALE_TIME: Duration = Duration::from_secs(10 * 60);
const RETENTION_TIME: Duration = Duration::from_secs(60 * 60);

/// Work the event loop must dispatch after polling the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AirportFetch {
    pub term: String,
}

pub struct AirportSearchController {
    input: String,
    committed: String,
    deadline: Option<Instant>,
    nearby: Vec<Airport>,
    results: Vec<Airport>,
    is_loading: bool,
    cache: QueryCache<String, Vec<Airport>>,
}

impl AirportSearchController {
    pub fn new() -> Self {
        Self {
            input: String::new(),
            committed: String::new(),
            deadline: None,
            nearby: Vec::new(),
            results: Vec::new(),
            is_loading: false,
            cache: QueryCache::new(CacheOptions {
                stale_time: STALE_TIME,
                retention_time: RETENTION_TIME,
                retry_limit: 1,
            }),
        }
    }

    /// Records a keystroke. Each call moves the debounce deadline; nothing
    /// is dispatched until the input has been quiet for [`DEBOUNCE`].
    pub fn on_input(&mut self, text: &str, now: Instant) {
        self.input = text.to_string();
        self.deadline = Some(now + DEBOUNCE);
    }

    /// Installs the geolocation-seeded fallback list. A fix that arrives
    /// after the text search has already taken over is dropped, so the
    /// cleared-on-activation rule below holds regardless of timing.
    pub fn set_nearby(&mut self, airports: Vec<Airport>) {
        if self.committed.len() < MIN_QUERY_LEN {
            self.nearby = airports;
        }
    }

    /// Advances the debounce timer and the underlying query; called on every
    /// event-loop tick. Returns a fetch to dispatch when the trailing input
    /// value commits (or a cached term has gone stale).
    pub fn poll(&mut self, now: Instant) -> Option<AirportFetch> {
        if self.deadline.is_some_and(|d| now >= d) {
            self.deadline = None;
            self.committed = self.input.clone();
            if self.committed.len() >= MIN_QUERY_LEN {
                // Text search takes over: the nearby list is cleared and not
                // restored if the field later drops below the minimum again.
                self.nearby.clear();
            }
        }

        let enabled = self.committed.len() >= MIN_QUERY_LEN;
        let obs = self.cache.observe(&self.committed, enabled, now);
        self.is_loading = enabled && obs.is_loading;
        self.results = obs.data.unwrap_or_default();
        self.cache.evict_expired(now);

        obs.fetch_needed.then(|| AirportFetch {
            term: self.committed.clone(),
        })
    }

    /// Applies a completed text search under its dispatch term.
    pub fn apply_results(&mut self, term: &str, airports: Vec<Airport>, now: Instant) {
        self.cache.complete_ok(&term.to_string(), airports, now);
    }

    /// The option list the form shows: text-search results once the
    /// committed term is long enough, the nearby list otherwise.
    pub fn options(&self) -> &[Airport] {
        if self.committed.len() >= MIN_QUERY_LEN {
            &self.results
        } else {
            &self.nearby
        }
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }
}

impl Default for AirportSearchController {
    fn default() -> Self {
        Self::new()
    }
}
