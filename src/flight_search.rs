//! Submit-gated flight query state.
//!
//! The form edits a [`SearchParams`] draft freely; nothing is fetched until
//! `submit()` freezes the draft into a snapshot. The snapshot keys the
//! cached query, so resubmitting unchanged parameters inside the freshness
//! window serves the previous result without touching the network.

use crate::cache::{CacheOptions, Completion, QueryCache};
use crate::models::{FlightSearchOutcome, Itinerary, SearchParams};
use std::time::{Duration, Instant};

const STALE_TIME: Duration = Duration::from_secs(5 * 60);
const RETENTION_TIME: Duration = Duration::from_secs(30 * 60);

/// Work the event loop must dispatch after polling the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlightFetch {
    pub params: SearchParams,
}

/// What the results pane shows.
#[derive(Debug, Clone, PartialEq)]
pub enum FlightSearchState {
    /// Nothing submitted yet.
    Idle,
    Loading,
    /// A completed search; the list may be empty ("no flights found").
    Success(Vec<Itinerary>),
    /// A failed search with its user-facing message.
    Error(String),
}

pub struct FlightSearchController {
    pub draft: SearchParams,
    active: Option<SearchParams>,
    state: FlightSearchState,
    cache: QueryCache<SearchParams, Vec<Itinerary>>,
}

impl FlightSearchController {
    pub fn new(draft: SearchParams) -> Self {
        Self {
            draft,
            active: None,
            state: FlightSearchState::Idle,
            cache: QueryCache::new(CacheOptions {
                stale_time: STALE_TIME,
                retention_time: RETENTION_TIME,
                retry_limit: 1,
            }),
        }
    }

    /// Whether the draft may be submitted. The form disables the search
    /// action on false rather than surfacing an error.
    pub fn can_submit(&self) -> bool {
        self.draft.is_complete()
    }

    /// Freezes the current draft into the active snapshot. Refused for
    /// incomplete drafts; later edits to the draft do not touch an already
    /// submitted search until the next submit.
    pub fn submit(&mut self) -> bool {
        if !self.can_submit() {
            return false;
        }
        self.active = Some(self.draft.clone());
        true
    }

    /// Clears an error notice. The next submit of the same parameters will
    /// fetch again instead of replaying the failure.
    pub fn dismiss_error(&mut self) {
        if let FlightSearchState::Error(_) = self.state {
            if let Some(active) = &self.active {
                self.cache.invalidate(active);
            }
            self.active = None;
            self.state = FlightSearchState::Idle;
        }
    }

    /// Advances the query; called on every event-loop tick. Returns a fetch
    /// to dispatch when the active snapshot needs one.
    pub fn poll(&mut self, now: Instant) -> Option<FlightFetch> {
        let Some(active) = self.active.clone() else {
            self.state = FlightSearchState::Idle;
            return None;
        };

        // The snapshot is complete by construction, but the cache gate is
        // still keyed on it: an incomplete snapshot must never dispatch.
        let obs = self.cache.observe(&active, active.is_complete(), now);
        self.state = if let Some(message) = obs.error {
            FlightSearchState::Error(message)
        } else if obs.is_loading {
            FlightSearchState::Loading
        } else if let Some(itineraries) = obs.data {
            FlightSearchState::Success(itineraries)
        } else {
            FlightSearchState::Idle
        };
        self.cache.evict_expired(now);

        obs.fetch_needed.then_some(FlightFetch { params: active })
    }

    /// Applies a completed flight search under its dispatch snapshot.
    /// Returns a fetch when the failure is still within the retry budget.
    pub fn apply_outcome(
        &mut self,
        params: &SearchParams,
        outcome: FlightSearchOutcome,
        now: Instant,
    ) -> Option<FlightFetch> {
        match outcome {
            FlightSearchOutcome::Success(itineraries) => {
                self.cache.complete_ok(params, itineraries, now);
                None
            }
            FlightSearchOutcome::Error(message) => {
                match self.cache.complete_err(params, &message, now) {
                    Completion::Retry => Some(FlightFetch {
                        params: params.clone(),
                    }),
                    Completion::Failed => None,
                }
            }
        }
    }

    pub fn state(&self) -> &FlightSearchState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, FlightSearchState::Loading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_params() -> SearchParams {
        SearchParams {
            origin_sky_id: "LHR".into(),
            origin_entity_id: "entity1".into(),
            destination_sky_id: "JFK".into(),
            destination_entity_id: "entity2".into(),
            departure_date: "2024-06-01".into(),
            ..Default::default()
        }
    }

    #[test]
    fn incomplete_draft_cannot_be_submitted() {
        let mut draft = complete_params();
        draft.origin_sky_id.clear();
        let mut c = FlightSearchController::new(draft);
        assert!(!c.can_submit());
        assert!(!c.submit());
        assert_eq!(c.poll(Instant::now()), None);
        assert_eq!(*c.state(), FlightSearchState::Idle);
    }

    #[test]
    fn submit_freezes_a_snapshot_and_dispatches_once() {
        let mut c = FlightSearchController::new(complete_params());
        let now = Instant::now();
        assert!(c.submit());

        let fetch = c.poll(now).unwrap();
        assert_eq!(fetch.params, complete_params());
        assert!(c.is_loading());

        // Editing the draft after submit does not change the active search.
        c.draft.destination_sky_id = "CDG".into();
        assert_eq!(c.poll(now), None);
        assert!(c.is_loading());
    }

    #[test]
    fn resubmitting_identical_params_within_freshness_hits_cache() {
        let mut c = FlightSearchController::new(complete_params());
        let now = Instant::now();
        c.submit();
        let fetch = c.poll(now).unwrap();
        c.apply_outcome(&fetch.params, FlightSearchOutcome::Success(vec![]), now);

        // Second submit, two minutes later, same parameters.
        c.submit();
        assert_eq!(c.poll(now + Duration::from_secs(120)), None);
        assert_eq!(*c.state(), FlightSearchState::Success(vec![]));
    }

    #[test]
    fn empty_result_is_success_not_error() {
        let mut c = FlightSearchController::new(complete_params());
        let now = Instant::now();
        c.submit();
        let fetch = c.poll(now).unwrap();
        c.apply_outcome(&fetch.params, FlightSearchOutcome::Success(vec![]), now);
        c.poll(now);
        assert_eq!(*c.state(), FlightSearchState::Success(vec![]));
    }

    #[test]
    fn failure_retries_once_then_surfaces_message() {
        let mut c = FlightSearchController::new(complete_params());
        let now = Instant::now();
        c.submit();
        let fetch = c.poll(now).unwrap();

        let outcome = FlightSearchOutcome::Error("Failed to fetch flight data.".into());
        let retry = c.apply_outcome(&fetch.params, outcome.clone(), now);
        assert_eq!(retry, Some(fetch.clone())); // one automatic retry

        let retry = c.apply_outcome(&fetch.params, outcome, now);
        assert_eq!(retry, None);
        c.poll(now);
        assert_eq!(
            *c.state(),
            FlightSearchState::Error("Failed to fetch flight data.".into())
        );
    }

    #[test]
    fn dismissing_an_error_allows_a_fresh_attempt() {
        let mut c = FlightSearchController::new(complete_params());
        let now = Instant::now();
        c.submit();
        let fetch = c.poll(now).unwrap();
        let outcome = FlightSearchOutcome::Error("boom".into());
        c.apply_outcome(&fetch.params, outcome.clone(), now);
        c.apply_outcome(&fetch.params, outcome, now);
        c.poll(now);
        assert!(matches!(c.state(), FlightSearchState::Error(_)));

        c.dismiss_error();
        assert_eq!(*c.state(), FlightSearchState::Idle);

        c.submit();
        assert!(c.poll(now).is_some());
    }
}
