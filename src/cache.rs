//! Key-based fetch orchestration for the skysearch client.
//!
//! Every remote lookup in the app (airport text search, nearby airports,
//! flight search) goes through a [`QueryCache`]: callers `observe` a key on
//! each pass of the event loop and the cache decides whether a fetch must be
//! dispatched. Completions are applied under the key that was active at
//! dispatch time, so a response for a key the user has since moved away from
//! lands in its own entry and is never rendered for the current key.
//!
//! The whole cache is owned by the event-loop thread; there is no locking
//! because there are no concurrent writers.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};
use tracing::debug;

/// Per-cache freshness and retry policy.
#[derive(Debug, Clone, Copy)]
pub struct CacheOptions {
    /// How long after a successful fetch the entry is served without refetch.
    pub stale_time: Duration,
    /// How long an unobserved entry is kept before eviction.
    pub retention_time: Duration,
    /// Automatic re-dispatches after a failed fetch. Fixed at 1 in this app.
    pub retry_limit: u32,
}

#[derive(Debug, Clone, PartialEq)]
enum EntryState {
    Loading,
    Success,
    Error(String),
}

#[derive(Debug)]
struct Entry<V> {
    value: Option<V>,
    fetched_at: Option<Instant>,
    state: EntryState,
    attempts: u32,
    last_observed: Instant,
}

/// What an observer sees for a key right now.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation<V> {
    pub data: Option<V>,
    pub is_loading: bool,
    pub error: Option<String>,
    /// True exactly when this observation started a fetch; the caller must
    /// dispatch one request for the key.
    pub fetch_needed: bool,
}

impl<V> Observation<V> {
    fn empty() -> Self {
        Self {
            data: None,
            is_loading: false,
            error: None,
            fetch_needed: false,
        }
    }
}

/// Instruction to the caller after a failed fetch completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Dispatch the same request again (still within the retry budget).
    Retry,
    /// Give up; the entry now holds the error until a later refetch clears it.
    Failed,
}

pub struct QueryCache<K, V> {
    entries: HashMap<K, Entry<V>>,
    options: CacheOptions,
}

impl<K: Eq + Hash + Clone, V: Clone> QueryCache<K, V> {
    pub fn new(options: CacheOptions) -> Self {
        Self {
            entries: HashMap::new(),
            options,
        }
    }

    /// Observes `key` and decides whether a fetch is due.
    ///
    /// With `enabled` false, nothing is ever dispatched; whatever is cached
    /// (fresh or stale) is served as-is. With `enabled` true, a fetch starts
    /// when the entry is absent or its last success has gone stale. A key
    /// already in flight is never dispatched twice, and an entry in the
    /// error state waits for an explicit [`invalidate`](Self::invalidate)
    /// rather than refetching on every observation.
    pub fn observe(&mut self, key: &K, enabled: bool, now: Instant) -> Observation<V> {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.last_observed = now;

            let fresh = matches!(entry.state, EntryState::Success)
                && entry
                    .fetched_at
                    .is_some_and(|at| now.duration_since(at) < self.options.stale_time);
            let refetch = enabled && !fresh && matches!(entry.state, EntryState::Success);

            if refetch {
                entry.state = EntryState::Loading;
                entry.attempts = 0;
            }

            return Observation {
                data: entry.value.clone(),
                is_loading: matches!(entry.state, EntryState::Loading),
                error: match &entry.state {
                    EntryState::Error(msg) => Some(msg.clone()),
                    _ => None,
                },
                fetch_needed: refetch,
            };
        }

        if !enabled {
            return Observation::empty();
        }

        self.entries.insert(
            key.clone(),
            Entry {
                value: None,
                fetched_at: None,
                state: EntryState::Loading,
                attempts: 0,
                last_observed: now,
            },
        );

        Observation {
            data: None,
            is_loading: true,
            error: None,
            fetch_needed: true,
        }
    }

    /// Applies a successful fetch under its dispatch key.
    pub fn complete_ok(&mut self, key: &K, value: V, now: Instant) {
        let entry = self.entries.entry(key.clone()).or_insert_with(|| Entry {
            value: None,
            fetched_at: None,
            state: EntryState::Loading,
            attempts: 0,
            last_observed: now,
        });
        entry.value = Some(value);
        entry.fetched_at = Some(now);
        entry.state = EntryState::Success;
        entry.attempts = 0;
    }

    /// Applies a failed fetch under its dispatch key. Returns [`Completion::Retry`]
    /// while the retry budget lasts; the caller re-dispatches the same request.
    pub fn complete_err(&mut self, key: &K, message: &str, now: Instant) -> Completion {
        let entry = self.entries.entry(key.clone()).or_insert_with(|| Entry {
            value: None,
            fetched_at: None,
            state: EntryState::Loading,
            attempts: 0,
            last_observed: now,
        });
        entry.attempts += 1;
        if entry.attempts <= self.options.retry_limit {
            debug!("fetch failed, retrying (attempt {})", entry.attempts);
            entry.state = EntryState::Loading;
            Completion::Retry
        } else {
            entry.state = EntryState::Error(message.to_string());
            Completion::Failed
        }
    }

    /// Forces the next enabled observation of `key` to refetch. Used when the
    /// user explicitly retries after an error.
    pub fn invalidate(&mut self, key: &K) {
        self.entries.remove(key);
    }

    /// Drops entries nobody has observed within the retention window.
    /// In-flight entries are kept so their completions still have a home.
    pub fn evict_expired(&mut self, now: Instant) {
        let retention = self.options.retention_time;
        self.entries.retain(|_, entry| {
            matches!(entry.state, EntryState::Loading)
                || now.duration_since(entry.last_observed) < retention
        });
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.len()
    }
}
