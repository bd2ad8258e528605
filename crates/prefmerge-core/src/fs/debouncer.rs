use std::collections::HashMap;
use std::hash::Hash;
use tokio::time::{Duration, Instant};

/// Debounce deadlines keyed by `K`.
///
/// Scheduling a key that is already pending pushes its deadline back, so a
/// burst of triggers fires once, a quiet window after the last one.
#[derive(Debug)]
pub struct PendingTimers<K> {
    quiet: Duration,
    pending: HashMap<K, Instant>,
}

impl<K: Eq + Hash + Clone> PendingTimers<K> {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: HashMap::new(),
        }
    }

    /// Cancel any pending deadline for `key` and set a new one.
    pub fn schedule(&mut self, key: K) {
        let deadline = Instant::now() + self.quiet;
        tracing::trace!("[Debouncer] Deadline set in {:?}", self.quiet);
        self.pending.insert(key, deadline);
    }

    pub fn cancel(&mut self, key: &K) -> bool {
        self.pending.remove(key).is_some()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.pending.contains_key(key)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().min().copied()
    }

    /// Remove and return every key whose deadline has passed.
    pub fn take_due(&mut self, now: Instant) -> Vec<K> {
        let mut due = Vec::new();
        self.pending.retain(|key, deadline| {
            if now >= *deadline {
                due.push(key.clone());
                false
            } else {
                true
            }
        });
        due
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
