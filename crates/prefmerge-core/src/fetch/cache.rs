//! Time-boxed cache of remote source text.
//!
//! All entries share one `last_fetch_ms` timestamp. Any entry is stale once
//! more than the TTL has elapsed since the last successful fetch. Failures
//! push the timestamp forward instead of retrying in a loop.

use std::collections::HashMap;

/// Timestamp nudge after an empty response.
pub const EMPTY_BACKOFF_MS: u64 = 1000;

#[derive(Debug, Default)]
pub struct ContentCache {
    entries: HashMap<String, String>,
    last_fetch_ms: u64,
}

impl ContentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached text for `url`, unless absent or stale.
    pub fn get_fresh(&self, url: &str, now_ms: u64, ttl_ms: u64) -> Option<&str> {
        let text = self.entries.get(url)?;
        if now_ms.saturating_sub(self.last_fetch_ms) > ttl_ms {
            return None;
        }
        Some(text)
    }

    pub fn record_success(&mut self, url: &str, text: String, now_ms: u64) {
        self.entries.insert(url.to_string(), text);
        self.last_fetch_ms = now_ms;
    }

    /// The server answered with an empty body. Retry sooner than a failure.
    pub fn record_empty(&mut self) {
        self.last_fetch_ms += EMPTY_BACKOFF_MS;
    }

    /// The fetch failed. Back off by a quarter of the TTL.
    pub fn record_failure(&mut self, ttl_ms: u64) {
        self.last_fetch_ms += ttl_ms / 4;
    }

    pub fn last_fetch_ms(&self) -> u64 {
        self.last_fetch_ms
    }

    pub fn contains(&self, url: &str) -> bool {
        self.entries.contains_key(url)
    }
}
