//! Source resolution: local files through the document store, web URLs
//! through [`RemoteFetch`] and the [`ContentCache`].

pub mod cache;
#[cfg(feature = "native")]
pub mod http;

pub use cache::ContentCache;

use crate::core::{DocumentStore, PrefMergeError, RemoteFetch, Result};
use crate::core::traits::Clock;
use crate::fs::paths::resolve_path;
use crate::fs::state::WorkspaceRoot;
use crate::merge::MergeSource;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Text obtained for one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched {
    /// Trimmed, non-empty content.
    Text(String),
    /// The source exists but has no content. Not an error.
    Empty,
}

pub struct SourceFetcher {
    remote: Arc<dyn RemoteFetch>,
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
    cache: Mutex<ContentCache>,
}

impl SourceFetcher {
    pub fn new(
        remote: Arc<dyn RemoteFetch>,
        store: Arc<dyn DocumentStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            remote,
            store,
            clock,
            cache: Mutex::new(ContentCache::new()),
        }
    }

    pub async fn fetch(
        &self,
        source: &MergeSource,
        root: &WorkspaceRoot,
        ttl: Duration,
    ) -> Result<Fetched> {
        if source.is_remote() {
            self.fetch_remote(&source.path, ttl).await
        } else {
            let path = resolve_path(&source.path, root);
            let text = self.store.read(&path).await?;
            Ok(non_empty(&text))
        }
    }

    async fn fetch_remote(&self, url: &str, ttl: Duration) -> Result<Fetched> {
        let ttl_ms = ttl.as_millis() as u64;
        {
            let cache = self.cache.lock();
            if let Some(text) = cache.get_fresh(url, self.clock.now_ms(), ttl_ms) {
                debug!("[Fetcher] Cache hit for {}", url);
                return Ok(Fetched::Text(text.to_string()));
            }
        }

        debug!("[Fetcher] GET {}", url);
        match self.remote.get(url).await {
            Ok(body) => {
                let mut cache = self.cache.lock();
                match non_empty(&body) {
                    Fetched::Text(text) => {
                        cache.record_success(url, text.clone(), self.clock.now_ms());
                        Ok(Fetched::Text(text))
                    }
                    Fetched::Empty => {
                        warn!("[Fetcher] Empty content from URL {}", url);
                        cache.record_empty();
                        Ok(Fetched::Empty)
                    }
                }
            }
            Err(e) => {
                self.cache.lock().record_failure(ttl_ms);
                Err(match e {
                    e @ PrefMergeError::Fetch { .. } => e,
                    other => PrefMergeError::Fetch {
                        url: url.to_string(),
                        message: other.to_string(),
                    },
                })
            }
        }
    }

    /// Run `f` against the cache.
    pub fn with_cache<R>(&self, f: impl FnOnce(&ContentCache) -> R) -> R {
        f(&self.cache.lock())
    }
}

fn non_empty(text: &str) -> Fetched {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Fetched::Empty
    } else {
        Fetched::Text(trimmed.to_string())
    }
}
