use crate::codec::DocumentType;
use crate::core::error::Result;
use async_trait::async_trait;
use std::any::Any;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Abstraction for wall-clock time, in milliseconds.
pub trait Clock: Send + Sync + 'static {
    fn now_ms(&self) -> u64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Abstraction for downloading remote sources.
#[async_trait]
pub trait RemoteFetch: Send + Sync + 'static {
    /// GET `url` and return the body. Non-2xx responses are errors.
    async fn get(&self, url: &str) -> Result<String>;
}

/// Abstraction for reading, writing and displaying documents.
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    async fn read(&self, path: &Path) -> Result<String>;

    /// Replace the document content. Returns `false` without touching the
    /// document when it already holds exactly `content`.
    async fn write(&self, path: &Path, content: &str) -> Result<bool>;

    /// Display `content` (or the document at `path` when `None`) for diagnosis.
    async fn show(&self, path: &Path, content: Option<&str>, doc_type: DocumentType) -> bool;
}

/// User-facing messages.
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    /// Informational message. Returns the chosen action, if any.
    async fn info(&self, message: &str, actions: &[&str]) -> Option<String>;

    fn warn(&self, message: &str);

    /// Error message. Returns the chosen action, if any.
    async fn error(&self, message: &str, actions: &[&str]) -> Option<String>;

    /// Transient status message.
    fn status(&self, message: &str, duration: Duration);

    /// Called when the user asked to reload after a merge.
    fn reload(&self) {}
}

pub type WatchCallback = Arc<dyn Fn() + Send + Sync>;

/// Keeps a watch registration alive. Dropping it disposes the watch.
pub struct WatchHandle {
    _guard: Box<dyn Any + Send>,
}

impl WatchHandle {
    pub fn new<G: Any + Send>(guard: G) -> Self {
        Self {
            _guard: Box::new(guard),
        }
    }

    pub fn dispose(self) {}
}

/// Abstraction for filesystem change notifications.
pub trait WatchProvider: Send + Sync + 'static {
    /// Invoke `on_change` whenever the file at `path` is created or modified.
    fn watch(&self, path: &Path, on_change: WatchCallback) -> Result<WatchHandle>;
}
