use crate::core::{PrefMergeError, Result, WatchCallback, WatchHandle, WatchProvider};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::ffi::{OsStr, OsString};
use std::path::Path;

/// [`WatchProvider`] on top of `notify`.
///
/// Watches the parent directory so that a file replaced by rename (as
/// editors and [`atomic_write`](crate::fs::atomic_write) do) keeps firing.
#[derive(Debug, Clone, Default)]
pub struct NotifyWatchProvider;

impl NotifyWatchProvider {
    pub fn new() -> Self {
        Self
    }
}

impl WatchProvider for NotifyWatchProvider {
    fn watch(&self, path: &Path, on_change: WatchCallback) -> Result<WatchHandle> {
        let file_name: OsString = path
            .file_name()
            .ok_or_else(|| PrefMergeError::Config(format!("Cannot watch {:?}", path)))?
            .to_os_string();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => std::path::PathBuf::from("."),
        };

        let watched = path.to_path_buf();
        let mut watcher: RecommendedWatcher =
            notify::recommended_watcher(move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if is_relevant(&event, &file_name) {
                        tracing::debug!("[Watcher] Change in {:?}", watched);
                        on_change();
                    }
                }
                Err(e) => tracing::error!("[Watcher] Watch error for {:?}: {}", watched, e),
            })?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        tracing::debug!("[Watcher] Watching {:?}", path);
        Ok(WatchHandle::new(watcher))
    }
}

/// Create and modify events touching `file_name`.
pub fn is_relevant(event: &Event, file_name: &OsStr) -> bool {
    if !(event.kind.is_create() || event.kind.is_modify()) {
        return false;
    }
    event
        .paths
        .iter()
        .any(|p| p.file_name() == Some(file_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, EventKind, ModifyKind};
    use std::path::PathBuf;

    fn event(kind: EventKind, path: &str) -> Event {
        Event::new(kind).add_path(PathBuf::from(path))
    }

    #[test]
    fn test_relevant_events() {
        let name = OsStr::new("base.json");
        assert!(is_relevant(
            &event(EventKind::Modify(ModifyKind::Any), "/ws/base.json"),
            name
        ));
        assert!(is_relevant(
            &event(EventKind::Create(CreateKind::File), "/ws/base.json"),
            name
        ));
        assert!(!is_relevant(
            &event(EventKind::Modify(ModifyKind::Any), "/ws/other.json"),
            name
        ));
        assert!(!is_relevant(
            &event(EventKind::Access(AccessKind::Any), "/ws/base.json"),
            name
        ));
    }

    #[test]
    fn test_watch_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("base.json");
        let result = NotifyWatchProvider::new().watch(&path, std::sync::Arc::new(|| {}));
        assert!(result.is_err());
    }
}
