use async_trait::async_trait;
use parking_lot::Mutex;
use prefmerge_core::core::{
    Clock, DocumentStore, Notifier, RemoteFetch, WatchCallback, WatchHandle, WatchProvider,
};
use prefmerge_core::fs::{SettingsLoader, WorkspaceRoot};
use prefmerge_core::{
    ChangeReactor, DocumentType, MergeEngine, MergeOutput, MergeSource, MergeTarget, OutputType,
    PrefMergeError, ReactorHandle, Result, Settings,
};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

#[derive(Default)]
struct MemStore {
    files: Mutex<HashMap<PathBuf, String>>,
    writes: AtomicUsize,
}

impl MemStore {
    fn put(&self, path: impl Into<PathBuf>, content: &str) {
        self.files.lock().insert(path.into(), content.to_string());
    }

    fn get(&self, path: impl AsRef<Path>) -> Option<String> {
        self.files.lock().get(path.as_ref()).cloned()
    }

    fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for MemStore {
    async fn read(&self, path: &Path) -> Result<String> {
        self.get(path).ok_or_else(|| PrefMergeError::Read {
            path: path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::NotFound, "not found"),
        })
    }

    async fn write(&self, path: &Path, content: &str) -> Result<bool> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut files = self.files.lock();
        if files.get(path).map(String::as_str) == Some(content) {
            return Ok(false);
        }
        files.insert(path.to_path_buf(), content.to_string());
        Ok(true)
    }

    async fn show(&self, _path: &Path, _content: Option<&str>, _doc_type: DocumentType) -> bool {
        true
    }
}

#[derive(Default)]
struct SilentNotifier {
    warns: Mutex<Vec<String>>,
}

#[async_trait]
impl Notifier for SilentNotifier {
    async fn info(&self, _message: &str, _actions: &[&str]) -> Option<String> {
        None
    }

    fn warn(&self, message: &str) {
        self.warns.lock().push(message.to_string());
    }

    async fn error(&self, _message: &str, _actions: &[&str]) -> Option<String> {
        None
    }

    fn status(&self, _message: &str, _duration: Duration) {}
}

#[derive(Default)]
struct CountingRemote {
    calls: AtomicUsize,
}

#[async_trait]
impl RemoteFetch for CountingRemote {
    async fn get(&self, _url: &str) -> Result<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("{{\"remote\": {}}}", n))
    }
}

struct ZeroClock;

impl Clock for ZeroClock {
    fn now_ms(&self) -> u64 {
        0
    }
}

struct Registration {
    path: PathBuf,
    callback: WatchCallback,
    alive: Arc<AtomicBool>,
}

struct AliveGuard(Arc<AtomicBool>);

impl Drop for AliveGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct FakeWatcher {
    registrations: Mutex<Vec<Registration>>,
}

impl FakeWatcher {
    fn active(&self) -> Vec<PathBuf> {
        self.registrations
            .lock()
            .iter()
            .filter(|r| r.alive.load(Ordering::SeqCst))
            .map(|r| r.path.clone())
            .collect()
    }

    fn total(&self) -> usize {
        self.registrations.lock().len()
    }

    /// Fire the callback of every live registration for `path`.
    fn touch(&self, path: impl AsRef<Path>) {
        for r in self.registrations.lock().iter() {
            if r.alive.load(Ordering::SeqCst) && r.path == path.as_ref() {
                (r.callback)();
            }
        }
    }

    /// Fire registration `index` whether or not it is still live.
    fn fire(&self, index: usize) {
        let callback = self.registrations.lock()[index].callback.clone();
        callback();
    }
}

impl WatchProvider for FakeWatcher {
    fn watch(&self, path: &Path, on_change: WatchCallback) -> Result<WatchHandle> {
        let alive = Arc::new(AtomicBool::new(true));
        self.registrations.lock().push(Registration {
            path: path.to_path_buf(),
            callback: on_change,
            alive: alive.clone(),
        });
        Ok(WatchHandle::new(AliveGuard(alive)))
    }
}

/// Returns whatever settings were last stored; `None` simulates a broken file.
struct FakeLoader {
    settings: Mutex<Option<Settings>>,
}

impl FakeLoader {
    fn set(&self, settings: Option<Settings>) {
        *self.settings.lock() = settings;
    }
}

#[async_trait]
impl SettingsLoader for FakeLoader {
    async fn load(&self, _root: &WorkspaceRoot) -> Result<Settings> {
        self.settings
            .lock()
            .clone()
            .ok_or_else(|| PrefMergeError::Config("unexpected end of input".into()))
    }
}

const ROOT: &str = "/ws";

struct Harness {
    engine: Arc<MergeEngine>,
    store: Arc<MemStore>,
    watcher: Arc<FakeWatcher>,
    loader: Arc<FakeLoader>,
    notifier: Arc<SilentNotifier>,
    remote: Arc<CountingRemote>,
    handle: ReactorHandle,
    task: tokio::task::JoinHandle<()>,
}

impl Harness {
    async fn spawn(settings: Settings) -> Self {
        let store = Arc::new(MemStore::default());
        store.put("/ws/a.json", r#"{"a": 1}"#);
        store.put("/ws/b.json", r#"{"b": 1}"#);

        let watcher = Arc::new(FakeWatcher::default());
        let loader = Arc::new(FakeLoader {
            settings: Mutex::new(Some(settings.clone())),
        });
        let notifier = Arc::new(SilentNotifier::default());
        let remote = Arc::new(CountingRemote::default());
        let engine = Arc::new(MergeEngine::new(
            settings,
            WorkspaceRoot::Folder(PathBuf::from(ROOT)),
            store.clone(),
            notifier.clone(),
            remote.clone(),
            Arc::new(ZeroClock),
        ));

        let reactor = ChangeReactor::new(engine.clone(), loader.clone(), watcher.clone());
        let handle = reactor.handle();
        let task = tokio::spawn(reactor.run());
        settle().await;

        Self {
            engine,
            store,
            watcher,
            loader,
            notifier,
            remote,
            handle,
            task,
        }
    }

    async fn stop(self) {
        self.handle.shutdown();
        self.task.await.unwrap();
    }
}

async fn settle() {
    sleep(Duration::from_millis(10)).await;
}

fn target(sources: &[&str], output: &str) -> MergeTarget {
    MergeTarget::new(
        sources
            .iter()
            .map(|p| MergeSource::new(*p, DocumentType::Json))
            .collect(),
        MergeOutput::new(output, OutputType::Json),
    )
}

fn settings(targets: Vec<MergeTarget>) -> Settings {
    Settings {
        targets,
        notify_on_new_workspace: false,
        ..Settings::default()
    }
}

#[tokio::test(start_paused = true)]
async fn test_startup_merges_then_watches() {
    let h = Harness::spawn(settings(vec![target(&["a.json", "b.json"], "out.json")])).await;

    assert_eq!(
        h.store.get("/ws/out.json").as_deref(),
        Some("{\n  \"a\": 1,\n  \"b\": 1\n}\n")
    );
    assert_eq!(
        h.watcher.active(),
        vec![PathBuf::from("/ws/a.json"), PathBuf::from("/ws/b.json")]
    );
    h.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_no_merge_on_startup_when_disabled() {
    let s = Settings {
        merge_on_startup: false,
        ..settings(vec![target(&["a.json"], "out.json")])
    };
    let h = Harness::spawn(s).await;
    assert_eq!(h.store.writes(), 0);
    assert_eq!(h.watcher.total(), 0);

    h.handle.merge_all();
    settle().await;
    assert_eq!(h.store.writes(), 1);
    assert_eq!(h.watcher.active().len(), 1);
    h.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_burst_of_changes_merges_once() {
    let h = Harness::spawn(settings(vec![target(&["a.json", "b.json"], "out.json")])).await;
    assert_eq!(h.store.writes(), 1);

    h.store.put("/ws/a.json", r#"{"a": 2}"#);
    h.watcher.touch("/ws/a.json");
    sleep(Duration::from_millis(500)).await;
    h.watcher.touch("/ws/b.json");
    sleep(Duration::from_millis(400)).await;
    h.watcher.touch("/ws/a.json");

    sleep(Duration::from_millis(900)).await;
    assert_eq!(h.store.writes(), 1);

    sleep(Duration::from_millis(200)).await;
    assert_eq!(h.store.writes(), 2);
    assert_eq!(
        h.store.get("/ws/out.json").as_deref(),
        Some("{\n  \"a\": 2,\n  \"b\": 1\n}\n")
    );
    h.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_targets_debounce_independently() {
    let h = Harness::spawn(settings(vec![
        target(&["a.json"], "one.json"),
        target(&["b.json"], "two.json"),
    ]))
    .await;
    assert_eq!(h.store.writes(), 2);

    h.watcher.touch("/ws/a.json");
    sleep(Duration::from_millis(600)).await;
    h.watcher.touch("/ws/b.json");
    sleep(Duration::from_millis(500)).await;
    assert_eq!(h.store.writes(), 3);
    sleep(Duration::from_millis(600)).await;
    assert_eq!(h.store.writes(), 4);
    h.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_config_change_restarts_only_when_targets_change() {
    let initial = settings(vec![target(&["a.json"], "out.json")]);
    let h = Harness::spawn(initial.clone()).await;
    assert_eq!(h.watcher.total(), 1);

    // Same targets, different flags: settings replaced, no restart.
    h.loader.set(Some(Settings {
        notify_on_merge: true,
        ..initial.clone()
    }));
    h.handle.config_changed();
    sleep(Duration::from_millis(1500)).await;
    assert!(h.engine.settings().notify_on_merge);
    assert_eq!(h.watcher.total(), 1);
    assert_eq!(h.store.writes(), 1);

    h.loader
        .set(Some(settings(vec![target(&["a.json", "b.json"], "out.json")])));
    h.handle.config_changed();
    settle().await;
    assert_eq!(h.watcher.total(), 1);

    sleep(Duration::from_millis(1100)).await;
    assert_eq!(h.watcher.total(), 3);
    assert_eq!(
        h.watcher.active(),
        vec![PathBuf::from("/ws/a.json"), PathBuf::from("/ws/b.json")]
    );
    assert_eq!(
        h.store.get("/ws/out.json").as_deref(),
        Some("{\n  \"a\": 1,\n  \"b\": 1\n}\n")
    );
    h.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_workspace_change_always_restarts() {
    let h = Harness::spawn(settings(vec![target(&["a.json"], "out.json")])).await;
    h.store.put("/other/a.json", r#"{"other": true}"#);

    h.handle.workspace_changed(Some(PathBuf::from("/other")));
    sleep(Duration::from_millis(1100)).await;

    assert_eq!(h.watcher.active(), vec![PathBuf::from("/other/a.json")]);
    assert_eq!(
        h.store.get("/other/out.json").as_deref(),
        Some("{\n  \"other\": true\n}\n")
    );
    h.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_stale_registration_is_ignored() {
    let h = Harness::spawn(settings(vec![target(&["a.json"], "out.json")])).await;
    h.handle.merge_all();
    settle().await;
    assert_eq!(h.store.writes(), 2);
    assert_eq!(h.watcher.total(), 2);

    h.watcher.fire(0);
    sleep(Duration::from_millis(1500)).await;
    assert_eq!(h.store.writes(), 2);

    h.watcher.fire(1);
    sleep(Duration::from_millis(1500)).await;
    assert_eq!(h.store.writes(), 3);
    h.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_remote_source_triggers_once_at_registration() {
    let url = "https://example.com/shared.json";
    let h = Harness::spawn(settings(vec![target(&[url, "a.json"], "out.json")])).await;
    assert_eq!(h.remote.calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.watcher.active(), vec![PathBuf::from("/ws/a.json")]);

    sleep(Duration::from_millis(1100)).await;
    assert_eq!(h.store.writes(), 2);
    // Served from the cache inside the TTL.
    assert_eq!(h.remote.calls.load(Ordering::SeqCst), 1);

    sleep(Duration::from_millis(5000)).await;
    assert_eq!(h.store.writes(), 2);
    h.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_broken_settings_keep_previous() {
    let initial = settings(vec![target(&["a.json"], "out.json")]);
    let h = Harness::spawn(initial.clone()).await;

    h.loader.set(None);
    h.handle.config_changed();
    sleep(Duration::from_millis(1500)).await;

    assert_eq!(*h.engine.settings(), initial);
    assert_eq!(h.watcher.active().len(), 1);
    assert_eq!(h.notifier.warns.lock().len(), 1);
    h.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_disposes_watches() {
    let h = Harness::spawn(settings(vec![target(&["a.json", "b.json"], "out.json")])).await;
    let watcher = h.watcher.clone();
    assert_eq!(watcher.active().len(), 2);

    h.stop().await;
    assert!(watcher.active().is_empty());
}
