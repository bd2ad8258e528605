//! Decides when targets are merged.
//!
//! A single task owns the watch registrations, the debounce deadlines and
//! the current target list. Everything else talks to it through a
//! [`ReactorHandle`].

use crate::core::{WatchCallback, WatchHandle, WatchProvider};
use crate::engine::MergeEngine;
use crate::fs::config::{Settings, SettingsLoader};
use crate::fs::debouncer::PendingTimers;
use crate::fs::state::WorkspaceRoot;
use crate::merge::MergeTarget;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Quiet window before a changed target is merged or a restart runs.
pub const DEBOUNCE: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReactorEvent {
    /// A watched source of `target` changed. Events from an older
    /// registration `generation` are ignored.
    SourceChanged { generation: u64, target: usize },
    ConfigChanged,
    WorkspaceChanged(Option<PathBuf>),
    /// Reload settings and merge every target now.
    MergeAll,
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum TimerKey {
    Target(usize),
    Restart,
}

/// Cloneable sender side of a [`ChangeReactor`].
#[derive(Debug, Clone)]
pub struct ReactorHandle {
    tx: mpsc::UnboundedSender<ReactorEvent>,
}

impl ReactorHandle {
    pub fn send(&self, event: ReactorEvent) {
        if self.tx.send(event).is_err() {
            debug!("[Reactor] Event dropped, reactor stopped");
        }
    }

    pub fn config_changed(&self) {
        self.send(ReactorEvent::ConfigChanged);
    }

    pub fn workspace_changed(&self, root: Option<PathBuf>) {
        self.send(ReactorEvent::WorkspaceChanged(root));
    }

    pub fn merge_all(&self) {
        self.send(ReactorEvent::MergeAll);
    }

    pub fn shutdown(&self) {
        self.send(ReactorEvent::Shutdown);
    }
}

pub struct ChangeReactor {
    engine: Arc<MergeEngine>,
    loader: Arc<dyn SettingsLoader>,
    watcher: Arc<dyn WatchProvider>,
    tx: mpsc::UnboundedSender<ReactorEvent>,
    rx: Option<mpsc::UnboundedReceiver<ReactorEvent>>,
    timers: PendingTimers<TimerKey>,
    watches: Vec<WatchHandle>,
    targets: Vec<MergeTarget>,
    generation: u64,
}

impl ChangeReactor {
    pub fn new(
        engine: Arc<MergeEngine>,
        loader: Arc<dyn SettingsLoader>,
        watcher: Arc<dyn WatchProvider>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            engine,
            loader,
            watcher,
            tx,
            rx: Some(rx),
            timers: PendingTimers::new(DEBOUNCE),
            watches: Vec::new(),
            targets: Vec::new(),
            generation: 0,
        }
    }

    pub fn handle(&self) -> ReactorHandle {
        ReactorHandle {
            tx: self.tx.clone(),
        }
    }

    /// Dispose all watches, then merge every target in order, registering
    /// its watches right after its merge.
    pub async fn start(&mut self) {
        self.dispose_watches();
        self.timers.clear();
        self.generation += 1;

        let settings = self.engine.settings();
        self.targets = settings.targets.clone();
        info!(
            "[Reactor] Starting {} target(s), generation {}",
            self.targets.len(),
            self.generation
        );

        let targets = self.targets.clone();
        for (index, target) in targets.iter().enumerate() {
            self.engine.merge(target).await;
            if settings.watch_sources {
                self.watch(index, target);
            }
        }
    }

    /// Process events until shutdown.
    pub async fn run(mut self) {
        let Some(mut rx) = self.rx.take() else {
            error!("[Reactor] run() called twice");
            return;
        };

        if self.engine.settings().merge_on_startup {
            self.start().await;
        }

        loop {
            let deadline = self.timers.next_deadline();
            tokio::select! {
                event = rx.recv() => match event {
                    Some(ReactorEvent::Shutdown) | None => break,
                    Some(event) => self.handle_event(event).await,
                },
                _ = sleep_until(deadline) => self.fire_due().await,
            }
        }

        self.dispose_watches();
        info!("[Reactor] Stopped");
    }

    async fn handle_event(&mut self, event: ReactorEvent) {
        match event {
            ReactorEvent::SourceChanged { generation, target } => {
                if generation != self.generation {
                    debug!("[Reactor] Ignoring change from stale registration");
                    return;
                }
                self.timers.schedule(TimerKey::Target(target));
            }
            ReactorEvent::ConfigChanged => {
                if let Some(settings) = reload(self.loader.as_ref(), &self.engine).await {
                    let changed = settings.targets != self.engine.settings().targets;
                    self.engine.set_settings(settings);
                    if changed {
                        info!("[Reactor] Merge targets changed, scheduling restart");
                        self.schedule_restart();
                    } else {
                        debug!("[Reactor] Settings changed, targets unchanged");
                    }
                }
            }
            ReactorEvent::WorkspaceChanged(root) => {
                self.engine
                    .set_workspace_root(WorkspaceRoot::from_option(root));
                if let Some(settings) = reload(self.loader.as_ref(), &self.engine).await {
                    self.engine.set_settings(settings);
                }
                self.schedule_restart();
            }
            ReactorEvent::MergeAll => {
                if let Some(settings) = reload(self.loader.as_ref(), &self.engine).await {
                    self.engine.set_settings(settings);
                }
                self.start().await;
            }
            ReactorEvent::Shutdown => {}
        }
    }

    async fn fire_due(&mut self) {
        let due = self.timers.take_due(Instant::now());
        if due.contains(&TimerKey::Restart) {
            self.start().await;
            return;
        }

        for key in due {
            let TimerKey::Target(index) = key else {
                continue;
            };
            let Some(target) = self.targets.get(index).cloned() else {
                continue;
            };
            let engine = self.engine.clone();
            debug!("[Reactor] Re-merging {}", target.output.path);
            tokio::spawn(async move {
                engine.merge(&target).await;
            });
        }
    }

    fn schedule_restart(&mut self) {
        self.timers.schedule(TimerKey::Restart);
    }

    fn watch(&mut self, index: usize, target: &MergeTarget) {
        for source in &target.sources {
            if source.is_remote() {
                self.timers.schedule(TimerKey::Target(index));
                continue;
            }

            let path = self.engine.resolve(&source.path);
            let tx = self.tx.clone();
            let generation = self.generation;
            let on_change: WatchCallback = Arc::new(move || {
                let _ = tx.send(ReactorEvent::SourceChanged {
                    generation,
                    target: index,
                });
            });

            match self.watcher.watch(&path, on_change) {
                Ok(handle) => self.watches.push(handle),
                Err(e) => warn!("[Reactor] Cannot watch {:?}: {}", path, e),
            }
        }
    }

    fn dispose_watches(&mut self) {
        for handle in self.watches.drain(..) {
            handle.dispose();
        }
    }
}

async fn reload(loader: &dyn SettingsLoader, engine: &MergeEngine) -> Option<Settings> {
    match loader.load(&engine.workspace_root()).await {
        Ok(settings) => Some(settings),
        Err(e) => {
            error!("[Reactor] Failed to reload settings: {}", e);
            engine
                .notifier()
                .warn(&format!("Failed to reload settings, keeping previous ones: {}", e));
            None
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
