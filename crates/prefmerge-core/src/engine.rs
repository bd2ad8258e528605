//! [`MergeEngine`]: settings, workspace state, the content cache and the
//! host collaborators, shared by the reactor and every merge run.

use crate::core::{Clock, DocumentStore, Notifier, RemoteFetch};
use crate::fetch::SourceFetcher;
use crate::fs::config::Settings;
use crate::fs::paths::resolve_path;
use crate::fs::state::{WorkspaceRoot, WorkspaceState};
use crate::merge::{MergePipeline, MergeStatus, MergeTarget};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

pub struct MergeEngine {
    settings: RwLock<Arc<Settings>>,
    workspace_root: RwLock<WorkspaceRoot>,
    workspace_state: Mutex<WorkspaceState>,
    fetcher: SourceFetcher,
    store: Arc<dyn DocumentStore>,
    notifier: Arc<dyn Notifier>,
    /// One lock per resolved output path; runs writing the same output never overlap.
    output_locks: Mutex<HashMap<PathBuf, Arc<tokio::sync::Mutex<()>>>>,
}

impl MergeEngine {
    pub fn new(
        settings: Settings,
        root: WorkspaceRoot,
        store: Arc<dyn DocumentStore>,
        notifier: Arc<dyn Notifier>,
        remote: Arc<dyn RemoteFetch>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            settings: RwLock::new(Arc::new(settings)),
            workspace_root: RwLock::new(root),
            workspace_state: Mutex::new(WorkspaceState::new()),
            fetcher: SourceFetcher::new(remote, store.clone(), clock),
            store,
            notifier,
            output_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Snapshot of the current settings.
    pub fn settings(&self) -> Arc<Settings> {
        self.settings.read().clone()
    }

    pub fn set_settings(&self, settings: Settings) {
        *self.settings.write() = Arc::new(settings);
    }

    pub fn workspace_root(&self) -> WorkspaceRoot {
        self.workspace_root.read().clone()
    }

    pub fn set_workspace_root(&self, root: WorkspaceRoot) {
        tracing::info!("[Engine] Workspace root: {:?}", root.path());
        *self.workspace_root.write() = root;
    }

    /// Resolve a local path against the current workspace root.
    pub fn resolve(&self, path: &str) -> PathBuf {
        resolve_path(path, &self.workspace_root.read())
    }

    pub fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }

    pub fn notifier(&self) -> &dyn Notifier {
        self.notifier.as_ref()
    }

    pub fn fetcher(&self) -> &SourceFetcher {
        &self.fetcher
    }

    /// Mark the current workspace as notified. True the first time only.
    pub fn mark_workspace_notified(&self) -> bool {
        let root = self.workspace_root();
        self.workspace_state.lock().mark_notified(&root)
    }

    pub fn workspace_notified(&self) -> bool {
        let root = self.workspace_root();
        self.workspace_state.lock().get(&root).notified
    }

    /// Run one merge of `target`. Failures are reported, never returned.
    pub async fn merge(&self, target: &MergeTarget) -> MergeStatus {
        let lock = {
            let mut locks = self.output_locks.lock();
            locks
                .entry(self.resolve(&target.output.path))
                .or_default()
                .clone()
        };
        let _guard = lock.lock().await;
        MergePipeline::new(self, target).run().await
    }

    /// Merge every configured target in order.
    pub async fn merge_all(&self) -> Vec<MergeStatus> {
        let settings = self.settings();
        let mut statuses = Vec::with_capacity(settings.targets.len());
        for target in &settings.targets {
            statuses.push(self.merge(target).await);
        }
        statuses
    }
}
