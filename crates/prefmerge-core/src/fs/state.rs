use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Key for per-workspace state.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WorkspaceRoot {
    Folder(PathBuf),
    /// Sentinel for "no workspace open".
    NoWorkspace,
}

impl WorkspaceRoot {
    pub fn from_option(path: Option<PathBuf>) -> Self {
        path.map(WorkspaceRoot::Folder)
            .unwrap_or(WorkspaceRoot::NoWorkspace)
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            WorkspaceRoot::Folder(p) => Some(p),
            WorkspaceRoot::NoWorkspace => None,
        }
    }

    /// Value substituted for `${workspaceFolder}`.
    pub fn folder_string(&self) -> String {
        self.path()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkspaceFlags {
    /// The one-time "now active" notification was shown.
    pub notified: bool,
}

/// Flags per workspace root, kept for the lifetime of the engine.
#[derive(Debug, Default)]
pub struct WorkspaceState {
    roots: HashMap<WorkspaceRoot, WorkspaceFlags>,
}

impl WorkspaceState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, root: &WorkspaceRoot) -> WorkspaceFlags {
        self.roots.get(root).copied().unwrap_or_default()
    }

    /// Set the notified flag. Returns true if it was not set before.
    pub fn mark_notified(&mut self, root: &WorkspaceRoot) -> bool {
        let flags = self.roots.entry(root.clone()).or_default();
        !std::mem::replace(&mut flags.notified, true)
    }
}
