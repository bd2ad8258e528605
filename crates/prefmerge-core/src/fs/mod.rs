//! # Filesystem side of the engine
//!
//! Settings loading, path handling, the on-disk document store, source
//! watching, and the change reactor that decides when targets re-merge.

pub mod config;
pub mod debouncer;
pub mod paths;
pub mod reactor;
pub mod state;
pub mod store;
#[cfg(feature = "native")]
pub mod watcher;

pub use config::{validate_targets, FileSettingsLoader, Settings, SettingsLoader};
pub use debouncer::PendingTimers;
pub use paths::{expand_path, is_web_url, resolve_path};
pub use reactor::{ChangeReactor, ReactorEvent, ReactorHandle};
pub use state::{WorkspaceRoot, WorkspaceState};
pub use store::{atomic_write, FsDocumentStore};
#[cfg(feature = "native")]
pub use watcher::NotifyWatchProvider;
