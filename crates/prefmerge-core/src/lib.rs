//! prefmerge-core: merge layered preference documents into one output.
//!
//! The crate is organised the way the engine runs:
//!
//! - **codec**: parse JSON / JSON-with-comments / YAML / text into a [`Value`] and back.
//! - **merge**: depth-limited object merging and the per-target merge pipeline.
//! - **fetch**: local and remote source resolution with a time-boxed content cache.
//! - **fs**: settings, path expansion, the document store, watching, and the change reactor.
//! - **engine**: [`MergeEngine`], the single owner of all mutable engine state.

pub mod codec;
pub mod core;
pub mod engine;
pub mod fetch;
pub mod fs;
pub mod merge;

// Top-level re-exports for common usage
pub use crate::codec::{DocumentType, Mapping, OutputType, Value};
pub use crate::core::error::{PrefMergeError, Result};
pub use crate::core::traits::{Clock, DocumentStore, Notifier, RemoteFetch, SystemClock, WatchProvider};
pub use crate::engine::MergeEngine;
pub use crate::fs::config::Settings;
pub use crate::fs::reactor::{ChangeReactor, ReactorEvent, ReactorHandle};
pub use crate::merge::{MergeOutput, MergeSource, MergeStatus, MergeTarget};

#[cfg(feature = "native")]
pub use crate::fetch::http::{FetchConfig, ReqwestFetch};
#[cfg(feature = "native")]
pub use crate::fs::watcher::NotifyWatchProvider;
