//! Error type, collaborator traits, and their default implementations.

pub mod error;
pub mod notifier;
pub mod traits;

pub use error::{PrefMergeError, Result};
pub use notifier::ConsoleNotifier;
pub use traits::{
    Clock, DocumentStore, Notifier, RemoteFetch, SystemClock, WatchCallback, WatchHandle,
    WatchProvider,
};
