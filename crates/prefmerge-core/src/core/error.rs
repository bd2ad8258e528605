//! Error types for merge operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for merge operations.
pub type Result<T> = std::result::Result<T, PrefMergeError>;

/// Errors that can occur while loading settings or merging a target.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum PrefMergeError {
    #[error("Invalid merge settings: {0}")]
    Validation(String),

    #[error("Failed to parse {path} as {format}: {message}")]
    Parse {
        path: String,
        format: &'static str,
        message: String,
    },

    #[error("Failed to download document from \"{url}\": {message}")]
    Fetch { url: String, message: String },

    #[error("Failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Expected object. Cannot merge {0}")]
    MergeType(String),

    #[error("Failed to write output {path:?}: {message}")]
    Write { path: PathBuf, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[cfg(feature = "native")]
    #[error("Notify error: {0}")]
    Notify(#[from] notify::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PrefMergeError {
    /// Short label for the failure class, used in user-facing messages.
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self {
            PrefMergeError::Validation(_) | PrefMergeError::Config(_) => "invalid settings",
            PrefMergeError::Parse { .. } | PrefMergeError::Json(_) | PrefMergeError::Yaml(_) => {
                "parse error"
            }
            PrefMergeError::Fetch { .. } => "fetch error",
            PrefMergeError::Read { .. } => "read error",
            PrefMergeError::MergeType(_) => "merge type error",
            PrefMergeError::Write { .. } => "write error",
            PrefMergeError::Io(_) => "I/O error",
            #[cfg(feature = "native")]
            PrefMergeError::Notify(_) => "watch error",
            PrefMergeError::Internal(_) => "internal error",
        }
    }

    /// Check if this error was caused by a source that could not be obtained.
    #[inline]
    #[must_use]
    pub fn is_source_failure(&self) -> bool {
        matches!(
            self,
            PrefMergeError::Fetch { .. } | PrefMergeError::Read { .. }
        )
    }
}
