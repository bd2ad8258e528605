use crate::codec::{DocumentType, OutputType, DEFAULT_INDENT};
use crate::core::{PrefMergeError, Result};
use crate::fs::paths::{expand_with_env, format_input_path};
use crate::fs::state::WorkspaceRoot;
use crate::merge::{MergeOutput, MergeSource, MergeTarget, DEFAULT_MERGE_DEPTH};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::warn;

const DEFAULT_SOURCE_TYPE: DocumentType = DocumentType::Jsonc;
const DEFAULT_OUTPUT_TYPE: OutputType = OutputType::Json;

/// Validated engine settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub targets: Vec<MergeTarget>,
    pub notify_on_merge: bool,
    pub notify_on_new_workspace: bool,
    pub merge_on_startup: bool,
    pub watch_sources: bool,
    /// Remote content cache lifetime in seconds.
    pub fetch_content_cache_time: u64,
    pub indent: usize,
    pub merge_depth: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            targets: Vec::new(),
            notify_on_merge: false,
            notify_on_new_workspace: default_true(),
            merge_on_startup: default_true(),
            watch_sources: default_true(),
            fetch_content_cache_time: default_cache_time(),
            indent: default_indent(),
            merge_depth: default_merge_depth(),
        }
    }
}

impl Settings {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.fetch_content_cache_time)
    }

    /// Parse a settings document (JSON with comments) and validate its targets.
    pub fn parse(text: &str, root: &WorkspaceRoot) -> Result<Self> {
        let raw: RawSettings =
            json5::from_str(text).map_err(|e| PrefMergeError::Config(e.to_string()))?;

        Ok(Settings {
            targets: validate_targets(&raw.targets, root),
            notify_on_merge: raw.notify_on_merge,
            notify_on_new_workspace: raw.notify_on_new_workspace,
            merge_on_startup: raw.merge_on_startup,
            watch_sources: raw.watch_sources,
            fetch_content_cache_time: raw.fetch_content_cache_time,
            indent: raw.indent,
            merge_depth: raw.merge_depth,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSettings {
    #[serde(default = "default_targets")]
    targets: JsonValue,
    #[serde(default)]
    notify_on_merge: bool,
    #[serde(default = "default_true")]
    notify_on_new_workspace: bool,
    #[serde(default = "default_true")]
    merge_on_startup: bool,
    #[serde(default = "default_true")]
    watch_sources: bool,
    #[serde(default = "default_cache_time")]
    fetch_content_cache_time: u64,
    #[serde(default = "default_indent")]
    indent: usize,
    #[serde(default = "default_merge_depth")]
    merge_depth: usize,
}

fn default_targets() -> JsonValue {
    JsonValue::Array(Vec::new())
}

fn default_true() -> bool {
    true
}

fn default_cache_time() -> u64 {
    60 * 5 // 5 minutes
}

fn default_indent() -> usize {
    DEFAULT_INDENT
}

fn default_merge_depth() -> usize {
    DEFAULT_MERGE_DEPTH
}

/// Source of settings for the reactor.
#[async_trait]
pub trait SettingsLoader: Send + Sync + 'static {
    async fn load(&self, root: &WorkspaceRoot) -> Result<Settings>;
}

/// Loads settings from a file. A missing or empty file yields defaults.
#[derive(Debug, Clone)]
pub struct FileSettingsLoader {
    path: PathBuf,
}

impl FileSettingsLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SettingsLoader for FileSettingsLoader {
    async fn load(&self, root: &WorkspaceRoot) -> Result<Settings> {
        if !self.path.exists() {
            warn!("[Config] {:?} not found, using default settings", self.path);
            return Ok(Settings::default());
        }

        let content = fs::read_to_string(&self.path)
            .await
            .map_err(|e| PrefMergeError::Read {
                path: self.path.clone(),
                source: e,
            })?;

        // Handle empty or whitespace-only config file
        if content.trim().is_empty() {
            warn!("[Config] Settings file is empty, using default settings");
            return Ok(Settings::default());
        }

        Settings::parse(&content, root)
    }
}

/// Validate raw `targets`. Malformed entries are dropped with a warning.
pub fn validate_targets(value: &JsonValue, root: &WorkspaceRoot) -> Vec<MergeTarget> {
    let mut targets = Vec::new();

    let Some(entries) = value.as_array() else {
        warn!("[Config] Invalid merge settings, expected array: {}", value);
        return targets;
    };

    for entry in entries {
        let Some(obj) = entry.as_object() else {
            warn!("[Config] Invalid merge settings, expected object: {}", entry);
            continue;
        };

        let sources: Vec<MergeSource> = obj
            .get("sources")
            .and_then(JsonValue::as_array)
            .map(|list| list.iter().filter_map(|s| validate_source(s, root)).collect())
            .unwrap_or_default();

        let output = obj.get("output").and_then(|o| validate_output(o, root));

        match output {
            Some(output) if !sources.is_empty() => targets.push(MergeTarget { sources, output }),
            _ => warn!(
                "[Config] Dropping merge target without output or sources: {}",
                entry
            ),
        }
    }

    targets
}

fn validate_source(value: &JsonValue, root: &WorkspaceRoot) -> Option<MergeSource> {
    match value {
        JsonValue::String(path) if !path.is_empty() => Some(MergeSource {
            path: expand(path, root),
            doc_type: DEFAULT_SOURCE_TYPE,
        }),
        JsonValue::Object(obj) => {
            let path = obj.get("path").and_then(JsonValue::as_str).filter(|p| !p.is_empty())?;
            let doc_type = match obj.get("type").and_then(JsonValue::as_str) {
                Some(t) => match t.parse() {
                    Ok(t) => t,
                    Err(e) => {
                        warn!("[Config] Dropping source {}: {}", path, e);
                        return None;
                    }
                },
                None => infer_source_type(path),
            };
            Some(MergeSource {
                path: expand(path, root),
                doc_type,
            })
        }
        _ => None,
    }
}

fn validate_output(value: &JsonValue, root: &WorkspaceRoot) -> Option<MergeOutput> {
    let (path, explicit) = match value {
        JsonValue::String(path) => (path.as_str(), None),
        JsonValue::Object(obj) => (
            obj.get("path").and_then(JsonValue::as_str)?,
            obj.get("type").and_then(JsonValue::as_str),
        ),
        _ => return None,
    };
    if path.is_empty() {
        return None;
    }

    let output_type = match explicit {
        Some(t) => match t.parse() {
            Ok(t) => t,
            Err(e) => {
                warn!("[Config] Dropping output {}: {}", path, e);
                return None;
            }
        },
        None => infer_output_type(path),
    };

    Some(MergeOutput {
        path: expand(path, root),
        output_type,
    })
}

fn expand(path: &str, root: &WorkspaceRoot) -> String {
    format_input_path(&expand_with_env(path, root))
}

fn extension(path: &str) -> &str {
    path.rsplit('.').next().unwrap_or(path)
}

/// Source type from the file extension, `jsonc` when unknown.
pub fn infer_source_type(path: &str) -> DocumentType {
    match extension(path) {
        "yml" => DocumentType::Yaml,
        "txt" => DocumentType::Text,
        ext => ext.parse().unwrap_or(DEFAULT_SOURCE_TYPE),
    }
}

/// Output type from the file extension, `json` when unknown.
pub fn infer_output_type(path: &str) -> OutputType {
    match extension(path) {
        "yml" => OutputType::Yaml,
        "txt" => OutputType::Text,
        ext => ext.parse().unwrap_or(DEFAULT_OUTPUT_TYPE),
    }
}
