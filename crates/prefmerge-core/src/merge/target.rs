use crate::codec::{DocumentType, OutputType};
use crate::fs::paths::is_web_url;
use serde::{Deserialize, Serialize};

/// One input document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeSource {
    pub path: String,
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
}

/// The merged document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeOutput {
    pub path: String,
    #[serde(rename = "type")]
    pub output_type: OutputType,
}

/// Sources merged in order into one output. Later sources win.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeTarget {
    pub sources: Vec<MergeSource>,
    pub output: MergeOutput,
}

impl MergeSource {
    pub fn new(path: impl Into<String>, doc_type: DocumentType) -> Self {
        Self {
            path: path.into(),
            doc_type,
        }
    }

    pub fn is_remote(&self) -> bool {
        is_web_url(&self.path)
    }
}

impl MergeOutput {
    pub fn new(path: impl Into<String>, output_type: OutputType) -> Self {
        Self {
            path: path.into(),
            output_type,
        }
    }
}

impl MergeTarget {
    pub fn new(sources: Vec<MergeSource>, output: MergeOutput) -> Self {
        Self { sources, output }
    }

    pub fn has_remote_source(&self) -> bool {
        self.sources.iter().any(MergeSource::is_remote)
    }

    pub fn local_sources(&self) -> impl Iterator<Item = &MergeSource> {
        self.sources.iter().filter(|s| !s.is_remote())
    }
}
