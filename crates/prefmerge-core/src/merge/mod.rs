//! Merge targets, the depth-limited object merger, and the merge pipeline.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`MergeTarget`] | Ordered sources plus one output document |
//! | [`merge_mapping`] | Depth-limited merge of two mappings |
//! | [`MergeContent`] | Folds parsed sources into one accumulator |
//! | [`MergePipeline`] | Collect, fold, serialize, write, notify |

pub mod content;
pub mod object;
pub mod pipeline;
pub mod target;

pub use content::{Accumulator, MergeContent};
pub use object::{merge_mapping, merge_objects, DEFAULT_MERGE_DEPTH};
pub use pipeline::{MergePipeline, MergeStatus, SHOW_ONLY_OUTPUT, SHOW_SOURCES_AND_OUTPUT};
pub use target::{MergeOutput, MergeSource, MergeTarget};
