//! One merge run for one target.
//!
//! Collect -> fold -> serialize -> write -> notify. Any failure before the
//! write completes aborts the run; the output document is never partially
//! written. Failures are reported here and never propagate to the caller.

use crate::core::{PrefMergeError, Result};
use crate::engine::MergeEngine;
use crate::fetch::Fetched;
use crate::merge::content::MergeContent;
use crate::merge::target::MergeTarget;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub const SHOW_SOURCES_AND_OUTPUT: &str = "Show sources & output";
pub const SHOW_ONLY_OUTPUT: &str = "Show only output";
pub const RELOAD: &str = "Reload";

const ACTIVE_MESSAGE: &str = "Preferences merging is now active for this workspace.";
const MERGED_MESSAGE: &str = "Settings were merged. Please reload to apply changes.";
const STATUS_DURATION: Duration = Duration::from_millis(5000);

/// Outcome of one merge run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStatus {
    /// The output was rewritten.
    Changed,
    /// The output already held the merged content.
    Unchanged,
    /// The run was aborted and reported.
    Failed,
}

pub struct MergePipeline<'a> {
    engine: &'a MergeEngine,
    target: &'a MergeTarget,
    /// Raw text per source index, including error placeholders.
    collected: Vec<(usize, String)>,
    /// Placeholder shown in place of the output after a failure.
    output_error: Option<String>,
}

impl<'a> MergePipeline<'a> {
    pub fn new(engine: &'a MergeEngine, target: &'a MergeTarget) -> Self {
        Self {
            engine,
            target,
            collected: Vec::new(),
            output_error: None,
        }
    }

    pub async fn run(mut self) -> MergeStatus {
        match self.execute().await {
            Ok(changed) => {
                info!(
                    "[Pipeline] Merged {} source(s) into {} ({})",
                    self.target.sources.len(),
                    self.target.output.path,
                    if changed { "changed" } else { "unchanged" }
                );
                self.notify_success(changed).await;
                if changed {
                    MergeStatus::Changed
                } else {
                    MergeStatus::Unchanged
                }
            }
            Err(e) => {
                self.report_failure(&e).await;
                MergeStatus::Failed
            }
        }
    }

    async fn execute(&mut self) -> Result<bool> {
        self.collect().await?;

        let result = match self.fold() {
            Ok(text) => {
                let path = self.engine.resolve(&self.target.output.path);
                self.engine.store().write(&path, &text).await
            }
            Err(e) => Err(e),
        };
        if let Err(e) = &result {
            self.output_error = Some(format!("<{}>", e));
        }
        result
    }

    /// Obtain the text of every source, in declared order.
    async fn collect(&mut self) -> Result<()> {
        let root = self.engine.workspace_root();
        let ttl = self.engine.settings().cache_ttl();

        for (index, source) in self.target.sources.iter().enumerate() {
            match self.engine.fetcher().fetch(source, &root, ttl).await {
                Ok(Fetched::Text(text)) => self.collected.push((index, text)),
                Ok(Fetched::Empty) => {
                    warn!("[Pipeline] Empty content or error from {}", source.path);
                }
                Err(e) => {
                    error!("[Pipeline] Failed to obtain {}: {}", source.path, e);
                    if source.is_remote() {
                        self.collected.push((index, format!("<{}>", e)));
                    }
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    fn fold(&self) -> Result<String> {
        let settings = self.engine.settings();
        let mut content = MergeContent::new(
            self.target.output.output_type,
            settings.merge_depth,
            settings.indent,
        );
        for (index, text) in &self.collected {
            content.push(&self.target.sources[*index], text)?;
        }
        for warning in content.warnings() {
            self.engine.notifier().warn(warning);
        }
        content.finish()
    }

    async fn notify_success(&self, changed: bool) {
        let settings = self.engine.settings();
        let notifier = self.engine.notifier();

        let mut notified = false;
        if settings.notify_on_new_workspace && self.engine.mark_workspace_notified() {
            notifier.info(ACTIVE_MESSAGE, &[]).await;
            notified = true;
        }

        if !notified && changed {
            if settings.notify_on_merge {
                if notifier.info(MERGED_MESSAGE, &[RELOAD]).await.as_deref() == Some(RELOAD) {
                    notifier.reload();
                }
            } else {
                notifier.status(MERGED_MESSAGE, STATUS_DURATION);
            }
        }
    }

    async fn report_failure(&self, e: &PrefMergeError) {
        error!("[Pipeline] Failed to merge {}: {}", self.target.output.path, e);

        let message = format!(
            "Failed to merge settings ({}). See the log for more details.\n{}",
            e.category(),
            e
        );
        let choice = self
            .engine
            .notifier()
            .error(&message, &[SHOW_SOURCES_AND_OUTPUT, SHOW_ONLY_OUTPUT])
            .await;

        match choice.as_deref() {
            Some(SHOW_SOURCES_AND_OUTPUT) => {
                for (index, text) in &self.collected {
                    let source = &self.target.sources[*index];
                    if !text.is_empty() {
                        let path = if source.is_remote() {
                            PathBuf::from(&source.path)
                        } else {
                            self.engine.resolve(&source.path)
                        };
                        self.engine
                            .store()
                            .show(&path, Some(text), source.doc_type)
                            .await;
                    }
                }
                self.show_output().await;
            }
            Some(SHOW_ONLY_OUTPUT) => self.show_output().await,
            _ => debug!("[Pipeline] Failure report dismissed"),
        }
    }

    async fn show_output(&self) {
        let output = &self.target.output;
        let path = self.engine.resolve(&output.path);
        self.engine
            .store()
            .show(
                &path,
                self.output_error.as_deref(),
                output.output_type.as_document_type(),
            )
            .await;
    }
}
