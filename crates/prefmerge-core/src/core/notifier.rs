//! Console notifier used by the daemon.

use crate::core::traits::Notifier;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{error, info, warn};

/// Writes notifications to the log and the terminal.
///
/// The console is not interactive, so actions are answered from
/// configuration: `error_action` is returned for every error prompt that
/// offers it, and `accept_reload` answers "Reload" prompts.
#[derive(Debug, Clone, Default)]
pub struct ConsoleNotifier {
    error_action: Option<String>,
    accept_reload: bool,
}

impl ConsoleNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_error_action(mut self, action: impl Into<String>) -> Self {
        self.error_action = Some(action.into());
        self
    }

    #[must_use]
    pub fn with_accept_reload(mut self, accept: bool) -> Self {
        self.accept_reload = accept;
        self
    }
}

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn info(&self, message: &str, actions: &[&str]) -> Option<String> {
        info!("{}", message);
        println!("[prefmerge] {}", message);
        if self.accept_reload && actions.contains(&"Reload") {
            return Some("Reload".to_string());
        }
        None
    }

    fn warn(&self, message: &str) {
        warn!("{}", message);
        eprintln!("[prefmerge] warning: {}", message);
    }

    async fn error(&self, message: &str, actions: &[&str]) -> Option<String> {
        error!("{}", message);
        eprintln!("[prefmerge] error: {}", message);
        self.error_action
            .as_deref()
            .filter(|a| actions.contains(a))
            .map(str::to_string)
    }

    fn status(&self, message: &str, duration: Duration) {
        info!("{} ({:?})", message, duration);
        println!("[prefmerge] {}", message);
    }

    fn reload(&self) {
        info!("Reload requested: restart the consuming application to pick up merged settings");
    }
}
