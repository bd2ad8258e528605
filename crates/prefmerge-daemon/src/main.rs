mod console;

use clap::{Parser, ValueEnum};
use prefmerge_core::core::{ConsoleNotifier, WatchProvider};
use prefmerge_core::fs::{FileSettingsLoader, FsDocumentStore, SettingsLoader, WorkspaceRoot};
use prefmerge_core::merge::{SHOW_ONLY_OUTPUT, SHOW_SOURCES_AND_OUTPUT};
use prefmerge_core::{
    ChangeReactor, FetchConfig, MergeEngine, MergeStatus, NotifyWatchProvider, ReqwestFetch,
    Settings, SystemClock,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OnError {
    /// Only report the failure.
    Report,
    /// Print source texts and the output.
    ShowSources,
    /// Print the output only.
    ShowOutput,
}

impl OnError {
    fn action(self) -> Option<&'static str> {
        match self {
            OnError::Report => None,
            OnError::ShowSources => Some(SHOW_SOURCES_AND_OUTPUT),
            OnError::ShowOutput => Some(SHOW_ONLY_OUTPUT),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "prefmerge-daemon")]
#[command(about = "Merge layered preference documents and keep the output up to date")]
struct Cli {
    /// Workspace folder; relative paths and ${workspaceFolder} resolve against it.
    /// Defaults to the current directory.
    #[arg(short, long, env = "PREFMERGE_ROOT")]
    workspace: Option<PathBuf>,

    /// Settings file, relative to the workspace.
    #[arg(short, long, default_value = ".prefmerge.json")]
    config: PathBuf,

    /// Merge every target once and exit.
    #[arg(long)]
    once: bool,

    /// Do not read commands from stdin.
    #[arg(long)]
    no_console: bool,

    /// What to display when a merge fails.
    #[arg(long, value_enum, default_value_t = OnError::Report)]
    on_error: OnError,

    /// Answer "Reload" to merge notifications.
    #[arg(long)]
    accept_reload: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let cli = Cli::parse();

    info!("=== prefmerge daemon ===");

    let root = WorkspaceRoot::from_option(
        cli.workspace
            .clone()
            .or_else(|| std::env::current_dir().ok()),
    );
    let config_path = match root.path() {
        Some(dir) if cli.config.is_relative() => dir.join(&cli.config),
        _ => cli.config.clone(),
    };
    info!("Workspace: {:?}, settings: {:?}", root.path(), config_path);

    let loader = Arc::new(FileSettingsLoader::new(config_path.clone()));
    let settings = match loader.load(&root).await {
        Ok(settings) => settings,
        Err(e) => {
            warn!("Failed to load settings, using defaults: {}", e);
            Settings::default()
        }
    };
    info!("{} merge target(s) configured", settings.targets.len());

    let mut notifier = ConsoleNotifier::new().with_accept_reload(cli.accept_reload);
    if let Some(action) = cli.on_error.action() {
        notifier = notifier.with_error_action(action);
    }

    let engine = Arc::new(MergeEngine::new(
        settings,
        root,
        Arc::new(FsDocumentStore::new()),
        Arc::new(notifier),
        Arc::new(ReqwestFetch::new(FetchConfig::default())?),
        Arc::new(SystemClock),
    ));

    if cli.once {
        let statuses = engine.merge_all().await;
        let failed = statuses.iter().filter(|s| **s == MergeStatus::Failed).count();
        if failed > 0 {
            anyhow::bail!("{} of {} target(s) failed to merge", failed, statuses.len());
        }
        return Ok(());
    }

    let watcher = Arc::new(NotifyWatchProvider::new());
    let reactor = ChangeReactor::new(engine, loader, watcher.clone());
    let handle = reactor.handle();

    let config_handle = handle.clone();
    let _config_watch = match watcher.watch(
        &config_path,
        Arc::new(move || config_handle.config_changed()),
    ) {
        Ok(watch) => Some(watch),
        Err(e) => {
            warn!("Settings file will not be watched: {}", e);
            None
        }
    };

    if !cli.no_console {
        tokio::spawn(console::run_console(handle.clone()));
    }

    let ctrl_c_handle = handle.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutting down");
            ctrl_c_handle.shutdown();
        }
    });

    reactor.run().await;
    Ok(())
}
