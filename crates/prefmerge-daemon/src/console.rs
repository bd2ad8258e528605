use prefmerge_core::ReactorHandle;
use std::path::PathBuf;
use tokio::io::{self, AsyncBufReadExt, BufReader};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Merge,
    Reload,
    /// `None` closes the workspace.
    Workspace(Option<PathBuf>),
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let Some(first) = parts.first() else {
        return Ok(None);
    };

    let command = match *first {
        "merge" => Command::Merge,
        "reload" => Command::Reload,
        "workspace" => match parts.get(1) {
            Some(&"none") | None => Command::Workspace(None),
            Some(_) => Command::Workspace(Some(PathBuf::from(parts[1..].join(" ")))),
        },
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(format!("Unknown command: {}", other)),
    };
    Ok(Some(command))
}

fn print_help() {
    println!("Available: merge               (merge every target now)");
    println!("           reload              (re-read the settings file)");
    println!("           workspace <path>    (switch workspace, 'none' to close)");
    println!("           quit");
}

pub async fn run_console(handle: ReactorHandle) {
    let mut reader = BufReader::new(io::stdin()).lines();

    println!("\n[prefmerge CONSOLE] Ready for commands.");
    print_help();

    while let Ok(Some(line)) = reader.next_line().await {
        match parse_command(&line) {
            Ok(None) => continue,
            Ok(Some(Command::Merge)) => handle.merge_all(),
            Ok(Some(Command::Reload)) => handle.config_changed(),
            Ok(Some(Command::Workspace(root))) => {
                println!("[prefmerge] Switching workspace to {:?}", root);
                handle.workspace_changed(root);
            }
            Ok(Some(Command::Help)) => print_help(),
            Ok(Some(Command::Quit)) => {
                handle.shutdown();
                break;
            }
            Err(e) => println!("[prefmerge] {}", e),
        }
    }
}
