//! Path helpers: variable expansion, web URL detection, resolution.

use crate::fs::state::WorkspaceRoot;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::path::PathBuf;
use url::Url;

// ${variable} or ${variable.subvariable}
static VARIABLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{(\w+(?:\.\w+)?)\}").expect("variable pattern is valid"));

/// Substitute `${workspaceFolder}` and `${env.NAME}`. Unknown variables
/// expand to the empty string.
pub fn expand_path<F>(p: &str, workspace_folder: &str, env: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    VARIABLE_RE
        .replace_all(p, |caps: &Captures| {
            let name = &caps[1];
            let is_env = name.get(..4).is_some_and(|p| p.eq_ignore_ascii_case("env."));
            if is_env {
                env(&name[4..]).unwrap_or_default()
            } else if name == "workspaceFolder" {
                workspace_folder.to_string()
            } else {
                String::new()
            }
        })
        .into_owned()
}

/// Expand variables using the process environment.
pub fn expand_with_env(p: &str, root: &WorkspaceRoot) -> String {
    expand_path(p, &root.folder_string(), |name| std::env::var(name).ok())
}

/// True for `http:` and `https:` URLs only.
pub fn is_web_url(s: &str) -> bool {
    match Url::parse(s) {
        Ok(u) => u.scheme() == "http" || u.scheme() == "https",
        Err(_) => false,
    }
}

/// `/unix`, `\\share` and `C:\windows` style paths.
pub fn is_absolute_path(p: &str) -> bool {
    let bytes = p.as_bytes();
    if p.starts_with('/') || p.starts_with('\\') {
        return true;
    }
    bytes.len() >= 3 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' && bytes[2] == b'\\'
}

/// Normalize separators of relative paths. URLs and absolute paths are
/// returned unchanged.
pub fn format_input_path(p: &str) -> String {
    if is_web_url(p) || is_absolute_path(p) {
        return p.to_string();
    }
    p.replace('\\', "/")
}

/// Resolve a local path against the workspace root, or the current
/// directory when there is no workspace.
pub fn resolve_path(p: &str, root: &WorkspaceRoot) -> PathBuf {
    if is_absolute_path(p) {
        return PathBuf::from(p);
    }
    match root.path() {
        Some(dir) => dir.join(p),
        None => std::env::current_dir()
            .map(|cwd| cwd.join(p))
            .unwrap_or_else(|_| PathBuf::from(p)),
    }
}
