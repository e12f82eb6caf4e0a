//! Process-level setup shared by the commands.

use std::path::PathBuf;

use crate::actions;
use crate::observability;

/// Directory commands resolve relative paths against: the Actions workspace
/// when set, else the current directory.
pub fn working_directory() -> std::io::Result<PathBuf> {
    match std::env::var_os("GITHUB_WORKSPACE").filter(|v| !v.is_empty()) {
        Some(workspace) => Ok(PathBuf::from(workspace)),
        None => std::env::current_dir(),
    }
}

/// `GITHUB_TOKEN` as the fallback for the `token` input.
pub fn github_token_from_env() -> Option<String> {
    std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty())
}

/// Install logging; workflow-command annotations only under the runner.
pub fn init_logging(verbosity: u8) {
    observability::init_logging(verbosity, actions::is_github_actions());
}
