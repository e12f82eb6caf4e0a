//! CLI command implementations.
//!
//! - **run**: the pull request flow (default when no subcommand is given)
//! - **analyze**: offline reconciliation of a tracefile against changed files
//! - **init**: write a default `.covgap.toml`

pub mod analyze;
pub mod init;
pub mod run;

pub use analyze::{analyze, analyze_tracefile};
pub use init::init_config;
pub use run::run;
