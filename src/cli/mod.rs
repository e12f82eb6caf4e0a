//! Command-line interface.
//!
//! - [`args`]: clap definitions, mapping GitHub Action inputs via `INPUT_*`
//! - [`setup`]: logging and working directory

pub mod args;
pub mod setup;

pub use args::{AnalyzeArgs, Cli, Commands, OutputFormat, RunArgs};

/// Parse CLI arguments using Clap
pub fn parse_args() -> Cli {
    args::parse_args()
}
