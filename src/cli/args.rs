use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::{ConfigOverrides, CoverageMode, TestFileName, TestFramework, TestStructure, TestSuffix};

#[derive(Parser, Debug)]
#[command(name = "covgap")]
#[command(
    about = "Find under-covered functions changed by a pull request and generate tests for them",
    long_about = None
)]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Increase verbosity level (can be repeated: -v, -vv)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbosity: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Options for the default `run` command
    #[command(flatten)]
    pub run: RunArgs,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the pull request flow (default)
    Run(RunArgs),

    /// Reconcile an LCOV tracefile with a list of changed files, offline
    Analyze(AnalyzeArgs),

    /// Write a default .covgap.toml
    Init {
        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },
}

/// Settings for a run. Every option doubles as a GitHub Action input
/// through its `INPUT_*` variable.
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Configuration file (defaults to discovering .covgap.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Repository root the commands run in
    #[arg(long, env = "INPUT_ROOT-PATH")]
    pub root_path: Option<PathBuf>,

    #[arg(long, value_enum, env = "INPUT_TEST-STRUCTURE")]
    pub test_structure: Option<TestStructure>,

    #[arg(long, value_enum, env = "INPUT_TEST-FRAMEWORK")]
    pub test_framework: Option<TestFramework>,

    #[arg(long, value_enum, env = "INPUT_TEST-SUFFIX")]
    pub test_suffix: Option<TestSuffix>,

    #[arg(long, value_enum, env = "INPUT_TEST-FILE-NAME")]
    pub test_file_name: Option<TestFileName>,

    /// Run the coverage command, or read an existing tracefile
    #[arg(long, value_enum, env = "INPUT_CALCULATE-COVERAGE")]
    pub calculate_coverage: Option<CoverageMode>,

    /// Functions under this line coverage percentage get tests (0-100)
    #[arg(long, env = "INPUT_COVERAGE-THRESHOLD")]
    pub coverage_threshold: Option<f64>,

    /// Maximum generator processes at once (1-50)
    #[arg(long, env = "INPUT_CONCURRENCY")]
    pub concurrency: Option<i64>,

    /// Cap on testables handed to the generator, -1 for no cap
    #[arg(long, env = "INPUT_MAX-TESTABLES", allow_negative_numbers = true)]
    pub max_testables: Option<i64>,

    /// Commit generated tests to the branch ("true" to enable)
    #[arg(long, env = "INPUT_AUTO-COMMIT")]
    pub auto_commit: Option<String>,

    /// GitHub token (falls back to GITHUB_TOKEN)
    #[arg(long, env = "INPUT_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Backend API key
    #[arg(long, env = "INPUT_API-KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long, env = "INPUT_BACKEND-URL")]
    pub backend_url: Option<String>,

    /// Shell command that writes an LCOV tracefile
    #[arg(long, env = "INPUT_COVERAGE-COMMAND")]
    pub coverage_command: Option<String>,

    /// Tracefile location, relative to the root
    #[arg(long, env = "INPUT_LCOV-PATH")]
    pub lcov_path: Option<PathBuf>,

    /// Shell command that generates tests from a JSON worklist on stdin
    #[arg(long, env = "INPUT_GENERATOR-COMMAND")]
    pub generator_command: Option<String>,

    /// Substring identifying generated test files
    #[arg(long, env = "INPUT_GENERATED-MARKER")]
    pub generated_marker: Option<String>,
}

impl RunArgs {
    pub fn to_overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            root_path: self.root_path.clone(),
            test_structure: self.test_structure,
            test_framework: self.test_framework,
            test_suffix: self.test_suffix,
            test_file_name: self.test_file_name,
            calculate_coverage: self.calculate_coverage,
            coverage_threshold: self.coverage_threshold,
            concurrency: self.concurrency,
            max_testables: self.max_testables,
            auto_commit: self.auto_commit.clone(),
            github_token: self.token.clone(),
            secret_token: self.api_key.clone(),
            backend_url: self.backend_url.clone(),
            coverage_command: self.coverage_command.clone(),
            lcov_path: self.lcov_path.clone(),
            generator_command: self.generator_command.clone(),
            generated_marker: self.generated_marker.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Markdown,
}

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    /// LCOV tracefile
    #[arg(long = "lcov", visible_alias = "coverage-file")]
    pub lcov: PathBuf,

    /// Changed file paths, relative to the root
    #[arg(long = "changed", num_args = 1.., required = true)]
    pub changed: Vec<String>,

    /// Coverage threshold percentage
    #[arg(long, default_value = "0")]
    pub threshold: f64,

    /// Cap on worklist entries, -1 for no cap
    #[arg(long, default_value = "30", allow_negative_numbers = true)]
    pub max_testables: i64,

    #[arg(short, long, value_enum, default_value = "json")]
    pub format: OutputFormat,

    /// Root that tracefile paths are made relative to (defaults to cwd)
    #[arg(long)]
    pub root: Option<PathBuf>,
}

pub fn parse_args() -> Cli {
    Cli::parse()
}
