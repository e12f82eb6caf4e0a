use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::CONFIG_FILE_NAME;

const DEFAULT_CONFIG: &str = r#"# covgap configuration
#
# Command-line flags and GitHub Action inputs override these values.

# Functions below this line coverage percentage get tests (0-100)
coverage_threshold = 0

# Generator processes run at once (1-50)
concurrency = 5

# Worklist cap, -1 for no cap (at most 30)
max_testables = 30

auto_commit = false

# Test conventions passed to the generator
test_framework = "jest"
test_structure = "siblingFolder"
test_suffix = "spec"
test_file_name = "camelCase"

# "on" runs coverage_command, "off" reads an existing tracefile
calculate_coverage = "on"
coverage_command = "npx jest --coverage --coverageReporters=lcov"
lcov_path = "coverage/lcov.info"

# Receives the worklist as JSON on stdin, prints generated file paths
# generator_command = "npx early-generate"
generated_marker = ".early."

[retry]
enabled = true
max_retries = 3
base_delay_ms = 100
strategy = "exponential"
timeout_seconds = 30
"#;

/// Write a default `.covgap.toml` into `dir`.
pub fn init_config(dir: &Path, force: bool) -> Result<PathBuf> {
    let config_path = dir.join(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        anyhow::bail!("Configuration file already exists. Use --force to overwrite.");
    }

    fs::write(&config_path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    println!("Created {} configuration file", CONFIG_FILE_NAME);

    Ok(config_path)
}
