//! Run configuration.
//!
//! Settings are resolved once, from lowest to highest precedence:
//!
//! 1. built-in defaults
//! 2. `.covgap.toml` (explicit `--config`, or discovered walking up from the
//!    working directory)
//! 3. CLI flags and `INPUT_*` environment variables set by the Actions runner
//!
//! The result is an immutable [`RunConfig`] passed to whatever needs it.

pub mod core;
pub mod loader;
pub mod retry;
pub mod validation;

pub use self::core::{
    ConfigOverrides, CoverageMode, FileConfig, RawConfig, RunConfig, TestConventions,
    TestFileName, TestFramework, TestStructure, TestSuffix,
};
pub use loader::{discover_config, load_config, CONFIG_FILE_NAME};
pub use retry::{RetryConfig, RetryStrategy};
pub use validation::validate_run_config;

use crate::errors::Result;
use std::path::{Path, PathBuf};

/// Resolve and validate the configuration for a full run.
pub fn resolve_run_config(
    explicit_file: Option<&Path>,
    overrides: ConfigOverrides,
    working_dir: PathBuf,
) -> Result<RunConfig> {
    let file = load_config(explicit_file, working_dir.clone())?;
    let raw = RawConfig::merge(file, overrides, working_dir);
    validation::into_result(validate_run_config(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_uses_discovered_file() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(CONFIG_FILE_NAME),
            "concurrency = 12\nauto_commit = true\n",
        )
        .unwrap();

        let overrides = ConfigOverrides {
            github_token: Some("token".to_string()),
            ..Default::default()
        };
        let config = resolve_run_config(None, overrides, temp.path().to_path_buf()).unwrap();

        assert_eq!(config.concurrency, 12);
        assert!(config.auto_commit);
        assert_eq!(config.root_path, temp.path());
    }

    #[test]
    fn test_resolve_reports_validation_errors() {
        let temp = TempDir::new().unwrap();
        let err = resolve_run_config(None, ConfigOverrides::default(), temp.path().to_path_buf())
            .unwrap_err();
        assert!(err.to_string().contains("token is required"));
    }
}
