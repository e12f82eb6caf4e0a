use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::retry::RetryConfig;
use crate::analysis::TestableLimit;

pub const DEFAULT_BACKEND_URL: &str = "https://api.startearly.ai";
pub const DEFAULT_COVERAGE_COMMAND: &str = "npx jest --coverage --coverageReporters=lcov";
pub const DEFAULT_LCOV_PATH: &str = "coverage/lcov.info";
pub const DEFAULT_GENERATED_MARKER: &str = ".early.";
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Where generated test files are placed relative to the code under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "camelCase")]
pub enum TestStructure {
    #[default]
    #[value(name = "siblingFolder")]
    SiblingFolder,
    #[value(name = "rootFolder")]
    RootFolder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TestFramework {
    #[default]
    Jest,
    Mocha,
    Vitest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TestSuffix {
    #[default]
    Spec,
    Test,
}

/// Naming convention for generated test files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "camelCase")]
pub enum TestFileName {
    #[default]
    #[value(name = "camelCase")]
    CamelCase,
    #[value(name = "kebabCase")]
    KebabCase,
}

/// Whether the coverage command is run, or an existing tracefile is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CoverageMode {
    #[default]
    On,
    Off,
}

macro_rules! impl_as_str {
    ($ty:ty { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $name),+
                }
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

impl_as_str!(TestStructure { SiblingFolder => "siblingFolder", RootFolder => "rootFolder" });
impl_as_str!(TestFramework { Jest => "jest", Mocha => "mocha", Vitest => "vitest" });
impl_as_str!(TestSuffix { Spec => "spec", Test => "test" });
impl_as_str!(TestFileName { CamelCase => "camelCase", KebabCase => "kebabCase" });
impl_as_str!(CoverageMode { On => "on", Off => "off" });

/// Conventions the generator follows when writing test files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TestConventions {
    pub structure: TestStructure,
    pub framework: TestFramework,
    pub suffix: TestSuffix,
    pub file_name: TestFileName,
}

/// Contents of `.covgap.toml`. Every field is optional; unset fields fall
/// back to CLI flags, then to built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_structure: Option<TestStructure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_framework: Option<TestFramework>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_suffix: Option<TestSuffix>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_file_name: Option<TestFileName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calculate_coverage: Option<CoverageMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coverage_threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_testables: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_commit: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coverage_command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lcov_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generator_command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_marker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryConfig>,
}

/// Values supplied on the command line or through `INPUT_*` variables.
///
/// Strings arrive unparsed where the action input is free-form; empty
/// strings count as unset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub root_path: Option<PathBuf>,
    pub test_structure: Option<TestStructure>,
    pub test_framework: Option<TestFramework>,
    pub test_suffix: Option<TestSuffix>,
    pub test_file_name: Option<TestFileName>,
    pub calculate_coverage: Option<CoverageMode>,
    pub coverage_threshold: Option<f64>,
    pub concurrency: Option<i64>,
    pub max_testables: Option<i64>,
    pub auto_commit: Option<String>,
    pub github_token: Option<String>,
    pub secret_token: Option<String>,
    pub backend_url: Option<String>,
    pub coverage_command: Option<String>,
    pub lcov_path: Option<PathBuf>,
    pub generator_command: Option<String>,
    pub generated_marker: Option<String>,
}

/// Merged but unchecked settings. [`super::validation::validate_run_config`]
/// turns this into a [`RunConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct RawConfig {
    pub root_path: PathBuf,
    pub conventions: TestConventions,
    pub calculate_coverage: CoverageMode,
    pub coverage_threshold: f64,
    pub concurrency: i64,
    pub max_testables: i64,
    pub auto_commit: bool,
    pub github_token: Option<String>,
    pub secret_token: Option<String>,
    pub backend_url: String,
    pub coverage_command: String,
    pub lcov_path: PathBuf,
    pub generator_command: Option<String>,
    pub generated_marker: String,
    pub retry: RetryConfig,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

impl RawConfig {
    /// Layer overrides over the file config over defaults.
    pub fn merge(file: FileConfig, overrides: ConfigOverrides, default_root: PathBuf) -> Self {
        Self {
            root_path: overrides.root_path.unwrap_or(default_root),
            conventions: TestConventions {
                structure: overrides
                    .test_structure
                    .or(file.test_structure)
                    .unwrap_or_default(),
                framework: overrides
                    .test_framework
                    .or(file.test_framework)
                    .unwrap_or_default(),
                suffix: overrides.test_suffix.or(file.test_suffix).unwrap_or_default(),
                file_name: overrides
                    .test_file_name
                    .or(file.test_file_name)
                    .unwrap_or_default(),
            },
            calculate_coverage: overrides
                .calculate_coverage
                .or(file.calculate_coverage)
                .unwrap_or_default(),
            coverage_threshold: overrides
                .coverage_threshold
                .or(file.coverage_threshold)
                .unwrap_or(0.0),
            concurrency: overrides
                .concurrency
                .or(file.concurrency)
                .unwrap_or(DEFAULT_CONCURRENCY as i64),
            max_testables: overrides
                .max_testables
                .or(file.max_testables)
                .unwrap_or_else(|| i64::from(TestableLimit::default())),
            // Action inputs are strings: only the literal "true" enables it.
            auto_commit: match non_empty(overrides.auto_commit) {
                Some(value) => value == "true",
                None => file.auto_commit.unwrap_or(false),
            },
            github_token: non_empty(overrides.github_token),
            secret_token: non_empty(overrides.secret_token),
            backend_url: non_empty(overrides.backend_url)
                .or(file.backend_url)
                .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string()),
            coverage_command: non_empty(overrides.coverage_command)
                .or(file.coverage_command)
                .unwrap_or_else(|| DEFAULT_COVERAGE_COMMAND.to_string()),
            lcov_path: overrides
                .lcov_path
                .or(file.lcov_path)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LCOV_PATH)),
            generator_command: non_empty(overrides.generator_command)
                .or_else(|| non_empty(file.generator_command)),
            generated_marker: non_empty(overrides.generated_marker)
                .or(file.generated_marker)
                .unwrap_or_else(|| DEFAULT_GENERATED_MARKER.to_string()),
            retry: file.retry.unwrap_or_default(),
        }
    }
}

/// Validated, immutable settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub root_path: PathBuf,
    pub conventions: TestConventions,
    pub calculate_coverage: CoverageMode,
    pub coverage_threshold: f64,
    pub concurrency: usize,
    pub max_testables: TestableLimit,
    pub auto_commit: bool,
    pub github_token: String,
    pub secret_token: Option<String>,
    pub backend_url: String,
    pub coverage_command: String,
    pub lcov_path: PathBuf,
    pub generator_command: Option<String>,
    pub generated_marker: String,
    pub retry: RetryConfig,
}

impl RunConfig {
    /// Tracefile location, resolved against the root when relative.
    pub fn lcov_file(&self) -> PathBuf {
        if self.lcov_path.is_absolute() {
            self.lcov_path.clone()
        } else {
            self.root_path.join(&self.lcov_path)
        }
    }

    pub fn filter_config(&self) -> crate::analysis::TestableFilterConfig {
        crate::analysis::TestableFilterConfig {
            coverage_threshold: self.coverage_threshold,
        }
    }
}
