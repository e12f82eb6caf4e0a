//! Types produced by reconciliation and consumed by the worklist builder.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Filtering parameters for reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestableFilterConfig {
    /// Testables strictly below this percentage are selected
    pub coverage_threshold: f64,
}

impl Default for TestableFilterConfig {
    fn default() -> Self {
        Self {
            coverage_threshold: 0.0,
        }
    }
}

/// Why a testable was selected for generation.
///
/// Variants are mutually exclusive; the first matching branch wins in the
/// order they are declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterReason {
    NoCoverage,
    ZeroCoverage,
    BelowThreshold,
}

impl FilterReason {
    pub fn as_str(self) -> &'static str {
        match self {
            FilterReason::NoCoverage => "no-coverage",
            FilterReason::ZeroCoverage => "zero-coverage",
            FilterReason::BelowThreshold => "below-threshold",
        }
    }
}

impl std::fmt::Display for FilterReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A testable selected by reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilteredTestable {
    pub name: String,
    pub percentage: Option<f64>,
    /// The changed-file path exactly as the caller supplied it
    pub file_path: String,
    pub reason: FilterReason,
}

/// Outcome of one reconciliation call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilteredTestablesResult {
    pub testables: Vec<FilteredTestable>,
    pub total_analyzed: usize,
    pub filtered_count: usize,
    pub files_with_coverage: usize,
    pub files_without_coverage: usize,
}

/// Full descriptor of a testable as returned by a [`TestableSource`].
///
/// Only `name` is interpreted; everything else (source location, signature
/// and whatever the provider adds) is carried through to the generator
/// untouched.
///
/// [`TestableSource`]: crate::agent::TestableSource
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestableDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TestableDescriptor {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            extra: Map::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// One unit of work for the test generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorklistEntry {
    pub file_path: String,
    pub testable: TestableDescriptor,
}

/// One group of descriptors as returned by a provider: the path the
/// provider keys the group by, and its descriptors in provider order.
pub type DescriptorGroup = (String, Vec<TestableDescriptor>);
