//! The test-generation agent seam.
//!
//! The orchestrator only talks to [`TestAgent`]; [`ExternalAgent`] is the
//! shipped implementation, driving a coverage command and an external
//! generator process. Tests substitute in-memory fakes.

pub mod external;
pub mod lcov_source;

pub use external::ExternalAgent;
pub use lcov_source::LcovTestables;

use async_trait::async_trait;
use serde::Serialize;

use crate::analysis::{DescriptorGroup, WorklistEntry};
use crate::coverage::CoverageReport;
use crate::errors::Result;

/// Supplies full testable descriptors for a file.
#[async_trait]
pub trait TestableSource: Send + Sync {
    /// Descriptor groups for `file_path` (leading-slash form). An unknown
    /// file yields no groups rather than an error.
    async fn testables(&self, file_path: &str) -> Result<Vec<DescriptorGroup>>;
}

/// Result of a bulk generation request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOutcome {
    /// Worklist entries the generator was asked to cover
    pub requested: usize,
    /// Test files the generator reported writing
    pub generated_files: Vec<String>,
    pub batches: usize,
}

#[async_trait]
pub trait TestAgent: TestableSource {
    /// Produce fresh coverage data for the repository.
    async fn generate_coverage(&self) -> Result<()>;

    /// The report from the last [`generate_coverage`](Self::generate_coverage),
    /// `None` if coverage was never generated.
    async fn coverage_report(&self) -> Result<Option<CoverageReport>>;

    async fn bulk_generate_tests(&self, entries: &[WorklistEntry]) -> Result<GenerationOutcome>;
}
