pub mod lcov;
pub mod types;

pub use types::{CoverageReport, FileCoverageEntry, TestableCoverage, ROOT_KEY};
