//! LCOV tracefile support.
//!
//! - [`parser`]: reads records from disk (I/O)
//! - [`handlers`]: pure per-record state transitions
//! - [`report`]: turns [`LcovData`] into a [`CoverageReport`](crate::coverage::CoverageReport)

pub mod handlers;
pub mod parser;
pub mod report;
pub mod types;

pub use parser::{parse_lcov_file, parse_lcov_reader};
pub use report::{build_report, files_by_key, functions_by_key, report_key};
pub use types::{FunctionCoverage, LcovData, LcovFile};
