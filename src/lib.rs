// Export modules for library usage
pub mod actions;
pub mod agent;
pub mod analysis;
pub mod api;
pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod coverage;
pub mod errors;
pub mod git;
pub mod github;
pub mod observability;
pub mod orchestrator;
pub mod summary;

// Re-export commonly used types
pub use crate::analysis::{
    analyze_changed_files, build_worklist, FilterReason, FilteredTestable,
    FilteredTestablesResult, TestableDescriptor, TestableFilterConfig, TestableLimit,
    WorklistEntry,
};
pub use crate::app::App;
pub use crate::config::{resolve_run_config, RunConfig};
pub use crate::coverage::lcov::parse_lcov_file;
pub use crate::coverage::CoverageReport;
pub use crate::errors::{Error, Result};
pub use crate::orchestrator::{run_pr_context_flow, RunReport};
