//! GitHub integration: workflow context, REST client, changed files.

pub mod changed_files;
pub mod client;
pub mod context;
pub mod filter;

pub use changed_files::{ChangedFileSource, ChangedFiles, PullRequestChangedFiles};
pub use client::{FileStatus, GitHubClient, PullRequestFile};
pub use context::{GitHubContext, RepoSlug};
pub use filter::FileFilter;
