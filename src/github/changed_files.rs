use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::client::GitHubClient;
use super::context::GitHubContext;
use super::filter::FileFilter;
use crate::errors::{Error, Result};

/// Files served instead of the real diff when step debugging is on.
pub const MOCK_CHANGED_FILES: &[&str] = &["src/main.ts", "src/services/config/config.service.ts"];
const MOCK_PR_NUMBER: u64 = 123;

/// Changed files of the current pull request, already filtered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangedFiles {
    pub files: Vec<String>,
    /// Files reported by the API before filtering
    pub total_processed: usize,
    pub filtered_count: usize,
    pub pr_number: u64,
    pub is_mock: bool,
}

impl ChangedFiles {
    pub fn mock() -> Self {
        let files: Vec<String> = MOCK_CHANGED_FILES.iter().map(|s| s.to_string()).collect();
        Self {
            total_processed: files.len(),
            filtered_count: files.len(),
            files,
            pr_number: MOCK_PR_NUMBER,
            is_mock: true,
        }
    }
}

#[async_trait]
pub trait ChangedFileSource: Send + Sync {
    /// # Errors
    ///
    /// [`Error::NotPullRequest`] outside a pull request, or the API failure.
    async fn changed_files(&self) -> Result<ChangedFiles>;
}

/// Reads the pull request diff through the GitHub REST API.
pub struct PullRequestChangedFiles {
    client: GitHubClient,
    context: GitHubContext,
    filter: FileFilter,
    use_mock: bool,
}

impl PullRequestChangedFiles {
    pub fn new(client: GitHubClient, context: GitHubContext) -> Self {
        Self {
            client,
            context,
            filter: FileFilter::default(),
            use_mock: false,
        }
    }

    /// Serve [`MOCK_CHANGED_FILES`] instead of calling the API.
    pub fn with_mock(mut self, use_mock: bool) -> Self {
        self.use_mock = use_mock;
        self
    }
}

#[async_trait]
impl ChangedFileSource for PullRequestChangedFiles {
    async fn changed_files(&self) -> Result<ChangedFiles> {
        if self.use_mock {
            info!("Using mock data for changed files (ACTIONS_STEP_DEBUG=true)");
            let mock = ChangedFiles::mock();
            debug!(files = ?mock.files, "Mock changed files");
            return Ok(mock);
        }

        if !self.context.is_pull_request() {
            return Err(Error::NotPullRequest(format!(
                "workflow event is '{}'",
                self.context.event_name
            )));
        }

        let pr_number = self.context.pull_request_number().ok_or_else(|| {
            Error::NotPullRequest("unable to determine pull request number".to_string())
        })?;
        let repo = self
            .context
            .repository
            .as_ref()
            .ok_or_else(|| Error::github("GITHUB_REPOSITORY is not set"))?;

        info!("Running in pull request context: #{}", pr_number);

        let all = self
            .client
            .list_pull_request_files(&repo.owner, &repo.repo, pr_number)
            .await?;
        let files = self.filter.apply(&all);

        info!(
            "Found {} changed files, {} relevant files",
            all.len(),
            files.len()
        );

        Ok(ChangedFiles {
            total_processed: all.len(),
            filtered_count: files.len(),
            files,
            pr_number,
            is_mock: false,
        })
    }
}
