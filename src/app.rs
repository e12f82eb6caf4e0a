//! Wiring of the services a run needs, built from a [`RunConfig`].

use std::sync::Arc;

use crate::actions::{self, ActionsIo};
use crate::agent::{ExternalAgent, TestAgent};
use crate::api::{ApiClient, WorkflowLogger};
use crate::config::RunConfig;
use crate::errors::Result;
use crate::git::{Committer, GitCommitter, GitInfo};
use crate::github::{ChangedFileSource, GitHubClient, GitHubContext, PullRequestChangedFiles};

/// Everything the orchestrator talks to. Fields are public so tests can
/// swap any service for a fake.
pub struct App {
    pub config: RunConfig,
    pub context: GitHubContext,
    pub git_info: GitInfo,
    pub agent: Arc<dyn TestAgent>,
    pub changed_files: Arc<dyn ChangedFileSource>,
    pub backend: Arc<dyn WorkflowLogger>,
    pub committer: Arc<dyn Committer>,
    pub actions: ActionsIo,
}

impl App {
    /// Build the production services from the config and the runner
    /// environment.
    pub fn build(config: RunConfig) -> Result<Self> {
        let context = GitHubContext::from_env();
        let git_info = GitInfo::resolve(&config.root_path);

        let github = GitHubClient::new(&context.api_url, &config.github_token)?;
        let changed_files =
            PullRequestChangedFiles::new(github, context.clone()).with_mock(actions::is_debug());

        let backend = ApiClient::new(
            &config.backend_url,
            config.secret_token.clone(),
            config.retry.clone(),
        )?;
        let committer = GitCommitter::new(&config.root_path, &config.generated_marker);
        let agent = ExternalAgent::from_config(&config);

        Ok(Self {
            config,
            context,
            git_info,
            agent: Arc::new(agent),
            changed_files: Arc::new(changed_files),
            backend: Arc::new(backend),
            committer: Arc::new(committer),
            actions: ActionsIo::from_env(),
        })
    }
}
