//! Workflow context provided by the Actions runner environment.

use serde::Deserialize;
use std::path::Path;
use tracing::warn;

pub const DEFAULT_SERVER_URL: &str = "https://github.com";
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// `owner/repo` split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSlug {
    pub owner: String,
    pub repo: String,
}

impl RepoSlug {
    pub fn parse(slug: &str) -> Option<Self> {
        let (owner, repo) = slug.split_once('/')?;
        if owner.is_empty() || repo.is_empty() || repo.contains('/') {
            return None;
        }
        Some(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }
}

impl std::fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

#[derive(Debug, Deserialize)]
struct EventPayload {
    #[serde(default)]
    pull_request: Option<PullRequestPayload>,
    #[serde(default)]
    number: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct PullRequestPayload {
    number: u64,
}

/// The pieces of `GITHUB_*` context the run depends on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitHubContext {
    pub event_name: String,
    pub repository: Option<RepoSlug>,
    pub pull_number: Option<u64>,
    pub ref_name: Option<String>,
    pub head_ref: Option<String>,
    pub sha: Option<String>,
    pub server_url: String,
    pub api_url: String,
}

impl GitHubContext {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.is_empty());

        let pull_number = var("GITHUB_EVENT_PATH").and_then(|path| read_pull_number(Path::new(&path)));

        Self {
            event_name: var("GITHUB_EVENT_NAME").unwrap_or_default(),
            repository: var("GITHUB_REPOSITORY").and_then(|s| RepoSlug::parse(&s)),
            pull_number,
            ref_name: var("GITHUB_REF_NAME"),
            head_ref: var("GITHUB_HEAD_REF"),
            sha: var("GITHUB_SHA"),
            server_url: var("GITHUB_SERVER_URL")
                .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string()),
            api_url: var("GITHUB_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        }
    }

    pub fn is_pull_request(&self) -> bool {
        matches!(
            self.event_name.as_str(),
            "pull_request" | "pull_request_target"
        )
    }

    /// The pull request number, only when triggered by a pull request event.
    pub fn pull_request_number(&self) -> Option<u64> {
        if self.is_pull_request() {
            self.pull_number
        } else {
            None
        }
    }

    pub fn pull_request_url(&self) -> Option<String> {
        let number = self.pull_request_number()?;
        let repo = self.repository.as_ref()?;
        Some(format!(
            "{}/{}/pull/{}",
            self.server_url.trim_end_matches('/'),
            repo,
            number
        ))
    }

    /// Branch to commit generated files to: the PR head branch, or the ref
    /// that triggered the workflow.
    pub fn branch(&self) -> Option<&str> {
        self.head_ref.as_deref().or(self.ref_name.as_deref())
    }
}

fn read_pull_number(path: &Path) -> Option<u64> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            warn!("Failed to read event payload {}: {}", path.display(), e);
            return None;
        }
    };

    match serde_json::from_str::<EventPayload>(&contents) {
        Ok(payload) => payload.pull_request.map(|pr| pr.number).or(payload.number),
        Err(e) => {
            warn!("Failed to parse event payload {}: {}", path.display(), e);
            None
        }
    }
}
