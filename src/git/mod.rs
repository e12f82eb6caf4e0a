//! Repository identity (ref, owner, name, sha) and committing generated tests.
//!
//! Reads go through libgit2 so they work without a `git` binary; writes
//! (`commit`, `push`) shell out to the CLI because they need the runner's
//! credential helpers.

pub mod commit;
pub mod remote;

pub use commit::{CommitResult, Committer, GitCommitter};
pub use remote::{parse_remote_url, RemoteRepo};

use git2::Repository;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

use crate::errors::Result;

/// Identity of the checked-out commit. Fields are empty when unknown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitInfo {
    pub ref_name: String,
    pub repository: String,
    pub owner: String,
    pub sha: String,
}

impl GitInfo {
    /// Resolve from the local repository, falling back to the Actions
    /// environment. Never fails.
    pub fn resolve(root: &Path) -> Self {
        Self::resolve_with(root, |name| std::env::var(name).ok())
    }

    pub fn resolve_with<F>(root: &Path, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        match local_git_info(root) {
            Ok(info) if info.is_complete() => info,
            Ok(partial) => {
                debug!(?partial, "Local git info incomplete, using environment");
                partial.or_else(from_environment(&lookup))
            }
            Err(e) => {
                warn!("Failed to get git info: {}", e);
                from_environment(&lookup)
            }
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.ref_name.is_empty()
            && !self.repository.is_empty()
            && !self.owner.is_empty()
            && !self.sha.is_empty()
    }

    /// Fill empty fields from `other`.
    fn or_else(self, other: GitInfo) -> GitInfo {
        let pick = |mine: String, theirs: String| if mine.is_empty() { theirs } else { mine };
        GitInfo {
            ref_name: pick(self.ref_name, other.ref_name),
            repository: pick(self.repository, other.repository),
            owner: pick(self.owner, other.owner),
            sha: pick(self.sha, other.sha),
        }
    }
}

fn local_git_info(root: &Path) -> Result<GitInfo> {
    let repo = Repository::discover(root)?;
    let head = repo.head()?;

    // A detached HEAD has no useful shorthand.
    let ref_name = if head.is_branch() {
        head.shorthand().unwrap_or_default().to_string()
    } else {
        String::new()
    };
    let sha = head.peel_to_commit()?.id().to_string();

    let remote = repo
        .find_remote("origin")
        .ok()
        .and_then(|r| r.url().and_then(parse_remote_url));
    let (owner, repository) = remote.map(|r| (r.owner, r.repo)).unwrap_or_default();

    Ok(GitInfo {
        ref_name,
        repository,
        owner,
        sha,
    })
}

fn from_environment<F>(lookup: &F) -> GitInfo
where
    F: Fn(&str) -> Option<String>,
{
    let var = |name: &str| lookup(name).unwrap_or_default();
    let slug = var("GITHUB_REPOSITORY");
    let (owner, repository) = slug
        .split_once('/')
        .map(|(o, r)| (o.to_string(), r.to_string()))
        .unwrap_or_default();

    GitInfo {
        ref_name: var("GITHUB_REF_NAME"),
        repository,
        owner,
        sha: var("GITHUB_SHA"),
    }
}
