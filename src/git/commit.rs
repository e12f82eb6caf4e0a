use async_trait::async_trait;
use serde::Serialize;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::errors::{Error, Result};

const BOT_NAME_CONFIG: &str = "user.name=github-actions[bot]";
const BOT_EMAIL_CONFIG: &str = "user.email=github-actions[bot]@users.noreply.github.com";
const COMMIT_MESSAGE: &str = "chore: add early-catch tests [skip ci]";
const EMPTY_COMMIT_MESSAGE: &str = "chore: add early catch tests [skip ci]";

/// Outcome of committing generated tests. Failures are captured, not raised.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitResult {
    pub committed_files: Vec<String>,
    pub error: Option<String>,
}

impl CommitResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Paths that look like generated test files.
pub fn select_generated<'a>(paths: impl IntoIterator<Item = &'a str>, marker: &str) -> Vec<String> {
    paths
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty() && p.contains(marker))
        .map(String::from)
        .collect()
}

/// Persists generated test files to the branch under test.
#[async_trait]
pub trait Committer: Send + Sync {
    /// Check out `branch` (when given), stage every untracked or modified file
    /// containing the generated marker, commit it and push.
    ///
    /// With nothing to commit an empty commit is created and nothing is pushed.
    async fn commit_generated(&self, branch: Option<&str>) -> CommitResult;
}

/// Commits and pushes generated test files with the `git` CLI.
#[derive(Debug, Clone)]
pub struct GitCommitter {
    root: PathBuf,
    marker: String,
}

impl GitCommitter {
    pub fn new(root: impl Into<PathBuf>, marker: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            marker: marker.into(),
        }
    }

    async fn try_commit(&self, branch: Option<&str>) -> Result<Vec<String>> {
        if let Some(branch) = branch.filter(|b| !b.is_empty()) {
            self.git(&["checkout", branch]).await?;
        }

        let listing = self
            .git(&["ls-files", "--others", "--exclude-standard", "--modified"])
            .await?;
        let files = select_generated(listing.lines(), &self.marker);

        if files.is_empty() {
            info!("No generated test files to commit");
            self.git(&identity_args(&[
                "commit",
                "--allow-empty",
                "-m",
                EMPTY_COMMIT_MESSAGE,
            ]))
            .await?;
            return Ok(files);
        }

        for file in &files {
            self.git(&["add", "--", file.as_str()]).await?;
        }
        self.git(&identity_args(&["commit", "--no-verify", "-m", COMMIT_MESSAGE]))
            .await?;
        self.git(&["push", "--no-verify"]).await?;

        info!("Committed {} generated test files", files.len());
        Ok(files)
    }

    async fn git(&self, args: &[&str]) -> Result<String> {
        debug!(?args, "Running git");
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.root)
            .output()
            .await
            .map_err(|e| Error::git(format!("Failed to run git: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::git(format!(
                "git {} failed: {}",
                subcommand(args),
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl Committer for GitCommitter {
    async fn commit_generated(&self, branch: Option<&str>) -> CommitResult {
        match self.try_commit(branch).await {
            Ok(committed_files) => CommitResult {
                committed_files,
                error: None,
            },
            Err(e) => {
                warn!("Failed to commit generated tests: {}", e);
                CommitResult {
                    committed_files: Vec::new(),
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

fn subcommand<'a>(args: &[&'a str]) -> &'a str {
    args.iter()
        .copied()
        .find(|a| !a.starts_with('-') && !a.contains('='))
        .unwrap_or_default()
}

fn identity_args<'a>(args: &[&'a str]) -> Vec<&'a str> {
    let mut full = vec!["-c", BOT_NAME_CONFIG, "-c", BOT_EMAIL_CONFIG];
    full.extend_from_slice(args);
    full
}
