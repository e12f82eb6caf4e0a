//! Minimal GitHub REST client: pull request files and comments.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::{Error, Result};

const PER_PAGE: usize = 100;
/// GitHub lists at most 3000 files per pull request.
const MAX_PAGES: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Added,
    Removed,
    Modified,
    Renamed,
    Copied,
    Changed,
    Unchanged,
    #[serde(other)]
    Unknown,
}

/// One entry of `GET /repos/{owner}/{repo}/pulls/{number}/files`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestFile {
    pub filename: String,
    pub status: FileStatus,
    #[serde(default)]
    pub sha: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: Client,
    api_url: String,
}

impl GitHubClient {
    pub fn new(api_url: &str, token: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| Error::config("GitHub token contains invalid characters"))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("covgap/", env!("CARGO_PKG_VERSION"))),
        );

        let http = Client::builder().default_headers(headers).build()?;
        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    /// Every file of a pull request, following pagination.
    pub async fn list_pull_request_files(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<Vec<PullRequestFile>> {
        let url = format!(
            "{}/repos/{}/{}/pulls/{}/files",
            self.api_url, owner, repo, number
        );
        let mut files = Vec::new();

        for page in 1..=MAX_PAGES {
            let response = self
                .http
                .get(&url)
                .query(&[("per_page", PER_PAGE.to_string()), ("page", page.to_string())])
                .send()
                .await
                .map_err(|e| Error::github(format!("Failed to retrieve changed files: {}", e)))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(failure(status, &body));
            }

            let batch: Vec<PullRequestFile> = response.json().await?;
            let batch_len = batch.len();
            debug!(page, count = batch_len, "Fetched pull request files");
            files.extend(batch);

            if batch_len < PER_PAGE {
                break;
            }
        }

        Ok(files)
    }

    /// Post a markdown comment on a pull request.
    pub async fn post_pull_request_comment(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        body: &str,
    ) -> Result<()> {
        let url = format!(
            "{}/repos/{}/{}/issues/{}/comments",
            self.api_url, owner, repo, number
        );
        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({ "body": body }))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(Error::github(format!(
                "Failed to post comment: {} {}",
                status, body
            )))
        }
    }
}

fn failure(status: StatusCode, body: &str) -> Error {
    let rate_limited = matches!(status, StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS)
        && body.to_lowercase().contains("rate limit");
    if rate_limited {
        warn!("GitHub API rate limit exceeded, consider using a token with higher limits");
    }
    Error::github(format!(
        "Failed to retrieve changed files: GitHub API returned status {} {}",
        status, body
    ))
}
