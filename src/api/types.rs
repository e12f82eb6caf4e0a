use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{RunConfig, TestFileName, TestStructure};
use crate::git::GitInfo;

pub const OPERATION_TYPE_GENERATE_TESTS: &str = "GENERATE_TESTS";

#[derive(Debug, Serialize)]
pub(crate) struct SignInRequest<'a> {
    pub secret: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SignInResponse {
    #[serde(default)]
    pub id_token: Option<String>,
}

/// Body of `POST api/v1/workflows/open`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenWorkflowRequest {
    #[serde(rename = "type")]
    pub operation_type: &'static str,
    pub owner: String,
    pub repo: String,
    pub source_ref: String,
    pub commit_sha: String,
    pub threshold: f64,
    pub test_location: TestStructure,
    pub test_naming: TestFileName,
    pub operation_started_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pr_url: Option<String>,
}

impl OpenWorkflowRequest {
    pub fn new(
        git: &GitInfo,
        config: &RunConfig,
        pr_url: Option<String>,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            operation_type: OPERATION_TYPE_GENERATE_TESTS,
            owner: git.owner.clone(),
            repo: git.repository.clone(),
            source_ref: git.ref_name.clone(),
            commit_sha: git.sha.clone(),
            threshold: config.coverage_threshold,
            test_location: config.conventions.structure,
            test_naming: config.conventions.file_name,
            operation_started_at: timestamp(started_at),
            pr_url,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenWorkflowResponse {
    pub id: String,
}

/// Body of `POST api/v1/workflows/close`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseWorkflowRequest {
    pub workflow_run_id: String,
    pub operation_ended_at: String,
}

impl CloseWorkflowRequest {
    pub fn new(workflow_run_id: impl Into<String>, ended_at: DateTime<Utc>) -> Self {
        Self {
            workflow_run_id: workflow_run_id.into(),
            operation_ended_at: timestamp(ended_at),
        }
    }
}

/// RFC 3339 with millisecond precision and a `Z` suffix.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{resolve_run_config, ConfigOverrides};
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_open_request_wire_format() {
        let dir = TempDir::new().unwrap();
        let config = resolve_run_config(
            None,
            ConfigOverrides {
                github_token: Some("ghs_token".to_string()),
                coverage_threshold: Some(80.0),
                ..Default::default()
            },
            dir.path().to_path_buf(),
        )
        .unwrap();
        let git = GitInfo {
            ref_name: "feature".to_string(),
            repository: "widgets".to_string(),
            owner: "octo".to_string(),
            sha: "abc123".to_string(),
        };
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 30, 0).unwrap();

        let request = OpenWorkflowRequest::new(&git, &config, None, at);

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "type": "GENERATE_TESTS",
                "owner": "octo",
                "repo": "widgets",
                "sourceRef": "feature",
                "commitSha": "abc123",
                "threshold": 80.0,
                "testLocation": "siblingFolder",
                "testNaming": "camelCase",
                "operationStartedAt": "2026-03-01T12:30:00.000Z",
            })
        );
    }

    #[test]
    fn test_close_request_wire_format() {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 31, 5).unwrap();
        assert_eq!(
            serde_json::to_value(CloseWorkflowRequest::new("run-1", at)).unwrap(),
            json!({
                "workflowRunId": "run-1",
                "operationEndedAt": "2026-03-01T12:31:05.000Z",
            })
        );
    }
}
