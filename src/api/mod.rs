//! Backend API client: authentication and workflow audit logging.
//!
//! Every call is retried on transport failures and 5xx responses according
//! to the configured [`RetryConfig`]. Whether a failure matters is up to the
//! caller; the orchestrator treats all of these calls as best effort.

pub mod types;

pub use types::{CloseWorkflowRequest, OpenWorkflowRequest};

use async_trait::async_trait;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::RetryConfig;
use crate::errors::{Error, Result};
use types::{OpenWorkflowResponse, SignInRequest, SignInResponse};

const REQUEST_SOURCE_HEADER: &str = "x-request-source";
const REQUEST_SOURCE: &str = "CLI";

const SIGN_IN_ENDPOINT: &str = "auth/v2/sign-in-with-secret-token";
const OPEN_WORKFLOW_ENDPOINT: &str = "api/v1/workflows/open";
const CLOSE_WORKFLOW_ENDPOINT: &str = "api/v1/workflows/close";

/// Audit trail of a run on the backend.
#[async_trait]
pub trait WorkflowLogger: Send + Sync {
    async fn login(&self) -> Result<()>;

    /// Returns the id of the opened workflow run.
    async fn log_start_operation(&self, request: &OpenWorkflowRequest) -> Result<String>;

    async fn log_end_operation(&self, request: &CloseWorkflowRequest) -> Result<()>;
}

/// A failed attempt and whether repeating it could help.
struct Attempt {
    error: Error,
    retryable: bool,
}

pub struct ApiClient {
    http: Client,
    base_url: String,
    secret_token: Option<String>,
    retry: RetryConfig,
    id_token: RwLock<Option<String>>,
}

impl ApiClient {
    pub fn new(base_url: &str, secret_token: Option<String>, retry: RetryConfig) -> Result<Self> {
        let http = Client::builder().timeout(retry.timeout()).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            secret_token,
            retry,
            id_token: RwLock::new(None),
        })
    }

    pub async fn is_authenticated(&self) -> bool {
        self.id_token.read().await.is_some()
    }

    /// Exchange the secret token for an id token used on later calls.
    pub async fn login(&self) -> Result<()> {
        let secret = self
            .secret_token
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::config("API key is required but not configured"))?;

        let response: SignInResponse = self
            .post(SIGN_IN_ENDPOINT, &SignInRequest { secret })
            .await?;
        let id_token = response
            .id_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::api("Authentication response missing idToken"))?;

        *self.id_token.write().await = Some(id_token);
        debug!("Authenticated with backend");
        Ok(())
    }

    /// Record the start of a run; returns the workflow run id.
    pub async fn log_start_operation(&self, request: &OpenWorkflowRequest) -> Result<String> {
        let response: OpenWorkflowResponse = self.post(OPEN_WORKFLOW_ENDPOINT, request).await?;
        Ok(response.id)
    }

    pub async fn log_end_operation(&self, request: &CloseWorkflowRequest) -> Result<()> {
        let _: serde_json::Value = self.post(CLOSE_WORKFLOW_ENDPOINT, request).await?;
        Ok(())
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    async fn post<B, R>(&self, endpoint: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.url(endpoint);
        let started = Instant::now();
        let mut retries = 0;

        loop {
            match self.post_once(&url, body).await {
                Ok(value) => return Ok(value),
                Err(attempt)
                    if attempt.retryable && self.retry.should_retry(retries, started.elapsed()) =>
                {
                    retries += 1;
                    let delay = self.retry.delay_for_attempt(retries);
                    warn!(
                        "Request to {} failed ({}), retrying in {:?} (attempt {}/{})",
                        endpoint, attempt.error, delay, retries, self.retry.max_retries
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(attempt) => return Err(attempt.error),
            }
        }
    }

    async fn post_once<B, R>(&self, url: &str, body: &B) -> std::result::Result<R, Attempt>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let mut request = self
            .http
            .post(url)
            .header(REQUEST_SOURCE_HEADER, REQUEST_SOURCE)
            .json(body);

        if let Some(token) = self.id_token.read().await.as_deref() {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
                Attempt {
                    error: Error::api("id token contains invalid header characters"),
                    retryable: false,
                }
            })?;
            value.set_sensitive(true);
            request = request.header(AUTHORIZATION, value);
        }

        let response = request.send().await.map_err(|e| Attempt {
            error: Error::api(format!("No response received from {}", url)),
            retryable: e.is_connect() || e.is_timeout() || e.is_request(),
        })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Attempt {
                error: Error::api(describe_failure(status, &text)),
                retryable: status.is_server_error(),
            });
        }

        let invalid = |reason: String| Attempt {
            error: Error::api(format!("Invalid response from {}: {}", url, reason)),
            retryable: false,
        };
        let text = response.text().await.map_err(|e| invalid(e.to_string()))?;
        // An empty body reads as `null` so unit-like responses still parse.
        let text = if text.trim().is_empty() { "null" } else { text.as_str() };
        serde_json::from_str::<R>(text).map_err(|e| invalid(e.to_string()))
    }
}

#[async_trait]
impl WorkflowLogger for ApiClient {
    async fn login(&self) -> Result<()> {
        ApiClient::login(self).await
    }

    async fn log_start_operation(&self, request: &OpenWorkflowRequest) -> Result<String> {
        ApiClient::log_start_operation(self, request).await
    }

    async fn log_end_operation(&self, request: &CloseWorkflowRequest) -> Result<()> {
        ApiClient::log_end_operation(self, request).await
    }
}

/// `<code> <reason> - <body as JSON>`, where a non-JSON body is rendered as
/// a JSON string.
fn describe_failure(status: StatusCode, body: &str) -> String {
    let body = serde_json::from_str::<serde_json::Value>(body)
        .unwrap_or_else(|_| serde_json::Value::String(body.to_string()));
    format!(
        "{} {} - {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or_default(),
        body
    )
}
