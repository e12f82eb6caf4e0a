//! Shared error types for covgap.
//!
//! Library code returns [`Result`]; the binary wraps it in `anyhow` at the
//! edges. Whether a failure aborts a run is decided by the orchestrator, not
//! by the error variant.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for covgap operations
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be resolved or failed validation
    #[error("Configuration error: {0}")]
    Config(String),

    /// Coverage generation or parsing failed
    #[error("Coverage error: {message}")]
    Coverage {
        message: String,
        path: Option<PathBuf>,
    },

    /// Local git plumbing failed
    #[error("Git error: {0}")]
    Git(String),

    /// GitHub REST API failure
    #[error("GitHub error: {0}")]
    GitHub(String),

    /// Backend API failure
    #[error("API request failed: {0}")]
    Api(String),

    /// The test generation engine failed
    #[error("Test generation failed: {0}")]
    Generation(String),

    /// The run needs a pull request but the workflow was triggered by something else
    #[error("Not running in pull request context: {0}")]
    NotPullRequest(String),

    /// IO errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// HTTP transport errors
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Create a coverage error without path context
    pub fn coverage(message: impl Into<String>) -> Self {
        Self::Coverage {
            message: message.into(),
            path: None,
        }
    }

    /// Create a coverage error for a specific report file
    pub fn coverage_with_path(message: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::Coverage {
            message: message.into(),
            path: Some(path.into()),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn git(message: impl Into<String>) -> Self {
        Self::Git(message.into())
    }

    pub fn github(message: impl Into<String>) -> Self {
        Self::GitHub(message.into())
    }

    pub fn api(message: impl Into<String>) -> Self {
        Self::Api(message.into())
    }

    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation(message.into())
    }

    /// Path associated with the error, if any
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::Coverage { path, .. } => path.as_ref(),
            _ => None,
        }
    }
}

impl From<git2::Error> for Error {
    fn from(err: git2::Error) -> Self {
        Self::Git(err.message().to_string())
    }
}

/// Result type alias using covgap's error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coverage_error_keeps_path() {
        let err = Error::coverage_with_path("unreadable tracefile", "coverage/lcov.info");
        assert_eq!(err.path(), Some(&PathBuf::from("coverage/lcov.info")));
        assert_eq!(err.to_string(), "Coverage error: unreadable tracefile");
    }

    #[test]
    fn test_api_error_message() {
        let err = Error::api("500 Internal Server Error - {}");
        assert_eq!(
            err.to_string(),
            "API request failed: 500 Internal Server Error - {}"
        );
        assert!(err.path().is_none());
    }

    #[test]
    fn test_io_error_is_transparent() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: Error = io.into();
        assert_eq!(err.to_string(), "missing");
    }
}
