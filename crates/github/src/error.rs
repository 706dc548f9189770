//! Error type for the GitHub adapter.

use pipeline::{SinkError, SinkKind};
use thiserror::Error;

/// Errors raised while committing to GitHub.
#[derive(Debug, Error)]
pub enum GithubError {
    /// The HTTP client could not be built or the request could not be sent.
    #[error("GitHub request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The configured API URL is unusable.
    #[error("invalid GitHub API URL '{url}': {reason}")]
    InvalidApiUrl {
        /// The rejected URL.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The sponsor document could not be serialised.
    #[error("could not encode sponsor file: {0}")]
    Encode(#[from] serde_json::Error),

    /// GitHub answered with an unexpected status.
    #[error("GitHub returned status {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// The `message` field of GitHub's error body, or the raw body.
        message: String,
    },
}

impl From<GithubError> for SinkError {
    fn from(err: GithubError) -> Self {
        match err {
            GithubError::Status { status, message } => SinkError::Rejected {
                sink: SinkKind::RepositoryCommit,
                status,
                message,
            },
            other => SinkError::Unavailable {
                sink: SinkKind::RepositoryCommit,
                source: Box::new(other),
            },
        }
    }
}
