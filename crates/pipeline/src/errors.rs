//! Error taxonomy for the sponsor webhook pipeline.
//!
//! Three failure classes exist and each maps to exactly one response status:
//!
//! | Class | Produced by | Status |
//! |-------|-------------|--------|
//! | [`AuthenticationFailure`] | signature verification | `401` |
//! | [`ValidationFailure`] | payload extraction | `400` |
//! | [`SinkError`] (wrapped as [`WebhookError::Downstream`]) | persistence / commit | `502` |
//!
//! Authentication and validation failures are routine outcomes and are always
//! turned into a client response. Downstream failures are reported as
//! `502 Bad Gateway`; the pipeline stops at the first one.

use thiserror::Error;

use crate::{ResponseStatus, WebhookResponse};

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

/// The request could not be shown to come from a holder of the shared secret.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthenticationFailure {
    /// A secret is configured but the request carried no signature header.
    #[error("Missing signature")]
    MissingSignature,

    /// The signature header was malformed or its digest did not match the body.
    #[error("Invalid signature")]
    InvalidSignature,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// The request body did not have the shape of a sponsorship event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationFailure {
    /// The body is not a JSON document.
    #[error("Invalid JSON: {reason}")]
    InvalidJson {
        /// Parser diagnostic; logged, never returned to the caller.
        reason: String,
    },

    /// `sponsorship.sponsor.login` is missing, null, empty, or of the wrong type.
    ///
    /// Which level was at fault is deliberately not visible to the caller.
    #[error("Missing sponsor login: {reason}")]
    MissingSponsorLogin {
        /// Human-readable description of the structural problem.
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// Downstream sinks
// ---------------------------------------------------------------------------

/// Which downstream sink an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SinkKind {
    /// The table store.
    Persistence,
    /// The repository commit.
    RepositoryCommit,
}

impl std::fmt::Display for SinkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Persistence => f.write_str("persistence"),
            Self::RepositoryCommit => f.write_str("repository commit"),
        }
    }
}

/// Error returned by a sink port implementation.
///
/// Infrastructure crates convert their own error types into this one.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The remote service answered with a non-success status.
    #[error("{sink} rejected the request with status {status}: {message}")]
    Rejected {
        /// Sink that failed.
        sink: SinkKind,
        /// HTTP status returned by the remote service.
        status: u16,
        /// Response body or error description from the remote service.
        message: String,
    },

    /// The remote service could not be reached or the request could not be built.
    #[error("{sink} is unavailable: {source}")]
    Unavailable {
        /// Sink that failed.
        sink: SinkKind,
        /// Underlying transport or encoding error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl SinkError {
    /// Returns the sink that produced this error.
    pub fn sink(&self) -> SinkKind {
        match self {
            Self::Rejected { sink, .. } | Self::Unavailable { sink, .. } => *sink,
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline-level errors
// ---------------------------------------------------------------------------

/// Any failure that ends a webhook request before the success response.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Signature verification failed.
    #[error(transparent)]
    Authentication(#[from] AuthenticationFailure),

    /// Payload extraction failed.
    #[error(transparent)]
    Validation(#[from] ValidationFailure),

    /// A configured sink failed.
    #[error(transparent)]
    Downstream(#[from] SinkError),
}

impl WebhookError {
    /// Returns the response status for this failure.
    pub fn status(&self) -> ResponseStatus {
        match self {
            Self::Authentication(_) => ResponseStatus::Unauthorized,
            Self::Validation(_) => ResponseStatus::BadRequest,
            Self::Downstream(_) => ResponseStatus::BadGateway,
        }
    }

    /// Returns the plain-text body sent to the caller.
    ///
    /// Only the failure class is named; reasons and downstream messages stay
    /// in the logs.
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::Authentication(AuthenticationFailure::MissingSignature) => "Missing signature",
            Self::Authentication(AuthenticationFailure::InvalidSignature) => "Invalid signature",
            Self::Validation(ValidationFailure::InvalidJson { .. }) => "Invalid JSON",
            Self::Validation(ValidationFailure::MissingSponsorLogin { .. }) => {
                "Missing sponsor login"
            }
            Self::Downstream(e) => match e.sink() {
                SinkKind::Persistence => "Persistence failed",
                SinkKind::RepositoryCommit => "Repository commit failed",
            },
        }
    }

    /// Converts this failure into the response sent to the caller.
    pub fn to_response(&self) -> WebhookResponse {
        WebhookResponse {
            status: self.status(),
            body: self.public_message(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_reasons_never_reach_the_response_body() {
        let err = WebhookError::from(ValidationFailure::MissingSponsorLogin {
            reason: "missing field `sponsor`".into(),
        });

        assert_eq!(err.status(), ResponseStatus::BadRequest);
        assert_eq!(err.public_message(), "Missing sponsor login");
    }

    #[test]
    fn downstream_failures_map_to_bad_gateway_per_sink() {
        let persistence = WebhookError::from(SinkError::Rejected {
            sink: SinkKind::Persistence,
            status: 403,
            message: "AuthenticationFailed".into(),
        });
        let commit = WebhookError::from(SinkError::Unavailable {
            sink: SinkKind::RepositoryCommit,
            source: "connection reset".into(),
        });

        assert_eq!(persistence.to_response().status.as_u16(), 502);
        assert_eq!(persistence.public_message(), "Persistence failed");
        assert_eq!(commit.public_message(), "Repository commit failed");
    }

    #[test]
    fn authentication_failures_map_to_unauthorized() {
        let err = WebhookError::from(AuthenticationFailure::MissingSignature);
        assert_eq!(
            err.to_response(),
            WebhookResponse {
                status: ResponseStatus::Unauthorized,
                body: "Missing signature",
            }
        );
    }
}
