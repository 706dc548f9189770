//! Error type for the table storage adapter.

use pipeline::{SinkError, SinkKind};
use thiserror::Error;

use crate::ConnectionStringError;

/// Errors raised while talking to the Table service.
#[derive(Debug, Error)]
pub enum TableStorageError {
    /// The connection string could not be parsed.
    #[error("invalid connection string: {0}")]
    ConnectionString(#[from] ConnectionStringError),

    /// The HTTP client could not be built or the request could not be sent.
    #[error("table service request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The table endpoint cannot have resource segments appended to it.
    #[error("table endpoint '{0}' cannot take a resource path")]
    InvalidEndpoint(String),

    /// The service answered with an unexpected status.
    #[error("{operation} returned status {status}: {message}")]
    Status {
        /// The operation that failed (e.g. `"insert entity"`).
        operation: &'static str,
        /// HTTP status code.
        status: u16,
        /// Response body, usually an OData error document.
        message: String,
    },
}

impl From<TableStorageError> for SinkError {
    fn from(err: TableStorageError) -> Self {
        match err {
            TableStorageError::Status {
                operation,
                status,
                message,
            } => SinkError::Rejected {
                sink: SinkKind::Persistence,
                status,
                message: format!("{operation}: {message}"),
            },
            other => SinkError::Unavailable {
                sink: SinkKind::Persistence,
                source: Box::new(other),
            },
        }
    }
}
