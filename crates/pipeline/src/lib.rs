//! Core validation and dispatch pipeline for the sponsor webhook.
//!
//! This crate contains the domain types, error taxonomy, and port traits of
//! the webhook receiver, plus the pure pieces of the pipeline: signature
//! verification, payload extraction, and the orchestrator that sequences them
//! and hands accepted sponsors to the sinks.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! The HTTP receiver lives in `listener`; the sinks live in `table-storage`
//! and `github`. They implement the traits defined here.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`SponsorLogin`, `SponsorGuid`, etc.) |
//! | [`types`] | Request, derived data, stage and response types |
//! | [`errors`] | Error taxonomy and its response mapping |
//! | [`config`] | Explicit configuration values and secret wrappers |
//! | [`verifier`] | HMAC-SHA256 signature verification |
//! | [`extractor`] | Sponsor login extraction |
//! | [`ports`] | Sink traits implemented by infrastructure crates |
//! | [`orchestrator`] | The request state machine |

pub mod config;
pub mod errors;
pub mod extractor;
pub mod identifiers;
pub mod orchestrator;
pub mod ports;
pub mod types;
pub mod verifier;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use config::{
    AccessToken, CommitTarget, ConfigError, ConnectionString, PersistenceTarget, WebhookConfig,
    WebhookSecret, DEFAULT_BRANCH, DEFAULT_TABLE_NAME,
};
pub use errors::{AuthenticationFailure, SinkError, SinkKind, ValidationFailure, WebhookError};
pub use extractor::{PayloadExtractor, SponsorshipExtractor};
pub use identifiers::{
    BranchName, RepositoryName, RepositoryOwner, SponsorGuid, SponsorLogin, TableName,
};
pub use orchestrator::WebhookOrchestrator;
pub use ports::{DisabledSink, SponsorCommitter, SponsorStore};
pub use types::{
    PipelineStage, RawRequest, RequestHeaders, ResponseStatus, WebhookData, WebhookResponse,
};
pub use verifier::{HmacSha256Verifier, SignatureVerifier, SIGNATURE_HEADER};
