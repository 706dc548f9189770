//! HTTP receiver for GitHub Sponsors webhook deliveries.
//!
//! Exposes the [`pipeline::WebhookOrchestrator`] over HTTP. Each request's
//! exact body bytes and headers are handed to the orchestrator, and its
//! [`pipeline::WebhookResponse`] is written back as a `text/plain` response.
//!
//! ## Routes
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/api/SponsorWebhook` | Azure Functions custom handler route |
//! | `POST` | `/` | Alias for direct deployments |
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Transport details live here. The [`pipeline`] crate
//! sees only [`pipeline::RawRequest`] and returns a
//! [`pipeline::WebhookResponse`]; it never touches axum types.

mod routes;
mod server;

pub use routes::{router, WEBHOOK_ROUTE};
pub use server::{serve, shutdown_signal};

use std::net::SocketAddr;

use thiserror::Error;

/// Errors raised while running the HTTP listener.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// The listen address could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// The address that was requested.
        addr: SocketAddr,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The server failed while accepting or serving connections.
    #[error("webhook server error: {0}")]
    Serve(#[source] std::io::Error),
}
