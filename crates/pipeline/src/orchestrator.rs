//! The webhook validation and dispatch pipeline.
//!
//! [`WebhookOrchestrator`] walks one request through the stages of
//! [`PipelineStage`]:
//!
//! ```text
//! Received ─verify─▶ Verified ─extract─▶ Extracted ─save─▶ Persisted ─commit─▶ Committed ─▶ Responded
//!     │                  │                    │                 │
//!     └──────────────────┴────────────────────┴─────────────────┴──▶ Failed(status, message)
//! ```
//!
//! The GUID is minted on entering `Extracted` and handed unchanged to both
//! sinks. Disabled sinks are skipped. The orchestrator holds no per-request
//! state, so one instance serves any number of concurrent requests.

use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn, Span};

use crate::{
    HmacSha256Verifier, PayloadExtractor, PipelineStage, RawRequest, SignatureVerifier,
    SponsorCommitter, SponsorGuid, SponsorStore, SponsorshipExtractor, WebhookData, WebhookError,
    WebhookResponse, WebhookSecret, SIGNATURE_HEADER,
};

/// Sequences verification, extraction, persistence and commit for each delivery.
#[derive(Clone)]
pub struct WebhookOrchestrator {
    verifier: Arc<dyn SignatureVerifier>,
    extractor: Arc<dyn PayloadExtractor>,
    store: Arc<dyn SponsorStore>,
    committer: Arc<dyn SponsorCommitter>,
}

impl WebhookOrchestrator {
    /// Creates an orchestrator from explicit collaborators.
    pub fn new(
        verifier: Arc<dyn SignatureVerifier>,
        extractor: Arc<dyn PayloadExtractor>,
        store: Arc<dyn SponsorStore>,
        committer: Arc<dyn SponsorCommitter>,
    ) -> Self {
        Self {
            verifier,
            extractor,
            store,
            committer,
        }
    }

    /// Creates an orchestrator using HMAC-SHA256 verification and the
    /// sponsorship payload extractor.
    pub fn with_sinks(
        secret: Option<WebhookSecret>,
        store: Arc<dyn SponsorStore>,
        committer: Arc<dyn SponsorCommitter>,
    ) -> Self {
        Self::new(
            Arc::new(HmacSha256Verifier::new(secret)),
            Arc::new(SponsorshipExtractor),
            store,
            committer,
        )
    }

    /// Handles one delivery and returns the response to send.
    ///
    /// Never fails: every error is logged and mapped to its response.
    pub async fn handle(&self, request: &RawRequest) -> WebhookResponse {
        match self.process(request).await {
            Ok(data) => {
                info!(
                    sponsor_login = %data.sponsor_login,
                    sponsor_guid = %data.sponsor_guid,
                    "Sponsor recorded"
                );
                WebhookResponse::OK
            }
            Err(err @ WebhookError::Downstream(_)) => {
                error!(error = %err, "Webhook dispatch failed");
                err.to_response()
            }
            Err(err) => {
                warn!(error = %err, "Webhook rejected");
                err.to_response()
            }
        }
    }

    /// Runs the pipeline and returns the data forwarded to the sinks.
    #[instrument(
        name = "sponsor_webhook",
        skip_all,
        fields(body_len = request.body().len(), sponsor_guid = tracing::field::Empty)
    )]
    pub async fn process(&self, request: &RawRequest) -> Result<WebhookData, WebhookError> {
        debug!(stage = %PipelineStage::Received, "Webhook received");

        self.verifier
            .verify(request.body(), request.headers().first(SIGNATURE_HEADER))?;
        debug!(stage = %PipelineStage::Verified, "Signature accepted");

        let sponsor_login = self.extractor.extract(request.body())?;
        let data = WebhookData {
            sponsor_login,
            sponsor_guid: SponsorGuid::new_random(),
            // The extractor only accepts valid JSON, which is valid UTF-8.
            payload: String::from_utf8_lossy(request.body()).into_owned(),
        };
        Span::current().record("sponsor_guid", tracing::field::display(&data.sponsor_guid));
        debug!(
            stage = %PipelineStage::Extracted,
            sponsor_login = %data.sponsor_login,
            "Payload extracted"
        );

        if self.store.is_enabled() {
            self.store
                .save_sponsor(&data.sponsor_guid, &data.sponsor_login, &data.payload)
                .await?;
            debug!(stage = %PipelineStage::Persisted, "Sponsor persisted");
        } else {
            debug!(stage = %PipelineStage::Persisted, "Persistence disabled; skipped");
        }

        if self.committer.is_enabled() {
            self.committer
                .commit_sponsor(&data.sponsor_guid, &data.sponsor_login)
                .await?;
            debug!(stage = %PipelineStage::Committed, "Sponsor committed");
        } else {
            debug!(stage = %PipelineStage::Committed, "Repository commit disabled; skipped");
        }

        debug!(stage = %PipelineStage::Responded, "Webhook accepted");
        Ok(data)
    }
}

impl std::fmt::Debug for WebhookOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookOrchestrator")
            .field("persistence_enabled", &self.store.is_enabled())
            .field("commit_enabled", &self.committer.is_enabled())
            .finish_non_exhaustive()
    }
}
