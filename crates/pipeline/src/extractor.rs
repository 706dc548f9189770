//! Sponsorship payload extraction.
//!
//! Only `sponsorship.sponsor.login` is read from the body. Parsing is split in
//! two so the caller can tell "not JSON at all" apart from "JSON of the wrong
//! shape"; every shape problem collapses into
//! [`ValidationFailure::MissingSponsorLogin`].

use serde_json::{Map, Value};

use crate::{SponsorLogin, ValidationFailure};

/// Extracts the sponsor login from a webhook body.
pub trait PayloadExtractor: Send + Sync {
    /// Returns the sponsor login or the reason the body was rejected.
    fn extract(&self, body: &[u8]) -> Result<SponsorLogin, ValidationFailure>;
}

/// Extractor for GitHub `sponsorship` webhook events.
#[derive(Debug, Clone, Copy, Default)]
pub struct SponsorshipExtractor;

impl PayloadExtractor for SponsorshipExtractor {
    fn extract(&self, body: &[u8]) -> Result<SponsorLogin, ValidationFailure> {
        let document: Value =
            serde_json::from_slice(body).map_err(|e| ValidationFailure::InvalidJson {
                reason: e.to_string(),
            })?;

        let root = as_object(&document, "payload")?;
        let sponsorship = as_object(field(root, "sponsorship")?, "sponsorship")?;
        let sponsor = as_object(field(sponsorship, "sponsor")?, "sponsorship.sponsor")?;
        let login = field(sponsor, "login")?
            .as_str()
            .ok_or_else(|| missing("sponsorship.sponsor.login is not a string"))?;

        SponsorLogin::new(login).ok_or_else(|| missing("sponsorship.sponsor.login is empty"))
    }
}

fn missing(reason: impl Into<String>) -> ValidationFailure {
    ValidationFailure::MissingSponsorLogin {
        reason: reason.into(),
    }
}

// Objects only; arrays are never read by position.
fn as_object<'a>(
    value: &'a Value,
    path: &str,
) -> Result<&'a Map<String, Value>, ValidationFailure> {
    value
        .as_object()
        .ok_or_else(|| missing(format!("{path} is not an object")))
}

// A `null` member counts as absent.
fn field<'a>(object: &'a Map<String, Value>, key: &str) -> Result<&'a Value, ValidationFailure> {
    object
        .get(key)
        .filter(|value| !value.is_null())
        .ok_or_else(|| missing(format!("`{key}` is missing")))
}
