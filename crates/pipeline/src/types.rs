//! Shared value types for the sponsor webhook domain.
//!
//! These types describe one request/response cycle: the [`RawRequest`] handed
//! in by the host, the [`WebhookData`] derived from it once it has been
//! authenticated and parsed, and the [`WebhookResponse`] handed back. None of
//! them outlive a single request.

use std::collections::BTreeMap;

use crate::{SponsorGuid, SponsorLogin};

// ---------------------------------------------------------------------------
// Inbound request
// ---------------------------------------------------------------------------

/// Request headers keyed by lower-cased name; a header may carry several values.
///
/// Lookups are case-insensitive, matching HTTP header semantics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestHeaders(BTreeMap<String, Vec<String>>);

impl RequestHeaders {
    /// Creates an empty header map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `value` to the values held for `name`.
    pub fn append(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.0
            .entry(name.as_ref().to_ascii_lowercase())
            .or_default()
            .push(value.into());
    }

    /// Returns the first value of `name`, if the header is present.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.0
            .get(&name.to_ascii_lowercase())
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Returns every value of `name` in arrival order.
    pub fn get_all(&self, name: &str) -> &[String] {
        self.0
            .get(&name.to_ascii_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

impl<N, V> FromIterator<(N, V)> for RequestHeaders
where
    N: AsRef<str>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut headers = Self::new();
        for (name, value) in iter {
            headers.append(name, value);
        }
        headers
    }
}

/// An inbound webhook delivery exactly as the host received it.
///
/// The body is kept as the original bytes: the signature is computed over them
/// and the persisted payload is a verbatim copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRequest {
    body: Vec<u8>,
    headers: RequestHeaders,
}

impl RawRequest {
    /// Creates a request from its body and headers.
    pub fn new(body: impl Into<Vec<u8>>, headers: RequestHeaders) -> Self {
        Self {
            body: body.into(),
            headers,
        }
    }

    /// Returns the raw body bytes.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Returns the request headers.
    pub fn headers(&self) -> &RequestHeaders {
        &self.headers
    }
}

// ---------------------------------------------------------------------------
// Derived data
// ---------------------------------------------------------------------------

/// The facts extracted from an accepted delivery.
///
/// Built once after verification and extraction succeed; only its fields are
/// forwarded to the sinks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookData {
    /// Login of the sponsoring account.
    pub sponsor_login: SponsorLogin,
    /// Correlation identifier shared by both sink writes.
    pub sponsor_guid: SponsorGuid,
    /// The request body, unmodified.
    pub payload: String,
}

// ---------------------------------------------------------------------------
// Pipeline progress
// ---------------------------------------------------------------------------

/// Position of a delivery in the validation and dispatch pipeline.
///
/// Stages are strictly ordered; a failure at any stage before
/// [`PipelineStage::Responded`] ends the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PipelineStage {
    /// The request has arrived and nothing has been checked yet.
    Received,
    /// The signature has been accepted (or verification is disabled).
    Verified,
    /// The sponsor login has been extracted and a GUID minted.
    Extracted,
    /// The table record has been written (or persistence is disabled).
    Persisted,
    /// The sponsor file has been committed (or committing is disabled).
    Committed,
    /// The success response has been produced.
    Responded,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Received => "received",
            Self::Verified => "verified",
            Self::Extracted => "extracted",
            Self::Persisted => "persisted",
            Self::Committed => "committed",
            Self::Responded => "responded",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// HTTP status classes the pipeline can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseStatus {
    /// `200 OK`
    Ok,
    /// `400 Bad Request`
    BadRequest,
    /// `401 Unauthorized`
    Unauthorized,
    /// `502 Bad Gateway`
    BadGateway,
}

impl ResponseStatus {
    /// Returns the numeric HTTP status code.
    pub fn as_u16(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::BadRequest => 400,
            Self::Unauthorized => 401,
            Self::BadGateway => 502,
        }
    }
}

/// The outcome of one delivery: a status and a plain-text body.
///
/// Failure bodies only ever name the failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WebhookResponse {
    /// Status to send.
    pub status: ResponseStatus,
    /// Plain-text body to send.
    pub body: &'static str,
}

impl WebhookResponse {
    /// The success response: `200` with body `"OK"`.
    pub const OK: Self = Self {
        status: ResponseStatus::Ok,
        body: "OK",
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_ignores_case_and_returns_first_value() {
        let headers: RequestHeaders = [
            ("X-Hub-Signature-256", "sha256=aa"),
            ("x-hub-signature-256", "sha256=bb"),
        ]
        .into_iter()
        .collect();

        assert_eq!(headers.first("X-HUB-SIGNATURE-256"), Some("sha256=aa"));
        assert_eq!(headers.get_all("x-hub-signature-256").len(), 2);
        assert_eq!(headers.first("content-type"), None);
        assert!(headers.get_all("content-type").is_empty());
    }

    #[test]
    fn stages_are_ordered() {
        assert!(PipelineStage::Received < PipelineStage::Verified);
        assert!(PipelineStage::Persisted < PipelineStage::Committed);
        assert_eq!(PipelineStage::Extracted.to_string(), "extracted");
    }
}
