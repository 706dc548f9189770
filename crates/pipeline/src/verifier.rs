//! Webhook signature verification.
//!
//! GitHub signs each delivery with `X-Hub-Signature-256: sha256=<hex>`, the
//! lower-case hex HMAC-SHA256 of the raw body keyed with the shared secret.
//! The check runs over the exact bytes received, before anything parses them.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::{AuthenticationFailure, WebhookSecret};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the delivery signature.
pub const SIGNATURE_HEADER: &str = "X-Hub-Signature-256";

/// Decides whether a request body was produced by a holder of the shared secret.
pub trait SignatureVerifier: Send + Sync {
    /// Verifies `body` against the value of the signature header, if any.
    fn verify(&self, body: &[u8], signature: Option<&str>) -> Result<(), AuthenticationFailure>;
}

/// HMAC-SHA256 verifier for GitHub-style `sha256=<hex>` signatures.
///
/// Constructed without a secret it accepts every request ("open" mode).
#[derive(Debug, Clone, Default)]
pub struct HmacSha256Verifier {
    secret: Option<WebhookSecret>,
}

impl HmacSha256Verifier {
    /// Creates a verifier; `None` disables verification.
    pub fn new(secret: Option<WebhookSecret>) -> Self {
        Self { secret }
    }
}

impl SignatureVerifier for HmacSha256Verifier {
    fn verify(&self, body: &[u8], signature: Option<&str>) -> Result<(), AuthenticationFailure> {
        let Some(secret) = &self.secret else {
            return Ok(());
        };

        let header = signature.ok_or(AuthenticationFailure::MissingSignature)?;
        let supplied = parse_signature_header(header)?;
        let expected = sign(secret, body);

        // Compare the hex text rather than decoded bytes; a length mismatch is
        // simply unequal.
        if bool::from(expected.as_bytes().ct_eq(supplied.as_bytes())) {
            Ok(())
        } else {
            Err(AuthenticationFailure::InvalidSignature)
        }
    }
}

/// Returns the lower-case hex HMAC-SHA256 of `body` keyed with `secret`.
pub fn sign(secret: &WebhookSecret, body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.expose().as_bytes())
        .expect("HMAC accepts any key length");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Splits `sha256=<digest>` and returns the digest.
///
/// The header must split on `=` into exactly two parts and the first must be
/// `sha256`.
fn parse_signature_header(header: &str) -> Result<&str, AuthenticationFailure> {
    let mut parts = header.split('=');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("sha256"), Some(digest), None) => Ok(digest),
        _ => Err(AuthenticationFailure::InvalidSignature),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &[u8] = br#"{"sponsorship":{"sponsor":{"login":"octocat"}}}"#;

    fn secret() -> WebhookSecret {
        WebhookSecret::new("s3cr3t").unwrap()
    }

    fn enforcing() -> HmacSha256Verifier {
        HmacSha256Verifier::new(Some(secret()))
    }

    #[test]
    fn open_mode_accepts_anything() {
        let verifier = HmacSha256Verifier::new(None);

        assert_eq!(verifier.verify(BODY, None), Ok(()));
        assert_eq!(verifier.verify(BODY, Some("garbage")), Ok(()));
        assert_eq!(verifier.verify(BODY, Some("sha256=00")), Ok(()));
    }

    #[test]
    fn matching_signature_is_accepted() {
        let header = format!("sha256={}", sign(&secret(), BODY));
        assert_eq!(enforcing().verify(BODY, Some(&header)), Ok(()));
    }

    #[test]
    fn known_digest_matches_reference_value() {
        // Example from GitHub's webhook validation documentation.
        let secret = WebhookSecret::new("It's a Secret to Everybody").unwrap();
        assert_eq!(
            sign(&secret, b"Hello, World!"),
            "757107ea0eb2509fc211221cce984b8a37570b6d7586c22c46f4379c8b043e17"
        );
    }

    #[test]
    fn missing_header_is_reported_as_missing() {
        assert_eq!(
            enforcing().verify(BODY, None),
            Err(AuthenticationFailure::MissingSignature)
        );
    }

    #[test]
    fn malformed_headers_are_invalid() {
        let digest = sign(&secret(), BODY);
        let headers = [
            digest.clone(),
            format!("sha1={digest}"),
            format!("SHA256={digest}"),
            format!("sha256={digest}="),
            "sha256".to_string(),
            String::new(),
        ];

        for header in &headers {
            assert_eq!(
                enforcing().verify(BODY, Some(header)),
                Err(AuthenticationFailure::InvalidSignature),
                "header {header:?}"
            );
        }
    }

    #[test]
    fn wrong_digest_is_invalid() {
        let other = sign(&secret(), b"a different body");
        assert_eq!(
            enforcing().verify(BODY, Some(&format!("sha256={other}"))),
            Err(AuthenticationFailure::InvalidSignature)
        );
    }

    #[test]
    fn digest_comparison_is_case_sensitive_and_length_checked() {
        let digest = sign(&secret(), BODY);
        let upper = format!("sha256={}", digest.to_uppercase());
        let truncated = format!("sha256={}", &digest[..32]);

        assert_eq!(
            enforcing().verify(BODY, Some(&upper)),
            Err(AuthenticationFailure::InvalidSignature)
        );
        assert_eq!(
            enforcing().verify(BODY, Some(&truncated)),
            Err(AuthenticationFailure::InvalidSignature)
        );
    }

    #[test]
    fn signature_covers_exact_body_bytes() {
        let header = format!("sha256={}", sign(&secret(), BODY));
        let reformatted = br#"{ "sponsorship": { "sponsor": { "login": "octocat" } } }"#;

        assert_eq!(
            enforcing().verify(reformatted, Some(&header)),
            Err(AuthenticationFailure::InvalidSignature)
        );
    }
}
