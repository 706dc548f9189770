//! `SharedKeyLite` request signing for the Table service.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::Url;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Formats `now` the way `x-ms-date` expects (RFC 1123, always GMT).
pub(crate) fn ms_date(now: DateTime<Utc>) -> String {
    now.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Builds the `Authorization` header value for a Table service request.
///
/// String-to-sign is `{x-ms-date}\n/{account}{url path}`; the query string is
/// not part of it for the operations used here.
pub(crate) fn shared_key_lite(account_name: &str, key: &[u8], date: &str, url: &Url) -> String {
    let string_to_sign = format!("{date}\n/{account_name}{}", url.path());

    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(string_to_sign.as_bytes());
    let signature = STANDARD.encode(mac.finalize().into_bytes());

    format!("SharedKeyLite {account_name}:{signature}")
}
