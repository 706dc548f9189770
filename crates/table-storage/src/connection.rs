//! Azure Storage connection string parsing.
//!
//! A connection string is a `;`-separated list of `Key=Value` pairs. Keys are
//! matched case-insensitively and values may themselves contain `=` (account
//! keys and SAS tokens do). Recognised keys:
//!
//! | Key | Use |
//! |-----|-----|
//! | `UseDevelopmentStorage` | `true` selects the local emulator defaults |
//! | `DefaultEndpointsProtocol` | `http` or `https` (default `https`) |
//! | `AccountName` | storage account name |
//! | `AccountKey` | base64 shared key |
//! | `SharedAccessSignature` | SAS token, used instead of a key |
//! | `EndpointSuffix` | default `core.windows.net` |
//! | `TableEndpoint` | explicit table service URL |

use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::Url;
use thiserror::Error;

const DEV_ACCOUNT_NAME: &str = "devstoreaccount1";
const DEV_ACCOUNT_KEY: &str =
    "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==";
const DEV_TABLE_ENDPOINT: &str = "http://127.0.0.1:10002/devstoreaccount1";
const DEFAULT_ENDPOINT_SUFFIX: &str = "core.windows.net";

/// Problems found in a connection string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionStringError {
    /// A segment was not of the form `Key=Value`.
    #[error("segment '{0}' is not of the form Key=Value")]
    MalformedSegment(String),

    /// A key needed to reach or authenticate against the table service is absent.
    #[error("connection string has no {0}")]
    Missing(&'static str),

    /// `AccountKey` is not valid base64.
    #[error("AccountKey is not valid base64")]
    InvalidAccountKey,

    /// The table endpoint is not an absolute http(s) URL.
    #[error("table endpoint '{endpoint}' is not a valid URL: {reason}")]
    InvalidEndpoint {
        /// The rejected endpoint.
        endpoint: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// How requests to the table service are authorised.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Requests are signed with the account key (`SharedKeyLite`).
    SharedKey {
        /// Storage account name.
        account_name: String,
        /// Decoded account key.
        key: Vec<u8>,
    },
    /// A SAS token is appended to every request URL.
    SharedAccessSignature(String),
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SharedKey { account_name, .. } => f
                .debug_struct("SharedKey")
                .field("account_name", account_name)
                .field("key", &"<redacted>")
                .finish(),
            Self::SharedAccessSignature(_) => f.write_str("SharedAccessSignature(<redacted>)"),
        }
    }
}

/// The table service endpoint and credentials described by a connection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageAccount {
    table_endpoint: Url,
    credentials: Credentials,
}

impl StorageAccount {
    /// Parses an Azure Storage connection string.
    pub fn parse(connection_string: &str) -> Result<Self, ConnectionStringError> {
        let settings = parse_settings(connection_string)?;

        if settings
            .get("usedevelopmentstorage")
            .is_some_and(|v| v.eq_ignore_ascii_case("true"))
        {
            return Ok(Self {
                table_endpoint: parse_endpoint(DEV_TABLE_ENDPOINT)?,
                credentials: Credentials::SharedKey {
                    account_name: DEV_ACCOUNT_NAME.to_string(),
                    key: decode_key(DEV_ACCOUNT_KEY)?,
                },
            });
        }

        let account_name = settings.get("accountname").copied();

        let account_key = settings.get("accountkey");
        let sas = settings.get("sharedaccesssignature");
        let credentials = match (account_key, sas) {
            (Some(key), _) => Credentials::SharedKey {
                account_name: account_name
                    .ok_or(ConnectionStringError::Missing("AccountName"))?
                    .to_string(),
                key: decode_key(key)?,
            },
            (None, Some(sas)) => {
                Credentials::SharedAccessSignature(sas.trim_start_matches('?').to_string())
            }
            (None, None) => {
                return Err(ConnectionStringError::Missing(
                    "AccountKey or SharedAccessSignature",
                ))
            }
        };

        let table_endpoint = match settings.get("tableendpoint") {
            Some(endpoint) => parse_endpoint(endpoint)?,
            None => {
                let account = account_name.ok_or(ConnectionStringError::Missing("AccountName"))?;
                let protocol = settings
                    .get("defaultendpointsprotocol")
                    .copied()
                    .unwrap_or("https");
                let suffix = settings
                    .get("endpointsuffix")
                    .copied()
                    .unwrap_or(DEFAULT_ENDPOINT_SUFFIX);
                parse_endpoint(&format!("{protocol}://{account}.table.{suffix}"))?
            }
        };

        Ok(Self {
            table_endpoint,
            credentials,
        })
    }

    /// Returns the table service base URL.
    pub fn table_endpoint(&self) -> &Url {
        &self.table_endpoint
    }

    /// Returns the request credentials.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }
}

fn parse_settings(connection_string: &str) -> Result<HashMap<String, &str>, ConnectionStringError> {
    connection_string
        .split(';')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            segment
                .split_once('=')
                .map(|(key, value)| (key.trim().to_ascii_lowercase(), value.trim()))
                .ok_or_else(|| ConnectionStringError::MalformedSegment(segment.to_string()))
        })
        .collect()
}

fn decode_key(key: &str) -> Result<Vec<u8>, ConnectionStringError> {
    STANDARD
        .decode(key)
        .map_err(|_| ConnectionStringError::InvalidAccountKey)
}

fn parse_endpoint(endpoint: &str) -> Result<Url, ConnectionStringError> {
    let invalid = |reason: String| ConnectionStringError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason,
    };

    let url = Url::parse(endpoint.trim_end_matches('/')).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(invalid("expected an http or https URL".to_string()));
    }
    Ok(url)
}
