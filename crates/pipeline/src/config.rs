//! Explicit configuration values for the webhook pipeline.
//!
//! The composition root builds a [`WebhookConfig`] once at startup and passes
//! it to the orchestrator and sink constructors. Every part is optional, and an
//! absent part turns the matching step into a no-op:
//!
//! - no [`WebhookSecret`]: signatures are not checked;
//! - no [`PersistenceTarget`]: nothing is written to the table store;
//! - no [`CommitTarget`]: nothing is committed to the repository.
//!
//! Secret-bearing values redact themselves in `Debug` output so configuration
//! can be logged safely.

use thiserror::Error;

use crate::{BranchName, RepositoryName, RepositoryOwner, TableName};

/// Table that receives sponsor records unless configured otherwise.
pub const DEFAULT_TABLE_NAME: &str = "Sponsors";

/// Branch that receives sponsor files unless configured otherwise.
pub const DEFAULT_BRANCH: &str = "main";

/// Problems found while assembling a [`WebhookConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The repository slug is not of the form `owner/name`.
    #[error("repository '{slug}' is not of the form 'owner/name'")]
    InvalidRepository {
        /// The rejected slug.
        slug: String,
    },
}

// ---------------------------------------------------------------------------
// Secrets
// ---------------------------------------------------------------------------

macro_rules! secret_string {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Clone, PartialEq, Eq)]
        pub struct $name(String);

        impl $name {
            /// Wraps a secret value, returning `None` if it is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Exposes the secret value.
            pub fn expose(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!(stringify!($name), "(<redacted>)"))
            }
        }
    };
}

secret_string! {
    /// Shared secret used to sign webhook deliveries.
    WebhookSecret
}

secret_string! {
    /// Token used to authenticate against the repository host.
    AccessToken
}

secret_string! {
    /// Connection string of the table store; contains the account key.
    ConnectionString
}

// ---------------------------------------------------------------------------
// Sink targets
// ---------------------------------------------------------------------------

/// Where accepted sponsors are persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistenceTarget {
    /// Connection string for the table service.
    pub connection_string: ConnectionString,
    /// Table that receives the records.
    pub table: TableName,
}

impl PersistenceTarget {
    /// Creates a target writing to `table`.
    pub fn new(connection_string: ConnectionString, table: TableName) -> Self {
        Self {
            connection_string,
            table,
        }
    }
}

/// Where accepted sponsors are committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitTarget {
    /// Token with write access to the repository contents.
    pub token: AccessToken,
    /// Repository owner.
    pub owner: RepositoryOwner,
    /// Repository name.
    pub repo: RepositoryName,
    /// Branch that receives the commit.
    pub branch: BranchName,
}

impl CommitTarget {
    /// Builds a target from an `owner/name` slug.
    ///
    /// The slug must contain exactly one `/` with non-empty text on both sides.
    pub fn from_slug(
        token: AccessToken,
        slug: &str,
        branch: BranchName,
    ) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidRepository {
            slug: slug.to_string(),
        };

        let mut parts = slug.split('/');
        let (owner, repo) = match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(repo), None) => (owner, repo),
            _ => return Err(invalid()),
        };

        Ok(Self {
            token,
            owner: RepositoryOwner::new(owner).ok_or_else(invalid)?,
            repo: RepositoryName::new(repo).ok_or_else(invalid)?,
            branch,
        })
    }
}

// ---------------------------------------------------------------------------
// Top-level configuration
// ---------------------------------------------------------------------------

/// Complete pipeline configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebhookConfig {
    /// Shared secret for signature verification.
    pub secret: Option<WebhookSecret>,
    /// Table store target.
    pub persistence: Option<PersistenceTarget>,
    /// Repository commit target.
    pub commit: Option<CommitTarget>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token() -> AccessToken {
        AccessToken::new("ghp_example").unwrap()
    }

    fn main_branch() -> BranchName {
        BranchName::new(DEFAULT_BRANCH).unwrap()
    }

    #[test]
    fn slug_splits_into_owner_and_repo_on_main() {
        let target = CommitTarget::from_slug(token(), "octo-org/credits", main_branch()).unwrap();

        assert_eq!(target.owner.as_str(), "octo-org");
        assert_eq!(target.repo.as_str(), "credits");
        assert_eq!(target.branch.as_str(), "main");
    }

    #[test]
    fn slug_must_have_exactly_two_non_empty_parts() {
        for slug in ["credits", "a/b/c", "/credits", "octo-org/", ""] {
            assert_eq!(
                CommitTarget::from_slug(token(), slug, main_branch()),
                Err(ConfigError::InvalidRepository { slug: slug.into() }),
                "slug {slug:?}"
            );
        }
    }

    #[test]
    fn secrets_are_redacted_in_debug_output() {
        let secret = WebhookSecret::new("s3cr3t").unwrap();
        assert_eq!(format!("{secret:?}"), "WebhookSecret(<redacted>)");
        let target = CommitTarget::from_slug(token(), "a/b", main_branch());
        assert!(!format!("{target:?}").contains("ghp_"));
    }

    #[test]
    fn empty_secrets_are_treated_as_absent() {
        assert!(WebhookSecret::new("").is_none());
        assert!(ConnectionString::new("").is_none());
    }

    #[test]
    fn connection_strings_are_redacted_in_debug_output() {
        let target = PersistenceTarget::new(
            ConnectionString::new("AccountName=a;AccountKey=c2VjcmV0").unwrap(),
            TableName::new(DEFAULT_TABLE_NAME).unwrap(),
        );
        assert!(!format!("{target:?}").contains("AccountKey"));
    }
}
