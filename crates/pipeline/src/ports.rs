//! Port traits for the two downstream sinks.
//!
//! Infrastructure crates implement these traits; the orchestrator sees only
//! the traits. Each sink is an optional capability: an implementation reports
//! through [`SponsorStore::is_enabled`] / [`SponsorCommitter::is_enabled`]
//! whether it was configured, and a disabled sink is skipped without error.
//! [`DisabledSink`] is the implementation used when nothing is configured.

use async_trait::async_trait;

use crate::{SinkError, SponsorGuid, SponsorLogin};

/// Append-only store of accepted sponsors, keyed by [`SponsorGuid`].
#[async_trait]
pub trait SponsorStore: Send + Sync {
    /// Returns `true` if this store should be written to.
    fn is_enabled(&self) -> bool {
        true
    }

    /// Records a sponsor together with the raw event payload.
    async fn save_sponsor(
        &self,
        guid: &SponsorGuid,
        login: &SponsorLogin,
        payload: &str,
    ) -> Result<(), SinkError>;
}

/// Writes a record of each accepted sponsor into a version-controlled tree.
#[async_trait]
pub trait SponsorCommitter: Send + Sync {
    /// Returns `true` if commits should be made.
    fn is_enabled(&self) -> bool {
        true
    }

    /// Commits a file describing the sponsor, named after `guid`.
    async fn commit_sponsor(&self, guid: &SponsorGuid, login: &SponsorLogin)
        -> Result<(), SinkError>;
}

/// Stand-in for a sink that has not been configured.
///
/// Always reports itself disabled; its write methods succeed without doing
/// anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledSink;

#[async_trait]
impl SponsorStore for DisabledSink {
    fn is_enabled(&self) -> bool {
        false
    }

    async fn save_sponsor(
        &self,
        _guid: &SponsorGuid,
        _login: &SponsorLogin,
        _payload: &str,
    ) -> Result<(), SinkError> {
        Ok(())
    }
}

#[async_trait]
impl SponsorCommitter for DisabledSink {
    fn is_enabled(&self) -> bool {
        false
    }

    async fn commit_sponsor(
        &self,
        _guid: &SponsorGuid,
        _login: &SponsorLogin,
    ) -> Result<(), SinkError> {
        Ok(())
    }
}
