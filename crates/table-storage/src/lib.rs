//! Sponsor webhook persistence adapter for Azure Table Storage.
//!
//! Implements [`pipeline::SponsorStore`] over the Table service REST API. Each
//! accepted sponsor becomes one entity in the configured table (default
//! `Sponsors`) with partition key `Sponsor`, row key equal to the sponsor GUID,
//! and the fields `github_login` and `payload`. The table is created on demand;
//! an existing table is not an error.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Connection string parsing, request signing, and HTTP
//! transport live here. The [`pipeline`] crate sees only
//! [`pipeline::SponsorStore`] and [`pipeline::SinkError`].
//!
//! ## Authentication
//!
//! - Account key connection strings sign each request with `SharedKeyLite`.
//! - SAS connection strings append the token to each request URL.
//! - `UseDevelopmentStorage=true` targets the local storage emulator.

mod auth;
mod client;
mod connection;
mod error;

pub use client::{TableStorageClient, API_VERSION, SPONSOR_PARTITION_KEY};
pub use connection::{ConnectionStringError, Credentials, StorageAccount};
pub use error::TableStorageError;
