//! Sponsor webhook GitHub infrastructure adapter.
//!
//! Implements [`pipeline::SponsorCommitter`] by creating one file per accepted
//! sponsor through the repository contents API:
//!
//! - path: `sponsors/{guid}.json`
//! - contents: `{ "login": ..., "guid": ... }`, two-space indented
//! - commit message: `Add sponsor {login}`
//! - branch: the configured branch (default `main`)
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** This crate must not contain domain rules.
//! Authentication, request encoding, and error-body parsing are handled here;
//! the [`pipeline`] crate never sees them.

mod contents;
mod error;

pub use contents::{
    sponsor_file_contents, sponsor_file_path, GithubContentsClient, API_VERSION,
    CLIENT_USER_AGENT, DEFAULT_API_URL, SPONSOR_DIRECTORY,
};
pub use error::GithubError;
