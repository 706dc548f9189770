//! File creation through the GitHub repository contents API.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use pipeline::{CommitTarget, SinkError, SponsorCommitter, SponsorGuid, SponsorLogin};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::GithubError;

/// Public GitHub REST API base URL.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Product name sent as the `User-Agent`.
pub const CLIENT_USER_AGENT: &str = "credits-hub";

/// REST API version pinned via `X-GitHub-Api-Version`.
pub const API_VERSION: &str = "2022-11-28";

/// Directory that receives one file per sponsor.
pub const SPONSOR_DIRECTORY: &str = "sponsors";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Body of the committed sponsor file.
#[derive(Debug, Serialize)]
struct SponsorFile<'a> {
    login: &'a str,
    guid: String,
}

#[derive(Debug, Serialize)]
struct CreateFileRequest<'a> {
    message: String,
    /// Base64 of the file contents.
    content: String,
    branch: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Returns the repository path of the file recording `guid`.
pub fn sponsor_file_path(guid: &SponsorGuid) -> String {
    format!("{SPONSOR_DIRECTORY}/{guid}.json")
}

/// Renders the sponsor file: indented JSON with `login` then `guid`.
pub fn sponsor_file_contents(
    guid: &SponsorGuid,
    login: &SponsorLogin,
) -> Result<String, GithubError> {
    let file = SponsorFile {
        login: login.as_str(),
        guid: guid.to_string(),
    };
    Ok(serde_json::to_string_pretty(&file)?)
}

/// Commits sponsor files to one branch of one repository.
#[derive(Debug, Clone)]
pub struct GithubContentsClient {
    http: reqwest::Client,
    api_url: Url,
    target: CommitTarget,
}

impl GithubContentsClient {
    /// Creates a client against the public GitHub API.
    pub fn new(target: CommitTarget) -> Result<Self, GithubError> {
        Self::with_api_url(target, DEFAULT_API_URL)
    }

    /// Creates a client against another API base URL (e.g. GitHub Enterprise).
    pub fn with_api_url(target: CommitTarget, api_url: &str) -> Result<Self, GithubError> {
        let invalid = |reason: String| GithubError::InvalidApiUrl {
            url: api_url.to_string(),
            reason,
        };
        let api_url = Url::parse(api_url).map_err(|e| invalid(e.to_string()))?;
        if api_url.cannot_be_a_base() {
            return Err(invalid("URL cannot take a path".to_string()));
        }

        let http = reqwest::Client::builder()
            .user_agent(CLIENT_USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            api_url,
            target,
        })
    }

    /// Creates `path` on the target branch with the given contents.
    #[instrument(
        skip(self, contents),
        fields(owner = %self.target.owner, repo = %self.target.repo, branch = %self.target.branch)
    )]
    pub async fn create_file(
        &self,
        path: &str,
        message: &str,
        contents: &str,
    ) -> Result<(), GithubError> {
        let url = self.contents_url(path)?;
        let body = CreateFileRequest {
            message: message.to_string(),
            content: STANDARD.encode(contents),
            branch: self.target.branch.as_str(),
        };

        let response = self
            .http
            .put(url)
            .header(AUTHORIZATION, format!("Bearer {}", self.target.token.expose()))
            .header(ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            debug!(status = status.as_u16(), "File created");
            return Ok(());
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&text)
            .map(|body| body.message)
            .unwrap_or(text);
        Err(GithubError::Status {
            status: status.as_u16(),
            message,
        })
    }

    fn contents_url(&self, path: &str) -> Result<Url, GithubError> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|()| GithubError::InvalidApiUrl {
                url: self.api_url.to_string(),
                reason: "URL cannot take a path".to_string(),
            })?
            .pop_if_empty()
            .extend([
                "repos",
                self.target.owner.as_str(),
                self.target.repo.as_str(),
                "contents",
            ])
            .extend(path.split('/'));
        Ok(url)
    }
}

#[async_trait]
impl SponsorCommitter for GithubContentsClient {
    async fn commit_sponsor(
        &self,
        guid: &SponsorGuid,
        login: &SponsorLogin,
    ) -> Result<(), SinkError> {
        let contents = sponsor_file_contents(guid, login)?;
        self.create_file(
            &sponsor_file_path(guid),
            &format!("Add sponsor {login}"),
            &contents,
        )
        .await?;
        Ok(())
    }
}
