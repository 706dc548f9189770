//! Command-line and environment configuration.
//!
//! Every setting can be given as a flag or through the environment variable
//! the Azure Functions deployment sets. Empty values count as absent.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use clap::Parser;
use pipeline::{
    AccessToken, BranchName, CommitTarget, ConnectionString, PersistenceTarget, TableName,
    WebhookConfig, WebhookSecret, DEFAULT_BRANCH, DEFAULT_TABLE_NAME,
};
use tracing::warn;

/// GitHub Sponsors webhook receiver.
#[derive(Debug, Clone, Parser)]
#[command(name = "sponsor-webhook", version, about)]
pub struct Args {
    /// Shared secret used to verify `X-Hub-Signature-256`. Unset disables verification.
    #[arg(long, env = "GITHUB_WEBHOOK_SECRET", hide_env_values = true)]
    pub webhook_secret: Option<String>,

    /// Azure Table Storage connection string. Unset disables persistence.
    #[arg(long, env = "TABLE_CONNECTION", hide_env_values = true)]
    pub table_connection: Option<String>,

    /// Table that receives sponsor records.
    #[arg(long, env = "SPONSOR_TABLE_NAME", default_value = DEFAULT_TABLE_NAME)]
    pub table_name: String,

    /// Token with contents write access. Unset disables the repository commit.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Repository that receives sponsor files, as `owner/name`.
    #[arg(long, env = "GITHUB_REPO")]
    pub github_repo: Option<String>,

    /// Branch that receives sponsor files.
    #[arg(long, env = "GITHUB_BRANCH", default_value = DEFAULT_BRANCH)]
    pub github_branch: String,

    /// GitHub REST API base URL.
    #[arg(long, env = "GITHUB_API_URL", default_value = github::DEFAULT_API_URL)]
    pub github_api_url: String,

    /// Address to listen on.
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    /// Port to listen on.
    #[arg(long, env = "FUNCTIONS_CUSTOMHANDLER_PORT", default_value_t = 8080)]
    pub port: u16,

    /// OTLP gRPC endpoint for span export. Unset disables OpenTelemetry.
    #[arg(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,

    /// Service name reported to OpenTelemetry.
    #[arg(long, env = "OTEL_SERVICE_NAME", default_value = "sponsor-webhook")]
    pub service_name: String,
}

impl Args {
    /// The socket address to bind.
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// The OTLP endpoint, if one was given.
    pub fn otlp_endpoint(&self) -> Option<&str> {
        self.otlp_endpoint.as_deref().filter(|e| !e.is_empty())
    }

    /// Builds the pipeline configuration.
    ///
    /// A commit target needs both a token and a repository; a repository that
    /// is not `owner/name` is logged and leaves the commit step disabled.
    pub fn webhook_config(&self) -> WebhookConfig {
        let secret = self.webhook_secret.clone().and_then(WebhookSecret::new);

        let persistence = self
            .table_connection
            .clone()
            .and_then(ConnectionString::new)
            .zip(TableName::new(or_default(&self.table_name, DEFAULT_TABLE_NAME)))
            .map(|(conn, table)| PersistenceTarget::new(conn, table));

        let token = self.github_token.clone().and_then(AccessToken::new);
        let repo = self.github_repo.as_deref().filter(|r| !r.is_empty());
        let branch = BranchName::new(or_default(&self.github_branch, DEFAULT_BRANCH));
        let commit = match (token, repo, branch) {
            (Some(token), Some(slug), Some(branch)) => {
                match CommitTarget::from_slug(token, slug, branch) {
                    Ok(target) => Some(target),
                    Err(e) => {
                        warn!(error = %e, "Repository commit disabled");
                        None
                    }
                }
            }
            _ => None,
        };

        WebhookConfig {
            secret,
            persistence,
            commit,
        }
    }
}

fn or_default<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.is_empty() {
        default
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> Args {
        Args {
            webhook_secret: None,
            table_connection: None,
            table_name: DEFAULT_TABLE_NAME.to_string(),
            github_token: None,
            github_repo: None,
            github_branch: DEFAULT_BRANCH.to_string(),
            github_api_url: github::DEFAULT_API_URL.to_string(),
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8080,
            otlp_endpoint: None,
            service_name: "sponsor-webhook".to_string(),
        }
    }

    #[test]
    fn nothing_configured_disables_every_step() {
        assert_eq!(args().webhook_config(), WebhookConfig::default());
    }

    #[test]
    fn empty_values_count_as_absent() {
        let args = Args {
            webhook_secret: Some(String::new()),
            table_connection: Some(String::new()),
            github_token: Some(String::new()),
            github_repo: Some("octo-org/credits".to_string()),
            otlp_endpoint: Some(String::new()),
            ..args()
        };

        assert_eq!(args.webhook_config(), WebhookConfig::default());
        assert_eq!(args.otlp_endpoint(), None);
    }

    #[test]
    fn full_configuration_enables_every_step() {
        let args = Args {
            webhook_secret: Some("s3cr3t".to_string()),
            table_connection: Some("UseDevelopmentStorage=true".to_string()),
            table_name: "Backers".to_string(),
            github_token: Some("ghp_test".to_string()),
            github_repo: Some("octo-org/credits".to_string()),
            github_branch: "sponsors".to_string(),
            ..args()
        };

        let config = args.webhook_config();

        assert_eq!(config.secret.unwrap().expose(), "s3cr3t");
        assert_eq!(config.persistence.unwrap().table.as_str(), "Backers");
        let commit = config.commit.unwrap();
        assert_eq!(commit.owner.as_str(), "octo-org");
        assert_eq!(commit.repo.as_str(), "credits");
        assert_eq!(commit.branch.as_str(), "sponsors");
    }

    #[test]
    fn empty_table_and_branch_fall_back_to_defaults() {
        let args = Args {
            table_connection: Some("UseDevelopmentStorage=true".to_string()),
            table_name: String::new(),
            github_token: Some("ghp_test".to_string()),
            github_repo: Some("octo-org/credits".to_string()),
            github_branch: String::new(),
            ..args()
        };

        let config = args.webhook_config();

        assert_eq!(config.persistence.unwrap().table.as_str(), DEFAULT_TABLE_NAME);
        assert_eq!(config.commit.unwrap().branch.as_str(), DEFAULT_BRANCH);
    }

    #[test]
    fn malformed_repository_disables_commit_only() {
        let args = Args {
            table_connection: Some("UseDevelopmentStorage=true".to_string()),
            github_token: Some("ghp_test".to_string()),
            github_repo: Some("credits".to_string()),
            ..args()
        };

        let config = args.webhook_config();

        assert!(config.persistence.is_some());
        assert!(config.commit.is_none());
    }

    #[test]
    fn repository_without_token_disables_commit() {
        let args = Args {
            github_repo: Some("octo-org/credits".to_string()),
            ..args()
        };

        assert!(args.webhook_config().commit.is_none());
    }

    #[test]
    fn listen_address_combines_host_and_port() {
        let args = Args {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 7071,
            ..args()
        };

        assert_eq!(args.listen_addr().to_string(), "127.0.0.1:7071");
    }

    #[test]
    fn parses_flags() {
        let args = Args::try_parse_from([
            "sponsor-webhook",
            "--webhook-secret",
            "s3cr3t",
            "--github-repo",
            "octo-org/credits",
            "--port",
            "9000",
        ])
        .unwrap();

        assert_eq!(args.webhook_secret.as_deref(), Some("s3cr3t"));
        assert_eq!(args.github_repo.as_deref(), Some("octo-org/credits"));
        assert_eq!(args.port, 9000);
    }
}
