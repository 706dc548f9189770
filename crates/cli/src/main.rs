//! Sponsor webhook entry point.
//!
//! This binary is the composition root for the entire system. Responsibilities:
//!
//! 1. **Parse configuration**: flags and environment variables via [`config::Args`].
//! 2. **Wire observability**: a JSON `tracing-subscriber` layer plus an
//!    optional OpenTelemetry OTLP exporter. Spans and structured events from
//!    every crate in the workspace flow through it.
//! 3. **Construct infrastructure**: the table store and repository sinks, or
//!    [`pipeline::DisabledSink`] where a sink is not configured, injected into
//!    the [`pipeline::WebhookOrchestrator`].
//! 4. **Serve**: run the `listener` router until SIGINT or SIGTERM.

mod config;
mod telemetry;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use github::GithubContentsClient;
use pipeline::{DisabledSink, SponsorCommitter, SponsorStore, WebhookConfig, WebhookOrchestrator};
use table_storage::TableStorageClient;
use tracing::{info, warn};

use crate::config::Args;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let tracer_provider = telemetry::init_tracing(args.otlp_endpoint(), &args.service_name);

    let result = run(&args).await;

    telemetry::shutdown_tracing(tracer_provider);
    result
}

async fn run(args: &Args) -> anyhow::Result<()> {
    let config = args.webhook_config();
    let orchestrator = build_orchestrator(config, &args.github_api_url)?;

    listener::serve(args.listen_addr(), listener::router(Arc::new(orchestrator)))
        .await
        .context("sponsor webhook server failed")
}

fn build_orchestrator(
    config: WebhookConfig,
    github_api_url: &str,
) -> anyhow::Result<WebhookOrchestrator> {
    if config.secret.is_none() {
        warn!("No webhook secret configured; signatures will not be verified");
    }

    let store: Arc<dyn SponsorStore> = match &config.persistence {
        Some(target) => {
            let client = TableStorageClient::from_target(target)
                .context("invalid table storage configuration")?;
            info!(table = %target.table, "Table persistence enabled");
            Arc::new(client)
        }
        None => {
            info!("Table persistence disabled");
            Arc::new(DisabledSink)
        }
    };

    let committer: Arc<dyn SponsorCommitter> = match config.commit {
        Some(target) => {
            let (owner, repo, branch) = (
                target.owner.clone(),
                target.repo.clone(),
                target.branch.clone(),
            );
            let client = GithubContentsClient::with_api_url(target, github_api_url)
                .context("invalid GitHub configuration")?;
            info!(%owner, %repo, %branch, "Repository commit enabled");
            Arc::new(client)
        }
        None => {
            info!("Repository commit disabled");
            Arc::new(DisabledSink)
        }
    };

    Ok(WebhookOrchestrator::with_sinks(config.secret, store, committer))
}
