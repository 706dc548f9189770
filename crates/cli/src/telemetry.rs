//! Tracing subscriber and OpenTelemetry wiring.

use opentelemetry::trace::TracerProvider as _;
use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig as _;
use opentelemetry_sdk::trace::TracerProvider;
use opentelemetry_sdk::{runtime, Resource};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or invalid.
const DEFAULT_FILTER: &str = "info,pipeline=debug,listener=debug";

/// Installs the global JSON tracing subscriber.
///
/// With an `otlp_endpoint`, spans are also exported over OTLP/gRPC and the
/// returned provider must be shut down on exit to flush them. If the exporter
/// cannot be built, a warning is printed and tracing continues without it.
pub fn init_tracing(otlp_endpoint: Option<&str>, service_name: &str) -> Option<TracerProvider> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let fmt_layer = tracing_subscriber::fmt::layer().json();

    let provider = otlp_endpoint.and_then(|endpoint| {
        match build_provider(endpoint, service_name) {
            Ok(provider) => Some(provider),
            Err(e) => {
                eprintln!(
                    "WARNING: failed to create OTLP exporter for {endpoint}: {e}; \
                     starting without OpenTelemetry"
                );
                None
            }
        }
    });

    let otel_layer = provider.as_ref().map(|provider| {
        tracing_opentelemetry::layer().with_tracer(provider.tracer("sponsor-webhook"))
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(otel_layer)
        .init();

    provider
}

fn build_provider(
    endpoint: &str,
    service_name: &str,
) -> Result<TracerProvider, opentelemetry::trace::TraceError> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()?;

    let resource = Resource::new(vec![KeyValue::new("service.name", service_name.to_string())]);

    Ok(TracerProvider::builder()
        .with_batch_exporter(exporter, runtime::Tokio)
        .with_resource(resource)
        .build())
}

/// Flushes and shuts down the OpenTelemetry provider, if any.
pub fn shutdown_tracing(provider: Option<TracerProvider>) {
    if let Some(provider) = provider {
        if let Err(e) = provider.shutdown() {
            tracing::warn!(error = %e, "OpenTelemetry shutdown failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // The batch processor's shutdown blocks on its worker task, which needs a
    // second runtime thread.
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn provider_builds_and_shuts_down() {
        let provider = build_provider("http://127.0.0.1:4317", "sponsor-webhook").unwrap();
        let _tracer = provider.tracer("sponsor-webhook");

        shutdown_tracing(Some(provider));
    }

    #[test]
    fn malformed_endpoint_is_an_error() {
        assert!(build_provider("not a uri", "sponsor-webhook").is_err());
    }
}
