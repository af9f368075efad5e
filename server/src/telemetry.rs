//! Logging setup: console output always, OTLP export when a collector is reachable.

use anyhow::Context;
use opentelemetry::trace::TracerProvider;
use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::logs::SdkLoggerProvider;
use opentelemetry_sdk::trace::{SdkTracerProvider, Tracer};
use std::env;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const DEFAULT_SERVICE_NAME: &str = "ladle-server";
const PROBE_TIMEOUT: Duration = Duration::from_millis(100);

/// Install the global subscriber.
///
/// `RUST_LOG` controls filtering (default `info`). If `OTEL_EXPORTER_OTLP_ENDPOINT` is set
/// and answers a TCP probe, spans and log events are also exported over OTLP/gRPC.
pub fn init_telemetry() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer());

    let endpoint = env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
        .ok()
        .filter(|e| !e.trim().is_empty());

    match endpoint {
        Some(endpoint) if collector_reachable(&endpoint) => {
            let service_name = env::var("OTEL_SERVICE_NAME")
                .unwrap_or_else(|_| DEFAULT_SERVICE_NAME.to_string());
            let (tracer, log_provider) = otlp_pipeline(&endpoint, &service_name)?;

            registry
                .with(tracing_opentelemetry::layer().with_tracer(tracer))
                .with(OpenTelemetryTracingBridge::new(&log_provider))
                .try_init()
                .context("Failed to install tracing subscriber")?;

            tracing::info!(endpoint, service_name, "OpenTelemetry export enabled");
        }
        Some(endpoint) => {
            registry
                .try_init()
                .context("Failed to install tracing subscriber")?;
            tracing::info!(endpoint, "OTLP endpoint not reachable, using console logging only");
        }
        None => {
            registry
                .try_init()
                .context("Failed to install tracing subscriber")?;
            tracing::debug!("OTEL_EXPORTER_OTLP_ENDPOINT not set, using console logging only");
        }
    }

    Ok(())
}

/// Quick TCP check so startup doesn't stall on an absent collector.
fn collector_reachable(endpoint: &str) -> bool {
    let host_port = endpoint
        .trim_start_matches("http://")
        .trim_start_matches("https://")
        .trim_end_matches('/');

    host_port
        .to_socket_addrs()
        .ok()
        .and_then(|mut addrs| addrs.next())
        .is_some_and(|addr| TcpStream::connect_timeout(&addr, PROBE_TIMEOUT).is_ok())
}

fn otlp_pipeline(endpoint: &str, service_name: &str) -> anyhow::Result<(Tracer, SdkLoggerProvider)> {
    let resource = opentelemetry_sdk::Resource::builder()
        .with_service_name(service_name.to_string())
        .build();

    let span_exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
        .context("Failed to create OTLP trace exporter")?;
    let trace_provider = SdkTracerProvider::builder()
        .with_batch_exporter(span_exporter)
        .with_resource(resource.clone())
        .build();
    let tracer = trace_provider.tracer(DEFAULT_SERVICE_NAME);
    opentelemetry::global::set_tracer_provider(trace_provider);

    let log_exporter = opentelemetry_otlp::LogExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
        .context("Failed to create OTLP log exporter")?;
    let log_provider = SdkLoggerProvider::builder()
        .with_batch_exporter(log_exporter)
        .with_resource(resource)
        .build();

    Ok((tracer, log_provider))
}
