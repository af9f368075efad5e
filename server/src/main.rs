mod api;
mod auth;
mod config;
mod db;
mod models;
mod schema;
mod scraping;
mod service;
mod store;
mod telemetry;
#[cfg(test)]
mod test_support;

use anyhow::Context;
use axum::extract::MatchedPath;
use axum::http::Request;
use ladle_core::{HtmlNormalizer, HttpFetcher, LlmConfig, RecipeExtractor};
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::Span;

use crate::auth::{Authenticator, TokenAuthenticator};
use crate::config::ServerConfig;
use crate::scraping::{HostAllowlist, Pipeline};
use crate::service::RecipeService;
use crate::store::RecipeStore;

/// Everything handlers need, shared behind one `Arc`.
pub struct App {
    pub recipes: RecipeService,
    pub authenticator: Arc<dyn Authenticator>,
}

/// Application state shared across all handlers
pub type AppState = Arc<App>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Check for --openapi flag to dump spec and exit
    if env::args().any(|arg| arg == "--openapi") {
        let spec = api::openapi()
            .to_pretty_json()
            .context("Failed to serialize OpenAPI document")?;
        println!("{spec}");
        return Ok(());
    }

    telemetry::init_telemetry()?;

    let config = ServerConfig::from_env().context("Invalid server configuration")?;
    let llm_config = LlmConfig::from_env().context("Invalid LLM configuration")?;

    let pool = db::create_pool(&config.database_url, config.pool_size)?;
    let store = RecipeStore::new(pool);

    let fetcher = HttpFetcher::builder()
        .build()
        .context("Failed to build HTTP client")?;
    let extractor = RecipeExtractor::from_config(&llm_config)
        .context("Failed to set up the extraction model")?;
    tracing::info!(
        provider = extractor.provider().provider_name(),
        model = extractor.provider().model_name(),
        "extraction model configured"
    );

    let pipeline = Pipeline::new(
        store.clone(),
        Arc::new(fetcher),
        Arc::new(HtmlNormalizer::from_env()),
        Arc::new(extractor),
    );
    let recipes = RecipeService::new(Arc::new(pipeline), store)
        .with_allowlist(HostAllowlist::new(config.allowed_hosts.clone()));

    let authenticator = TokenAuthenticator::new(config.api_tokens.clone());
    if authenticator.is_empty() {
        tracing::warn!("LADLE_API_TOKENS is empty, every recipe request will be rejected");
    }

    let state: AppState = Arc::new(App {
        recipes,
        authenticator: Arc::new(authenticator),
    });

    let app = api::router(state).layer(
        TraceLayer::new_for_http()
            .make_span_with(|request: &Request<_>| {
                let matched_path = request
                    .extensions()
                    .get::<MatchedPath>()
                    .map(MatchedPath::as_str)
                    .unwrap_or(request.uri().path());

                // Health checks are polled constantly
                if matched_path == "/health" {
                    tracing::trace_span!("http_request")
                } else {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %matched_path,
                    )
                }
            })
            .on_request(|_request: &Request<_>, _span: &Span| {})
            .on_response(
                |response: &axum::http::Response<_>, latency: Duration, span: &Span| {
                    if span.metadata().map(|m| m.level()) == Some(&tracing::Level::TRACE) {
                        return;
                    }
                    let status = response.status().as_u16();
                    if status >= 500 {
                        tracing::error!(
                            status,
                            latency_ms = latency.as_millis() as u64,
                            "request failed with server error"
                        );
                    } else {
                        tracing::info!(
                            status,
                            latency_ms = latency.as_millis() as u64,
                            "request completed"
                        );
                    }
                },
            )
            .on_failure(
                |error: tower_http::classify::ServerErrorsFailureClass,
                 latency: Duration,
                 _span: &Span| {
                    tracing::error!(
                        error = %error,
                        latency_ms = latency.as_millis() as u64,
                        "request failed"
                    );
                },
            ),
    );

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    let local_addr = listener.local_addr()?;

    tracing::info!("Server listening on {}", local_addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", local_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
