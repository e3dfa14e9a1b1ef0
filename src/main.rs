//! market-gateway server entry point.
//!
//! Loads configuration, prepares the database and serves the REST API.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::http::{HeaderValue, Method, StatusCode, header};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use market_gateway::ai::{GeminiClient, TextGenerator};
use market_gateway::api;
use market_gateway::app_state::AppState;
use market_gateway::config::MarketConfig;
use market_gateway::domain::RateLimiter;
use market_gateway::persistence::{self, counters, schema};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = MarketConfig::from_env().map_err(|e| anyhow::anyhow!(e))?;
    init_tracing(config.log_json);
    tracing::info!(addr = %config.listen_addr, "starting market-gateway");

    // Prepare storage
    let pool = persistence::connect(
        &config.database_url,
        config.database_max_connections,
        config.database_connect_timeout_secs,
    )
    .await
    .context("connecting to database")?;
    schema::ensure_schema(&pool)
        .await
        .context("ensuring schema")?;
    if config.sync_counters_on_startup {
        counters::sync_all(&pool)
            .await
            .context("resyncing counters")?;
    }

    // Optional AI backend
    let generator: Option<Arc<dyn TextGenerator>> = match &config.ai_api_key {
        Some(key) => {
            let client = GeminiClient::new(
                &config.ai_base_url,
                key,
                Duration::from_secs(config.ai_timeout_secs),
            )
            .context("building AI client")?;
            tracing::info!(models = ?config.ai_models, "AI backend enabled");
            Some(Arc::new(client) as Arc<dyn TextGenerator>)
        }
        None => {
            tracing::warn!("AI_API_KEY not set; AI endpoints will answer 503");
            None
        }
    };

    // Build application state
    let app_state = AppState::new(
        &pool,
        generator,
        config.ai_models.clone(),
        RateLimiter::new(config.rate_limit_max_requests, config.rate_limit_window()),
    );

    // Build router
    let app = api::build_router(app_state)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs),
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.cors_allowed_origins));

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// Allow-list CORS when origins are configured, permissive otherwise.
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::HeaderName::from_static("x-user-id"),
        ])
}
