//! Compras API Gateway
//!
//! The HTTP entry point for procurement questions.
//! Handles:
//! - The question endpoint and its CORS contract
//! - Request routing
//! - Observability (logging, metrics, request IDs)

mod handlers;

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use axum::http::{header, Method};
use compras_common::{
    config::AppConfig,
    context::{AnthropicSynthesizer, ContextEngine},
    metrics,
    rows::CsvRowStore,
};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub engine: Arc<ContextEngine>,
    pub metrics: Option<PrometheusHandle>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;

    // Initialize tracing
    init_tracing(&config);

    info!(
        service = %config.observability.service_name,
        "Starting Compras API Gateway v{}",
        compras_common::VERSION
    );

    // Initialize metrics
    let metrics_handle = if config.observability.metrics_enabled {
        let handle = install_metrics_recorder()?;
        metrics::register_metrics();
        Some(handle)
    } else {
        None
    };

    // Wire the context engine
    let store = CsvRowStore::from_config(&config.store)?;
    info!(path = %store.path().display(), mode = ?config.search.mode, "Spreadsheet configured");

    let synthesizer = AnthropicSynthesizer::new(config.answer.clone())?;
    let engine = ContextEngine::new(Arc::new(store), Arc::new(synthesizer), &config.search);

    let config = Arc::new(config);

    // Create app state
    let state = AppState {
        config: config.clone(),
        engine: Arc::new(engine),
        metrics: metrics_handle,
    };

    // Build the router
    let app = create_router(state);

    // Start the server
    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .with_context(|| format!("Invalid bind address {}", config.bind_address()))?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.observability.log_level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if config.observability.json_logging {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

fn install_metrics_recorder() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(format!("{}_question_duration_seconds", metrics::METRICS_PREFIX)),
            metrics::QUESTION_BUCKETS,
        )?
        .install_recorder()?;

    Ok(handle)
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    Router::new()
        // Question endpoint
        .route("/api/chat", post(handlers::chat::chat))

        // Health endpoints
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        .route("/metrics", get(handlers::health::metrics))

        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(propagate_id)
        .layer(request_id)
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use compras_common::context::AnswerService;
    use compras_common::rows::{MemoryRowStore, Row, RowStore};

    /// State over in-memory rows and the given answer service
    pub fn state_with(store: Arc<dyn RowStore>, answerer: Arc<dyn AnswerService>) -> AppState {
        let config = AppConfig::default();
        let engine = ContextEngine::new(store, answerer, &config.search);

        AppState {
            config: Arc::new(config),
            engine: Arc::new(engine),
            metrics: None,
        }
    }

    pub fn router_with(answerer: Arc<dyn AnswerService>) -> Router {
        let rows = vec![Row {
            description: "Cimento CP-II 50kg".to_string(),
            days_remaining: "30".to_string(),
            percent_used: "10".to_string(),
            ..Default::default()
        }];

        create_router(state_with(Arc::new(MemoryRowStore::new(rows)), answerer))
    }
}
