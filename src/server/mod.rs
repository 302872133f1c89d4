pub mod handlers;
pub mod jobs;
pub mod middleware;
pub mod session;

use crate::adapters::input::InputLoader;
use crate::config::server::ServerConfig;
use crate::utils::error::Result;
use axum::extract::DefaultBodyLimit;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use axum::Router;
use jobs::{JobRegistry, SharedProcessor};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub loader: Arc<InputLoader>,
    pub processor: SharedProcessor,
    pub jobs: JobRegistry,
}

impl AppState {
    pub fn new(config: ServerConfig, loader: InputLoader, processor: SharedProcessor) -> Self {
        Self {
            config: Arc::new(config),
            loader: Arc::new(loader),
            processor,
            jobs: JobRegistry::new(),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index_handler))
        .route("/health", get(handlers::health_handler))
        .route(
            "/api/process-spreadsheet",
            post(handlers::process_spreadsheet_handler),
        )
        .route("/api/status", get(handlers::status_handler))
        .route("/api/results", get(handlers::results_handler))
        .route("/api/export", get(handlers::export_handler))
        .fallback(handlers::not_found_handler)
        .layer(from_fn_with_state(
            state.clone(),
            middleware::timeout_middleware,
        ))
        .layer(from_fn(middleware::trace_middleware))
        .layer(DefaultBodyLimit::max(state.config.max_body_bytes))
        .with_state(state)
}

/// Serves until `shutdown` resolves. Starts the job cleanup task alongside.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let cleanup = state
        .jobs
        .spawn_cleanup(state.config.cleanup_interval, state.config.job_ttl);

    if let Ok(addr) = listener.local_addr() {
        tracing::info!("🌐 {} listening on http://{}", state.config.app_name, addr);
    }

    let app = build_router(state);
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await;

    cleanup.abort();
    served?;
    Ok(())
}
