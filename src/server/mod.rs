//! HTTP surface: the upload form, the metadata endpoint and the file download endpoint.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::materialize::Materializer;
use crate::resolver::Resolver;

mod error;
mod handlers;

pub use error::ApiError;

/// Shortest `url` query value accepted
pub const MIN_URL_LENGTH: usize = 10;

#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<Resolver>,
    pub materializer: Arc<Materializer>,
}

impl AppState {
    pub fn new(resolver: Resolver, materializer: Materializer) -> Self {
        Self {
            resolver: Arc::new(resolver),
            materializer: Arc::new(materializer),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::home))
        .route("/api/health", get(handlers::health))
        .route("/api/tiktok", get(handlers::tiktok_info))
        .route("/api/tiktok/download", get(handlers::tiktok_download))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::very_permissive())
}

/// Serve until ctrl-c
pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
    }
}
