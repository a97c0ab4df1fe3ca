//! HTTP service surface
//!
//! Both wire variants are served from one router over one set of
//! coordinators: REST under `/mcp/tools/*`, tool invocation as JSON-RPC on
//! `POST /mcp`.

mod mcp;
mod rest;

use crate::broker::{KeyBroker, KeyBrokerClient};
use crate::config::Config;
use crate::coordinator::{RetrievalCoordinator, UploadCoordinator};
use crate::error::{Error, Result};
use crate::protocol::{Coordinators, ProtocolAdapter, RestVariant, ToolVariant};
use crate::storage::{BlobStore, StorageGateway};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Service name reported by the liveness endpoint
pub const SERVICE_NAME: &str = "NOVA MCP Server - BlindFold";

/// Shared application state passed to all handlers via axum State extractor.
#[derive(Clone)]
pub struct AppState {
    pub tool: ProtocolAdapter<ToolVariant>,
    pub rest: ProtocolAdapter<RestVariant>,
}

impl AppState {
    pub fn new(broker: Arc<dyn KeyBroker>, store: Arc<dyn BlobStore>) -> Self {
        let coordinators = Coordinators {
            uploads: UploadCoordinator::new(broker.clone(), store.clone()),
            retrievals: RetrievalCoordinator::new(broker, store),
        };

        AppState {
            tool: ProtocolAdapter::new(coordinators.clone()),
            rest: ProtocolAdapter::new(coordinators),
        }
    }

    /// Wire the real broker and storage clients from configuration
    pub fn from_config(config: &Config) -> Self {
        let broker: Arc<dyn KeyBroker> = Arc::new(KeyBrokerClient::new(&config.broker));
        let store: Arc<dyn BlobStore> = Arc::new(StorageGateway::new(&config.storage));
        Self::new(broker, store)
    }
}

/// Opaque server error carrying the original message
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "detail": self.to_string() })),
        )
            .into_response()
    }
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "service": SERVICE_NAME }))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy" }))
}

/// Build the full axum Router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/mcp", post(mcp::handle))
        .route("/mcp/tools/register_group", post(rest::register_group))
        .route("/mcp/tools/prepare_upload", post(rest::prepare_upload))
        .route("/mcp/tools/finalize_upload", post(rest::finalize_upload))
        .route("/mcp/api/finalize-upload", post(rest::finalize_upload))
        .route("/mcp/tools/prepare_retrieve", post(rest::prepare_retrieve))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until the process is stopped
pub async fn serve(config: &Config) -> Result<()> {
    let addr = config.server.socket_addr()?;
    let app = build_router(AppState::from_config(config));

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Internal(format!("Failed to bind {}: {}", addr, e)))?;

    info!("Starting server on {}", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| Error::Internal(format!("Server error: {}", e)))
}
