//! HTTP management facade
//!
//! A thin authenticated HTTP surface over the interface config file and the
//! external tool bridge. Every route under `/api` requires the shared
//! `x-api-key` secret; the root path serves unauthenticated liveness text.

mod routes;

pub use routes::{
    ConfigResponse, PeerConfigResponse, ServerInfoResponse, UpdateConfigRequest,
    UpdateConfigResponse,
};

use crate::config::Settings;
use crate::error::GatewayError;
use crate::tools::ToolBridge;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;

/// Shared state for all request handlers
#[derive(Clone)]
pub struct AppState {
    /// Process configuration
    pub settings: Arc<Settings>,
    /// External tool bridge (swapped for a fake in tests)
    pub bridge: Arc<dyn ToolBridge>,
}

impl AppState {
    /// Create handler state from settings and a bridge
    pub fn new(settings: Arc<Settings>, bridge: Arc<dyn ToolBridge>) -> Self {
        Self { settings, bridge }
    }
}

/// Build the full route tree
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/config", get(routes::get_config).put(routes::put_config))
        .route("/stats", get(routes::stats))
        .route("/serverInfo", get(routes::server_info))
        .route("/generatePeerConfig", get(routes::generate_peer_config))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_api_key,
        ));

    Router::new()
        .route("/", get(routes::index))
        .nest("/api", api)
        .with_state(state)
}

/// Reject any request whose `x-api-key` header does not match the configured
/// secret, before handler logic runs. The response never reveals the
/// expected value.
async fn require_api_key(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let provided = request
        .headers()
        .get("x-api-key")
        .and_then(|value| value.to_str().ok());

    match (state.settings.api_key.as_deref(), provided) {
        (Some(expected), Some(given)) if given == expected => next.run(request).await,
        _ => GatewayError::Unauthorized.into_response(),
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = match self {
            GatewayError::Validation(_) => StatusCode::BAD_REQUEST,
            GatewayError::Unauthorized => StatusCode::UNAUTHORIZED,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
