//! Request handlers and wire types for the management API
//!
//! Wire field names are camelCase to match the operator tooling that already
//! speaks this API.

use crate::error::{GatewayError, Result};
use crate::server::AppState;
use crate::tools::write_secret_file;
use crate::wireguard::{render, PeerKeyMaterial};
use crate::{APP_NAME, VERSION};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fs;
use tracing::{info, warn};

/// Response for `GET /api/config`
#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigResponse {
    /// Raw interface configuration document
    pub config: String,
}

/// Body for `PUT /api/config`
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateConfigRequest {
    /// Full replacement document
    pub config: String,
}

/// Response for `PUT /api/config`
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateConfigResponse {
    /// Whether the update was applied
    pub success: bool,
    /// Human-readable outcome
    pub message: String,
}

/// Response for `GET /api/serverInfo`
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerInfoResponse {
    /// Server's public key
    pub public_key: String,
    /// Public endpoint clients connect to (`host:port`)
    pub endpoint: String,
}

/// Query parameters for `GET /api/generatePeerConfig`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerConfigQuery {
    /// Requested peer address, must lie in the pool
    pub ip: Option<String>,
    /// Label embedded in the server stanza
    pub client_name: Option<String>,
    /// Optional override for the public endpoint host
    pub public_host: Option<String>,
}

/// Response for `GET /api/generatePeerConfig`
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerConfigResponse {
    /// Stanza the operator appends to the server's document
    pub server_config: String,
    /// Self-contained config handed to the client
    pub client_config: String,
}

/// Unauthenticated liveness text
pub async fn index() -> impl IntoResponse {
    format!("{} v{}", APP_NAME, VERSION)
}

/// Return the raw interface configuration document
pub async fn get_config(State(state): State<AppState>) -> Result<Json<ConfigResponse>> {
    let path = state.settings.config_path();
    if !path.exists() {
        return Err(GatewayError::NotFound(format!(
            "Interface configuration not found at {}",
            path.display()
        )));
    }

    let config = fs::read_to_string(&path)?;
    Ok(Json(ConfigResponse { config }))
}

/// Replace the interface configuration document and hot-reload it.
///
/// The write and the reload are not transactional; a reload failure after a
/// successful write leaves the on-disk document ahead of the running
/// interface, and the error says so.
pub async fn put_config(
    State(state): State<AppState>,
    Json(body): Json<UpdateConfigRequest>,
) -> Result<Json<UpdateConfigResponse>> {
    if !body.config.contains("[Interface]") {
        return Err(GatewayError::Validation(
            "Replacement config has no [Interface] section".to_string(),
        ));
    }

    // Document contains the server's private key
    write_secret_file(&state.settings.config_path(), &body.config)?;
    info!("Interface configuration replaced via API");

    if let Err(e) = state.bridge.reload_config() {
        warn!("Config written but live reload failed: {}", e);
        return Err(GatewayError::ExternalTool(format!(
            "Configuration was written but the live reload failed; on-disk and \
             running state now differ: {}",
            e
        )));
    }

    Ok(Json(UpdateConfigResponse {
        success: true,
        message: "Configuration updated".to_string(),
    }))
}

/// Live status text from the external tool, verbatim
pub async fn stats(State(state): State<AppState>) -> Result<String> {
    state.bridge.interface_status()
}

/// Server public key and endpoint
pub async fn server_info(State(state): State<AppState>) -> Result<Json<ServerInfoResponse>> {
    let public_key = state.bridge.read_server_public_key()?;
    Ok(Json(ServerInfoResponse {
        public_key,
        endpoint: state.settings.endpoint(),
    }))
}

/// Validate the requested address, generate fresh key material and render
/// both config stanzas.
///
/// The server stanza is returned, not appended: updating the persisted
/// document and reloading the interface stay manual operator steps.
pub async fn generate_peer_config(
    State(state): State<AppState>,
    Query(query): Query<PeerConfigQuery>,
) -> Result<Json<PeerConfigResponse>> {
    let ip = query
        .ip
        .ok_or_else(|| GatewayError::Validation("Missing required parameter: ip".to_string()))?;
    let client_name = query.client_name.ok_or_else(|| {
        GatewayError::Validation("Missing required parameter: clientName".to_string())
    })?;
    let public_host = query
        .public_host
        .unwrap_or_else(|| state.settings.public_host.clone());

    let address = state.settings.pool.validate_peer_address(&ip)?;

    info!("Generating peer configuration for: {}", client_name);
    let keys = PeerKeyMaterial::generate(state.bridge.as_ref())?;

    let server_config = render::server_peer_stanza(&client_name, address, &keys);
    let client_config = render::client_interface_config(
        address,
        &public_host,
        state.settings.wg_port,
        &state.settings.allowed_target,
        &keys,
    );

    Ok(Json(PeerConfigResponse {
        server_config,
        client_config,
    }))
}
