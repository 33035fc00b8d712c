//! Peer key material
//!
//! All cryptography is delegated to the external `wg` binary; this module
//! only carries the resulting base64 strings around safely. Secret fields
//! are zeroized on drop and redacted from `Debug` output so key material
//! never leaks into logs.

use crate::error::{GatewayError, Result};
use crate::tools::ToolBridge;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Key tuple generated fresh for each peer-creation request.
///
/// Nothing in this struct is persisted by peergate; the operator records the
/// values from the rendered output.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct PeerKeyMaterial {
    /// Client's private key (secret)
    pub client_private_key: String,
    /// Client's public key
    pub client_public_key: String,
    /// Server's public key, read from the bootstrapped key file
    pub server_public_key: String,
    /// Pre-shared key layered onto the exchange (secret)
    pub preshared_key: String,
}

impl PeerKeyMaterial {
    /// Generate a full key tuple for a new peer: a fresh client key pair and
    /// pre-shared key from the bridge, plus the server's persisted public key
    pub fn generate(bridge: &dyn ToolBridge) -> Result<Self> {
        let (client_private_key, client_public_key) = bridge.generate_keypair()?;
        let server_public_key = bridge.read_server_public_key()?;
        let preshared_key = bridge.generate_preshared_key()?;

        Ok(Self {
            client_private_key,
            client_public_key,
            server_public_key,
            preshared_key,
        })
    }
}

impl fmt::Debug for PeerKeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeerKeyMaterial")
            .field("client_private_key", &"[REDACTED]")
            .field("client_public_key", &self.client_public_key)
            .field("server_public_key", &self.server_public_key)
            .field("preshared_key", &"[REDACTED]")
            .finish()
    }
}

/// Sanity-check that a string produced by the external tool looks like a
/// WireGuard key: base64 decoding to exactly 32 bytes
pub fn validate_key_encoding(key: &str) -> Result<()> {
    let decoded = BASE64
        .decode(key.trim())
        .map_err(|e| GatewayError::ExternalTool(format!("Tool produced invalid key: {}", e)))?;

    if decoded.len() != 32 {
        return Err(GatewayError::ExternalTool(format!(
            "Tool produced invalid key length: expected 32 bytes, got {}",
            decoded.len()
        )));
    }

    Ok(())
}
