//! WireGuard address and configuration primitives
//!
//! This module handles the pure side of peer provisioning: the peer address
//! pool, the key-material type, and the config-text renderers. Everything
//! that touches the `wg` binary itself lives in `tools`.

mod keys;
mod pool;
pub mod render;

pub use keys::{validate_key_encoding, PeerKeyMaterial};
pub use pool::AddressPool;
