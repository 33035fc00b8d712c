//! peergate: WireGuard VPN gateway peer provisioner
//!
//! This library orchestrates peer provisioning for a WireGuard gateway:
//! rendering config text, validating peer addresses against the gateway's
//! address pool, and sequencing the external `wg`, `wg-quick` and `iptables`
//! tools. It performs no cryptography or packet processing itself; those are
//! delegated to the external binaries through a narrow bridge.
//!
//! # Modules
//!
//! - `config`: environment-driven settings, read once at process entry
//! - `wireguard`: address pool, key material, config-text rendering
//! - `tools`: the external tool bridge and the firewall rule plan
//! - `server`: authenticated HTTP management facade
//! - `bootstrap`: linear startup sequence for the `server` command
//! - `error`: error types and handling

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod server;
pub mod tools;
pub mod wireguard;

// Re-export commonly used types
pub use error::{GatewayError, Result};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
