//! Error types for peergate
//!
//! This module defines the error types used throughout the application.
//! We use `thiserror` for ergonomic error definitions and `anyhow` for
//! error propagation in the binary's entry point.

use thiserror::Error;

/// Main error type for peergate operations
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Configuration-related errors (bad environment values)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input validation errors (bad or reserved peer address, missing input)
    #[error("Validation error: {0}")]
    Validation(String),

    /// An external binary (`wg`, `wg-quick`, `iptables`) failed or produced
    /// unexpected output; carries the tool's error text
    #[error("External tool error: {0}")]
    ExternalTool(String),

    /// Expected file missing; usually means the server has not been
    /// bootstrapped yet
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing or incorrect API key
    #[error("Unauthorized")]
    Unauthorized,

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using GatewayError
pub type Result<T> = std::result::Result<T, GatewayError>;
