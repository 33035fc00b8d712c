//! Configuration management
//!
//! All configuration is environment-driven and read exactly once at process
//! entry into an immutable [`Settings`] value; no other component reads the
//! environment directly.

use crate::error::{GatewayError, Result};
use crate::wireguard::AddressPool;
use cidr::Ipv4Cidr;
use std::net::Ipv4Addr;
use std::path::PathBuf;

/// Immutable process configuration, constructed once at entry
#[derive(Debug, Clone)]
pub struct Settings {
    /// Directory holding the interface config and server key files
    pub config_dir: PathBuf,

    /// WireGuard interface name (e.g., "wg0")
    pub interface: String,

    /// Listen port for the HTTP management API
    pub api_port: u16,

    /// Listen port for the WireGuard interface
    pub wg_port: u16,

    /// Peer address pool and the reserved gateway address inside it
    pub pool: AddressPool,

    /// Destination range connected peers may route traffic to
    pub allowed_target: Ipv4Cidr,

    /// Public hostname clients use to reach the gateway
    pub public_host: String,

    /// Shared secret for the HTTP API; `server` refuses to start without it
    pub api_key: Option<String>,

    /// Egress interface used for NAT masquerade
    pub uplink: String,
}

impl Settings {
    /// Build settings from the process environment, applying defaults for
    /// anything unset
    pub fn from_env() -> Result<Self> {
        let config_dir = PathBuf::from(env_or("PEERGATE_CONFIG_DIR", "/etc/wireguard"));
        let interface = env_or("PEERGATE_INTERFACE", "wg0");
        let api_port = parse_port("PEERGATE_API_PORT", "22111")?;
        let wg_port = parse_port("PEERGATE_WG_PORT", "51820")?;

        let subnet = env_or("PEERGATE_SUBNET", "10.100.128.0/17");
        let cidr: Ipv4Cidr = subnet.parse().map_err(|e| {
            GatewayError::Config(format!("Invalid PEERGATE_SUBNET '{}': {}", subnet, e))
        })?;

        let server_ip = env_or("PEERGATE_SERVER_IP", "10.100.128.1");
        let gateway: Ipv4Addr = server_ip.parse().map_err(|e| {
            GatewayError::Config(format!("Invalid PEERGATE_SERVER_IP '{}': {}", server_ip, e))
        })?;

        let pool = AddressPool::new(cidr, gateway)?;

        let target = env_or("ALLOWED_TARGET_SUBNET", "10.100.0.0/24");
        let allowed_target: Ipv4Cidr = target.parse().map_err(|e| {
            GatewayError::Config(format!("Invalid ALLOWED_TARGET_SUBNET '{}': {}", target, e))
        })?;

        Ok(Self {
            config_dir,
            interface,
            api_port,
            wg_port,
            pool,
            allowed_target,
            public_host: env_or("PUBLIC_HOST", "vpn.example.com"),
            api_key: std::env::var("API_KEY").ok().filter(|k| !k.is_empty()),
            uplink: env_or("PEERGATE_UPLINK", "eth0"),
        })
    }

    /// Path to the interface configuration document
    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join(format!("{}.conf", self.interface))
    }

    /// Path to the server's private key file
    pub fn private_key_path(&self) -> PathBuf {
        self.config_dir.join("privatekey")
    }

    /// Path to the server's public key file
    pub fn public_key_path(&self) -> PathBuf {
        self.config_dir.join("publickey")
    }

    /// Public endpoint string (`host:port`) handed to clients
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.public_host, self.wg_port)
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_port(key: &str, default: &str) -> Result<u16> {
    let value = env_or(key, default);
    value
        .parse()
        .map_err(|e| GatewayError::Config(format!("Invalid {} '{}': {}", key, value, e)))
}
