//! Peer address pool
//!
//! The pool is the CIDR range peer addresses are assigned from, with one
//! address inside it reserved for the gateway's own interface. Validation is
//! a pure function over those two values: no I/O, no network state.

use crate::error::{GatewayError, Result};
use cidr::Ipv4Cidr;
use std::net::Ipv4Addr;

/// Address pool with a reserved gateway address
#[derive(Debug, Clone)]
pub struct AddressPool {
    cidr: Ipv4Cidr,
    gateway: Ipv4Addr,
}

impl AddressPool {
    /// Create a pool; the gateway address must lie inside the CIDR range
    pub fn new(cidr: Ipv4Cidr, gateway: Ipv4Addr) -> Result<Self> {
        if !cidr.contains(&gateway) {
            return Err(GatewayError::Config(format!(
                "Gateway address {} is outside the pool {}",
                gateway, cidr
            )));
        }
        Ok(Self { cidr, gateway })
    }

    /// The pool's CIDR range
    pub fn cidr(&self) -> &Ipv4Cidr {
        &self.cidr
    }

    /// The reserved gateway address
    pub fn gateway(&self) -> Ipv4Addr {
        self.gateway
    }

    /// Prefix length of the pool, used for the gateway's own address line
    pub fn prefix_len(&self) -> u8 {
        self.cidr.network_length()
    }

    /// Validate a candidate peer address.
    ///
    /// The candidate must parse as IPv4, fall inside the pool range, and not
    /// equal the reserved gateway address.
    pub fn validate_peer_address(&self, candidate: &str) -> Result<Ipv4Addr> {
        let address: Ipv4Addr = candidate.trim().parse().map_err(|_| {
            GatewayError::Validation(format!("'{}' is not a valid IPv4 address", candidate))
        })?;

        if !self.cidr.contains(&address) {
            return Err(GatewayError::Validation(format!(
                "IP must be in {} range",
                self.cidr
            )));
        }

        if address == self.gateway {
            return Err(GatewayError::Validation(format!(
                "{} is reserved for the WireGuard server",
                self.gateway
            )));
        }

        Ok(address)
    }
}
