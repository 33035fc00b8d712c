//! Peer and interface config rendering
//!
//! Pure string templating of WireGuard configuration stanzas. No validation
//! happens here; callers validate addresses and names first.

use crate::wireguard::PeerKeyMaterial;
use cidr::Ipv4Cidr;
use std::net::Ipv4Addr;

/// Keepalive interval written into client configs, chosen to keep NAT
/// mappings alive
pub const PERSISTENT_KEEPALIVE_SECS: u16 = 25;

/// Render the `[Peer]` stanza appended to the server's interface document.
///
/// `AllowedIPs` is pinned to the peer's own `/32` host route, never the pool
/// range: a peer's traffic may only originate from its assigned address.
/// The name is embedded as a comment label only; uniqueness is not enforced.
/// Starts with a blank line so it can be appended verbatim to an existing
/// document.
pub fn server_peer_stanza(name: &str, address: Ipv4Addr, keys: &PeerKeyMaterial) -> String {
    format!(
        "\n[Peer]\n\
         # {}\n\
         PublicKey = {}\n\
         PresharedKey = {}\n\
         AllowedIPs = {}/32\n",
        name, keys.client_public_key, keys.preshared_key, address
    )
}

/// Render a self-contained client interface document.
///
/// `AllowedIPs` here is the range of services the client may route to
/// through the tunnel, independent of the client's own address.
pub fn client_interface_config(
    address: Ipv4Addr,
    public_host: &str,
    wg_port: u16,
    allowed_target: &Ipv4Cidr,
    keys: &PeerKeyMaterial,
) -> String {
    format!(
        "[Interface]\n\
         PrivateKey = {}\n\
         Address = {}/32\n\
         \n\
         [Peer]\n\
         PublicKey = {}\n\
         PresharedKey = {}\n\
         AllowedIPs = {}\n\
         Endpoint = {}:{}\n\
         PersistentKeepalive = {}\n",
        keys.client_private_key,
        address,
        keys.server_public_key,
        keys.preshared_key,
        allowed_target,
        public_host,
        wg_port,
        PERSISTENT_KEEPALIVE_SECS
    )
}

/// Render the gateway's minimal base interface document, written once at
/// first bootstrap before any peers exist
pub fn base_interface_config(
    gateway: Ipv4Addr,
    prefix_len: u8,
    listen_port: u16,
    private_key: &str,
) -> String {
    format!(
        "[Interface]\n\
         Address = {}/{}\n\
         ListenPort = {}\n\
         PrivateKey = {}\n",
        gateway, prefix_len, listen_port, private_key
    )
}
