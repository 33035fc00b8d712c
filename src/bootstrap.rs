//! Bootstrap sequencer
//!
//! Linear startup sequence for the `server` command: ensure the base config
//! and server keys exist (generating them on first run), bring the interface
//! up, apply the firewall plan, then hand off to the HTTP facade. There are
//! no retries; interface bring-up failure aborts the process, firewall rule
//! failures do not.

use crate::config::Settings;
use crate::error::{GatewayError, Result};
use crate::tools::{firewall, write_secret_file, ToolBridge};
use crate::wireguard::render;
use std::fs;
use std::process::Command;
use tracing::{info, warn};

/// Verify the environment before touching anything.
///
/// `wg` and `wg-quick` are required; nothing downstream can work without
/// them. A missing `iptables` only costs the firewall plan, which is
/// best-effort anyway, so it warns. Same for not running as root.
pub fn preflight() -> Result<()> {
    for tool in ["wg", "wg-quick"] {
        if !tool_on_path(tool) {
            return Err(GatewayError::ExternalTool(format!(
                "Required command not found: {}",
                tool
            )));
        }
    }

    if !tool_on_path("iptables") {
        warn!("iptables not found; firewall rules will not be applied");
    }

    #[cfg(unix)]
    {
        let euid = unsafe { libc::geteuid() };
        if euid != 0 {
            warn!("Not running as root; interface and firewall setup will likely fail");
        }
    }

    Ok(())
}

/// Run the bootstrap sequence up to (but not including) serving HTTP
pub fn run(settings: &Settings, bridge: &dyn ToolBridge) -> Result<()> {
    info!("Initializing WireGuard server");

    initialize_config(settings, bridge)?;

    // Fatal: nothing else is meaningful without the tunnel active
    info!("Bringing up interface {}", settings.interface);
    bridge.interface_up()?;

    match bridge.interface_status() {
        Ok(status) => info!("WireGuard status:\n{}", status.trim_end()),
        Err(e) => warn!("Could not read interface status: {}", e),
    }

    firewall::apply_rules(bridge, settings);

    Ok(())
}

/// Ensure the interface document and server key files exist, generating them
/// on first run. An existing document is left untouched, keys included.
fn initialize_config(settings: &Settings, bridge: &dyn ToolBridge) -> Result<()> {
    let config_path = settings.config_path();

    if config_path.exists() {
        info!("WireGuard configuration already exists at {}", config_path.display());
        return Ok(());
    }

    fs::create_dir_all(&settings.config_dir)?;

    let private_key_path = settings.private_key_path();
    let public_key_path = settings.public_key_path();

    if !private_key_path.exists() || !public_key_path.exists() {
        info!("Generating WireGuard server keys");
        let (private_key, public_key) = bridge.generate_keypair()?;
        write_secret_file(&private_key_path, &private_key)?;
        fs::write(&public_key_path, &public_key)?;
        info!("Server keys generated");
    }

    let private_key = fs::read_to_string(&private_key_path)?.trim().to_string();
    let base_config = render::base_interface_config(
        settings.pool.gateway(),
        settings.pool.prefix_len(),
        settings.wg_port,
        &private_key,
    );

    write_secret_file(&config_path, &base_config)?;
    info!("Default WireGuard configuration created at {}", config_path.display());

    Ok(())
}

fn tool_on_path(tool: &str) -> bool {
    Command::new("which")
        .arg(tool)
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}
