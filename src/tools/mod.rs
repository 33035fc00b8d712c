//! External tool bridge
//!
//! The only place in the codebase allowed to invoke the external `wg`,
//! `wg-quick` and `iptables` binaries. Everything else depends on the
//! [`ToolBridge`] trait, so tests can substitute a fake implementation.

pub mod firewall;

use crate::error::{GatewayError, Result};
use crate::wireguard::validate_key_encoding;
use firewall::FirewallRule;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::debug;

/// Narrow capability set over the external VPN and firewall binaries
pub trait ToolBridge: Send + Sync {
    /// Generate a fresh private/public key pair via `wg genkey` / `wg pubkey`
    fn generate_keypair(&self) -> Result<(String, String)>;

    /// Generate a pre-shared key via `wg genpsk`
    fn generate_preshared_key(&self) -> Result<String>;

    /// Read the server's persisted public key file
    fn read_server_public_key(&self) -> Result<String>;

    /// Bring the interface up via `wg-quick up`
    fn interface_up(&self) -> Result<()>;

    /// Hot-reload the on-disk config into the running interface without
    /// dropping it
    fn reload_config(&self) -> Result<()>;

    /// Live status text from `wg show`
    fn interface_status(&self) -> Result<String>;

    /// Apply a single iptables rule
    fn apply_firewall_rule(&self, rule: &FirewallRule) -> Result<()>;
}

/// Concrete bridge that shells out to `wg`, `wg-quick` and `iptables`
pub struct WgCli {
    config_dir: PathBuf,
    interface: String,
}

impl WgCli {
    /// Create a bridge for the given config directory and interface name
    pub fn new(config_dir: PathBuf, interface: String) -> Self {
        Self {
            config_dir,
            interface,
        }
    }

    /// Execute a system command, capturing stdout and surfacing stderr on
    /// failure
    fn run_command(&self, program: &str, args: &[&str]) -> Result<String> {
        debug!("Executing command: {} {:?}", program, args);

        let output = Command::new(program).args(args).output().map_err(|e| {
            GatewayError::ExternalTool(format!(
                "Failed to execute {} {}: {}",
                program,
                args.join(" "),
                e
            ))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GatewayError::ExternalTool(format!(
                "Command failed: {} {}: {}",
                program,
                args.join(" "),
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Execute a command with data piped over stdin (used for `wg pubkey`,
    /// which reads the private key that way so it never hits the command line)
    fn run_command_stdin(&self, program: &str, args: &[&str], input: &str) -> Result<String> {
        debug!("Executing command: {} {:?} (with stdin)", program, args);

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                GatewayError::ExternalTool(format!("Failed to spawn {}: {}", program, e))
            })?;

        if let Some(stdin) = child.stdin.as_mut() {
            stdin.write_all(input.as_bytes()).map_err(|e| {
                GatewayError::ExternalTool(format!("Failed to write to {} stdin: {}", program, e))
            })?;
        }

        let output = child.wait_with_output().map_err(|e| {
            GatewayError::ExternalTool(format!("{} failed: {}", program, e))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GatewayError::ExternalTool(format!(
                "Command failed: {} {}: {}",
                program,
                args.join(" "),
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    fn generated_key(&self, raw: String, what: &str) -> Result<String> {
        let key = raw.trim().to_string();
        if key.is_empty() {
            return Err(GatewayError::ExternalTool(format!(
                "wg produced empty output for {}",
                what
            )));
        }
        validate_key_encoding(&key)?;
        Ok(key)
    }
}

impl ToolBridge for WgCli {
    fn generate_keypair(&self) -> Result<(String, String)> {
        let private = self.generated_key(self.run_command("wg", &["genkey"])?, "private key")?;
        let public = self.generated_key(
            self.run_command_stdin("wg", &["pubkey"], &private)?,
            "public key",
        )?;
        Ok((private, public))
    }

    fn generate_preshared_key(&self) -> Result<String> {
        self.generated_key(self.run_command("wg", &["genpsk"])?, "pre-shared key")
    }

    fn read_server_public_key(&self) -> Result<String> {
        let path = self.config_dir.join("publickey");
        if !path.exists() {
            return Err(GatewayError::NotFound(format!(
                "Server public key not found at {}",
                path.display()
            )));
        }
        let key = fs::read_to_string(&path)?;
        Ok(key.trim().to_string())
    }

    fn interface_up(&self) -> Result<()> {
        self.run_command("wg-quick", &["up", &self.interface])?;
        Ok(())
    }

    fn reload_config(&self) -> Result<()> {
        // wg syncconf cannot read wg-quick's extended format directly, so
        // strip it first and feed the result through a scratch file
        let stripped = self.run_command("wg-quick", &["strip", &self.interface])?;

        let sync_path = self.config_dir.join(format!("{}.sync.conf", self.interface));
        write_secret_file(&sync_path, &stripped)?;

        let result = self.run_command(
            "wg",
            &["syncconf", &self.interface, &sync_path.to_string_lossy()],
        );

        // Scratch file contains the private key; remove it regardless
        let _ = fs::remove_file(&sync_path);

        result.map(|_| ())
    }

    fn interface_status(&self) -> Result<String> {
        self.run_command("wg", &["show", &self.interface])
    }

    fn apply_firewall_rule(&self, rule: &FirewallRule) -> Result<()> {
        let args: Vec<&str> = rule.args.iter().map(String::as_str).collect();
        self.run_command("iptables", &args)?;
        Ok(())
    }
}

/// Write a file containing key material with owner-only permissions
pub fn write_secret_file(path: &std::path::Path, contents: &str) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .map_err(|e| {
                GatewayError::Io(std::io::Error::new(
                    e.kind(),
                    format!("Failed to create {}: {}", path.display(), e),
                ))
            })?;
        file.write_all(contents.as_bytes())?;
        Ok(())
    }

    #[cfg(not(unix))]
    {
        fs::write(path, contents)?;
        Ok(())
    }
}
