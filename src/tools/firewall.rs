//! Firewall rule plan
//!
//! Builds the ordered iptables sequence that confines peer traffic to the
//! allowed target range, and drives the bridge through it best-effort: each
//! rule's outcome is reported individually and a failure never aborts the
//! remaining rules. Partial firewall coverage beats none.

use crate::config::Settings;
use crate::tools::ToolBridge;
use tracing::{debug, error, info};

/// A single iptables invocation
#[derive(Debug, Clone)]
pub struct FirewallRule {
    /// Arguments passed to `iptables`
    pub args: Vec<String>,
    /// Operator-facing description of what the rule does
    pub description: String,
    /// Flush rules may legitimately fail (nothing to flush); their failures
    /// are logged quietly instead of prominently
    pub flush: bool,
}

impl FirewallRule {
    fn new(args: &[&str], description: &str) -> Self {
        Self {
            args: args.iter().map(|a| a.to_string()).collect(),
            description: description.to_string(),
            flush: false,
        }
    }

    fn flush(args: &[&str], description: &str) -> Self {
        Self {
            flush: true,
            ..Self::new(args, description)
        }
    }
}

/// Outcome of a full rule-plan application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirewallSummary {
    /// Rules that applied cleanly
    pub applied: usize,
    /// Rules that failed (flush failures included)
    pub failed: usize,
}

/// Build the ordered rule sequence for the given settings.
///
/// Flush first, then masquerade pool egress, default-deny forwarding, allow
/// established flows, allow pool traffic to and from the target range only,
/// and finally drop peer-to-peer and any remaining pool traffic.
pub fn rule_plan(settings: &Settings) -> Vec<FirewallRule> {
    let pool = settings.pool.cidr().to_string();
    let target = settings.allowed_target.to_string();
    let iface = settings.interface.as_str();
    let uplink = settings.uplink.as_str();

    vec![
        FirewallRule::flush(&["-F", "FORWARD"], "Flush FORWARD chain"),
        FirewallRule::flush(&["-F", "INPUT"], "Flush INPUT chain"),
        FirewallRule::flush(&["-t", "nat", "-F", "POSTROUTING"], "Flush NAT POSTROUTING"),
        FirewallRule::new(
            &[
                "-t", "nat", "-A", "POSTROUTING", "-s", &pool, "-o", uplink, "-j", "MASQUERADE",
            ],
            "Enable MASQUERADE for WireGuard clients",
        ),
        FirewallRule::new(&["-P", "FORWARD", "DROP"], "Set default FORWARD policy to DROP"),
        FirewallRule::new(
            &[
                "-A", "FORWARD", "-m", "conntrack", "--ctstate", "ESTABLISHED,RELATED", "-j",
                "ACCEPT",
            ],
            "Allow established connections",
        ),
        FirewallRule::new(
            &["-A", "FORWARD", "-i", iface, "-o", uplink, "-d", &target, "-j", "ACCEPT"],
            "Allow WireGuard clients to reach allowed target subnet",
        ),
        FirewallRule::new(
            &["-A", "FORWARD", "-i", uplink, "-o", iface, "-s", &target, "-j", "ACCEPT"],
            "Allow target subnet responses to WireGuard clients",
        ),
        FirewallRule::new(
            &["-A", "FORWARD", "-i", iface, "-o", iface, "-j", "DROP"],
            "Block WireGuard peer-to-peer traffic",
        ),
        FirewallRule::new(
            &["-A", "FORWARD", "-i", iface, "-j", "DROP"],
            "Drop all other WireGuard traffic",
        ),
    ]
}

/// Apply the rule plan best-effort, reporting each rule's outcome
pub fn apply_rules(bridge: &dyn ToolBridge, settings: &Settings) -> FirewallSummary {
    info!("Setting up iptables firewall rules");

    let mut summary = FirewallSummary {
        applied: 0,
        failed: 0,
    };

    for rule in rule_plan(settings) {
        match bridge.apply_firewall_rule(&rule) {
            Ok(()) => {
                debug!("{} - done", rule.description);
                summary.applied += 1;
            }
            Err(e) if rule.flush => {
                // Flushing a chain that has nothing in it is not a real
                // failure; keep going quietly
                debug!("{} failed: {}", rule.description, e);
                summary.failed += 1;
            }
            Err(e) => {
                error!("{} failed: {}", rule.description, e);
                summary.failed += 1;
            }
        }
    }

    info!(
        "iptables rules configured: {} applied, {} failed",
        summary.applied, summary.failed
    );
    summary
}
