//! Integration tests for the HTTP management facade
//!
//! These run the real router against a fake tool bridge on an ephemeral
//! port, so no external binaries or privileges are needed.

use peergate::config::Settings;
use peergate::error::{GatewayError, Result};
use peergate::server::{router, AppState};
use peergate::tools::firewall::FirewallRule;
use peergate::tools::ToolBridge;
use peergate::wireguard::AddressPool;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

const CLIENT_PRIV: &str = "cFBwUFBwUFBwUFBwUFBwUFBwUFBwUFBwUFBwUFBwUFA=";
const CLIENT_PUB: &str = "UFVCUFVCUFVCUFVCUFVCUFVCUFVCUFVCUFVCUFVCUFU=";
const SERVER_PUB: &str = "U1JWUFVCU1JWUFVCU1JWUFVCU1JWUFVCU1JWUFVCU1I=";
const PSK: &str = "UFNLUFNLUFNLUFNLUFNLUFNLUFNLUFNLUFNLUFNLUFM=";

/// Bridge double that returns canned key material and records every call
struct FakeBridge {
    calls: Mutex<Vec<String>>,
    fail_reload: bool,
}

impl FakeBridge {
    fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_reload: false,
        }
    }

    fn failing_reload() -> Self {
        Self {
            fail_reload: true,
            ..Self::new()
        }
    }

    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl ToolBridge for FakeBridge {
    fn generate_keypair(&self) -> Result<(String, String)> {
        self.record("generate_keypair");
        Ok((CLIENT_PRIV.to_string(), CLIENT_PUB.to_string()))
    }

    fn generate_preshared_key(&self) -> Result<String> {
        self.record("generate_preshared_key");
        Ok(PSK.to_string())
    }

    fn read_server_public_key(&self) -> Result<String> {
        self.record("read_server_public_key");
        Ok(SERVER_PUB.to_string())
    }

    fn interface_up(&self) -> Result<()> {
        self.record("interface_up");
        Ok(())
    }

    fn reload_config(&self) -> Result<()> {
        self.record("reload_config");
        if self.fail_reload {
            Err(GatewayError::ExternalTool("wg syncconf exploded".to_string()))
        } else {
            Ok(())
        }
    }

    fn interface_status(&self) -> Result<String> {
        self.record("interface_status");
        Ok("interface: wg0\n  public key: abc\n".to_string())
    }

    fn apply_firewall_rule(&self, rule: &FirewallRule) -> Result<()> {
        self.record(&format!("iptables {}", rule.args.join(" ")));
        Ok(())
    }
}

fn test_settings(config_dir: &Path) -> Settings {
    Settings {
        config_dir: config_dir.to_path_buf(),
        interface: "wg0".to_string(),
        api_port: 0,
        wg_port: 51820,
        pool: AddressPool::new(
            "10.100.128.0/17".parse().unwrap(),
            "10.100.128.1".parse().unwrap(),
        )
        .unwrap(),
        allowed_target: "10.100.0.0/24".parse().unwrap(),
        public_host: "vpn.example.com".to_string(),
        api_key: Some("test-secret".to_string()),
        uplink: "eth0".to_string(),
    }
}

/// Serve the router on an ephemeral port, returning the base URL
async fn spawn_app(settings: Settings, bridge: Arc<FakeBridge>) -> String {
    let state = AppState::new(Arc::new(settings), bridge);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

#[tokio::test]
async fn test_root_is_unauthenticated() {
    let tmp = TempDir::new().unwrap();
    let url = spawn_app(test_settings(tmp.path()), Arc::new(FakeBridge::new())).await;

    let response = reqwest::get(&url).await.unwrap();
    assert_eq!(response.status(), 200);
    assert!(response.text().await.unwrap().contains("peergate"));
}

#[tokio::test]
async fn test_config_requires_api_key() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("wg0.conf"), "[Interface]\nsecret stuff\n").unwrap();
    let url = spawn_app(test_settings(tmp.path()), Arc::new(FakeBridge::new())).await;

    let client = reqwest::Client::new();

    // No header at all
    let response = client
        .get(format!("{}/api/config", url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
    let body = response.text().await.unwrap();
    assert!(!body.contains("secret stuff"));

    // Wrong value
    let response = client
        .get(format!("{}/api/config", url))
        .header("x-api-key", "wrong")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
    // The rejection must not reveal the expected secret
    assert!(!response.text().await.unwrap().contains("test-secret"));
}

#[tokio::test]
async fn test_get_config_returns_document() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("wg0.conf"), "[Interface]\nListenPort = 51820\n").unwrap();
    let url = spawn_app(test_settings(tmp.path()), Arc::new(FakeBridge::new())).await;

    let response = reqwest::Client::new()
        .get(format!("{}/api/config", url))
        .header("x-api-key", "test-secret")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        body["config"].as_str().unwrap(),
        "[Interface]\nListenPort = 51820\n"
    );
}

#[tokio::test]
async fn test_get_config_missing_is_404() {
    let tmp = TempDir::new().unwrap();
    let url = spawn_app(test_settings(tmp.path()), Arc::new(FakeBridge::new())).await;

    let response = reqwest::Client::new()
        .get(format!("{}/api/config", url))
        .header("x-api-key", "test-secret")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_put_config_writes_and_reloads() {
    let tmp = TempDir::new().unwrap();
    let bridge = Arc::new(FakeBridge::new());
    let url = spawn_app(test_settings(tmp.path()), bridge.clone()).await;

    let new_config = "[Interface]\nListenPort = 51821\n";
    let response = reqwest::Client::new()
        .put(format!("{}/api/config", url))
        .header("x-api-key", "test-secret")
        .json(&serde_json::json!({ "config": new_config }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Configuration updated");

    assert_eq!(
        std::fs::read_to_string(tmp.path().join("wg0.conf")).unwrap(),
        new_config
    );
    assert_eq!(bridge.calls(), vec!["reload_config"]);
}

#[tokio::test]
async fn test_put_config_rejects_document_without_interface_section() {
    let tmp = TempDir::new().unwrap();
    let bridge = Arc::new(FakeBridge::new());
    let url = spawn_app(test_settings(tmp.path()), bridge.clone()).await;

    let response = reqwest::Client::new()
        .put(format!("{}/api/config", url))
        .header("x-api-key", "test-secret")
        .json(&serde_json::json!({ "config": "garbage\n" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    // Nothing written, nothing reloaded
    assert!(!tmp.path().join("wg0.conf").exists());
    assert!(bridge.calls().is_empty());
}

#[tokio::test]
async fn test_put_config_reload_failure_reports_divergence() {
    let tmp = TempDir::new().unwrap();
    let bridge = Arc::new(FakeBridge::failing_reload());
    let url = spawn_app(test_settings(tmp.path()), bridge.clone()).await;

    let new_config = "[Interface]\nListenPort = 51822\n";
    let response = reqwest::Client::new()
        .put(format!("{}/api/config", url))
        .header("x-api-key", "test-secret")
        .json(&serde_json::json!({ "config": new_config }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 500);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("differ"));

    // The write happened before the reload failed
    assert_eq!(
        std::fs::read_to_string(tmp.path().join("wg0.conf")).unwrap(),
        new_config
    );
}

#[tokio::test]
async fn test_stats_returns_tool_output_verbatim() {
    let tmp = TempDir::new().unwrap();
    let url = spawn_app(test_settings(tmp.path()), Arc::new(FakeBridge::new())).await;

    let response = reqwest::Client::new()
        .get(format!("{}/api/stats", url))
        .header("x-api-key", "test-secret")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(
        response.text().await.unwrap(),
        "interface: wg0\n  public key: abc\n"
    );
}

#[tokio::test]
async fn test_server_info() {
    let tmp = TempDir::new().unwrap();
    let url = spawn_app(test_settings(tmp.path()), Arc::new(FakeBridge::new())).await;

    let response = reqwest::Client::new()
        .get(format!("{}/api/serverInfo", url))
        .header("x-api-key", "test-secret")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["publicKey"], SERVER_PUB);
    assert_eq!(body["endpoint"], "vpn.example.com:51820");
}

#[tokio::test]
async fn test_generate_peer_config() {
    let tmp = TempDir::new().unwrap();
    let bridge = Arc::new(FakeBridge::new());
    let url = spawn_app(test_settings(tmp.path()), bridge.clone()).await;

    let response = reqwest::Client::new()
        .get(format!(
            "{}/api/generatePeerConfig?ip=10.100.200.5&clientName=alice",
            url
        ))
        .header("x-api-key", "test-secret")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();

    let server_config = body["serverConfig"].as_str().unwrap();
    assert!(server_config.contains("# alice"));
    assert!(server_config.contains(&format!("PublicKey = {}", CLIENT_PUB)));
    assert!(server_config.contains("AllowedIPs = 10.100.200.5/32"));

    let client_config = body["clientConfig"].as_str().unwrap();
    assert!(client_config.contains("Address = 10.100.200.5/32"));
    assert!(client_config.contains(&format!("PublicKey = {}", SERVER_PUB)));
    assert!(client_config.contains("AllowedIPs = 10.100.0.0/24"));
    assert!(client_config.contains("Endpoint = vpn.example.com:51820"));

    // Generation only: the persisted document is untouched and the
    // interface is not reloaded
    assert!(!tmp.path().join("wg0.conf").exists());
    assert!(!bridge.calls().contains(&"reload_config".to_string()));
}

#[tokio::test]
async fn test_generate_peer_config_public_host_override() {
    let tmp = TempDir::new().unwrap();
    let url = spawn_app(test_settings(tmp.path()), Arc::new(FakeBridge::new())).await;

    let response = reqwest::Client::new()
        .get(format!(
            "{}/api/generatePeerConfig?ip=10.100.200.5&clientName=alice&publicHost=other.example.org",
            url
        ))
        .header("x-api-key", "test-secret")
        .send()
        .await
        .unwrap();

    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["clientConfig"]
        .as_str()
        .unwrap()
        .contains("Endpoint = other.example.org:51820"));
}

#[tokio::test]
async fn test_generate_peer_config_rejects_gateway_address() {
    let tmp = TempDir::new().unwrap();
    let bridge = Arc::new(FakeBridge::new());
    let url = spawn_app(test_settings(tmp.path()), bridge.clone()).await;

    let response = reqwest::Client::new()
        .get(format!(
            "{}/api/generatePeerConfig?ip=10.100.128.1&clientName=alice",
            url
        ))
        .header("x-api-key", "test-secret")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("reserved"));

    // Validation failed before any key material was generated
    assert!(bridge.calls().is_empty());
}

#[tokio::test]
async fn test_generate_peer_config_rejects_address_outside_pool() {
    let tmp = TempDir::new().unwrap();
    let url = spawn_app(test_settings(tmp.path()), Arc::new(FakeBridge::new())).await;

    let response = reqwest::Client::new()
        .get(format!(
            "{}/api/generatePeerConfig?ip=192.168.1.50&clientName=alice",
            url
        ))
        .header("x-api-key", "test-secret")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("10.100.128.0/17"));
}

#[tokio::test]
async fn test_generate_peer_config_missing_parameters() {
    let tmp = TempDir::new().unwrap();
    let url = spawn_app(test_settings(tmp.path()), Arc::new(FakeBridge::new())).await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/generatePeerConfig?clientName=alice", url))
        .header("x-api-key", "test-secret")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("ip"));

    let response = client
        .get(format!("{}/api/generatePeerConfig?ip=10.100.200.5", url))
        .header("x-api-key", "test-secret")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("clientName"));
}
