//! peergate main entry point
//!
//! This binary serves as the entry point for the gateway provisioner.
//! It handles CLI parsing, logging setup, and dispatch to the peer and
//! server commands.

use clap::{Parser, Subcommand};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use peergate::config::Settings;
use peergate::server::AppState;
use peergate::tools::{ToolBridge, WgCli};
use peergate::wireguard::{render, PeerKeyMaterial};
use peergate::{bootstrap, GatewayError, APP_NAME, VERSION};

/// WireGuard VPN gateway peer provisioner
#[derive(Parser, Debug)]
#[command(name = APP_NAME, version = VERSION, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage peer configurations
    Peer {
        #[command(subcommand)]
        command: PeerCommands,
    },

    /// Bootstrap the gateway and serve the HTTP management API
    Server,
}

#[derive(Subcommand, Debug)]
enum PeerCommands {
    /// Create a new peer configuration
    Create {
        /// Client name (e.g., alice, bob, client1)
        #[arg(long)]
        name: String,

        /// Client IP address, must be inside the gateway's pool
        #[arg(long)]
        ip: String,

        /// Public host for the WireGuard endpoint
        #[arg(long = "public-host", alias = "publicHost")]
        public_host: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize structured logging with tracing
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Run the CLI command
async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = Settings::from_env()?;

    match cli.command {
        Commands::Peer {
            command:
                PeerCommands::Create {
                    name,
                    ip,
                    public_host,
                },
        } => {
            let bridge = WgCli::new(settings.config_dir.clone(), settings.interface.clone());
            create_peer(&settings, &bridge, &name, &ip, public_host.as_deref())?;
            Ok(())
        }
        Commands::Server => serve(settings).await,
    }
}

/// Validate, generate and print a new peer configuration
fn create_peer(
    settings: &Settings,
    bridge: &dyn ToolBridge,
    name: &str,
    ip: &str,
    public_host: Option<&str>,
) -> peergate::Result<()> {
    let address = settings.pool.validate_peer_address(ip)?;
    let public_host = public_host.unwrap_or(&settings.public_host);

    info!("Generating peer configuration for: {}", name);
    let keys = PeerKeyMaterial::generate(bridge)?;

    let server_config = render::server_peer_stanza(name, address, &keys);
    let client_config = render::client_interface_config(
        address,
        public_host,
        settings.wg_port,
        &settings.allowed_target,
        &keys,
    );

    let config_path = settings.config_path();

    println!("==== SERVER CONFIG (add to {}) ====", config_path.display());
    println!("{}", server_config);
    println!("==== CLIENT CONFIG ====");
    println!("{}", client_config);
    println!("==== KEYS & PSK ====");
    println!("Client Private Key: {}", keys.client_private_key);
    println!("Client Public Key:  {}", keys.client_public_key);
    println!("Server Public Key:  {}", keys.server_public_key);
    println!("Pre-Shared Key:     {}", keys.preshared_key);
    println!();
    println!("==== NEXT STEPS ====");
    println!("1. Copy the server config section to {}", config_path.display());
    println!(
        "2. Run: wg syncconf {} <(wg-quick strip {})",
        settings.interface, settings.interface
    );
    println!("3. Give the client the client config");
    println!(
        "4. The client can then reach services in {}",
        settings.allowed_target
    );

    Ok(())
}

/// Bootstrap the gateway, then serve the HTTP facade until shutdown
async fn serve(settings: Settings) -> anyhow::Result<()> {
    info!("Starting {} v{}", APP_NAME, VERSION);

    if settings.api_key.is_none() {
        return Err(GatewayError::Config(
            "API_KEY must be set to run the server".to_string(),
        )
        .into());
    }

    bootstrap::preflight()?;

    let bridge: Arc<dyn ToolBridge> = Arc::new(WgCli::new(
        settings.config_dir.clone(),
        settings.interface.clone(),
    ));

    bootstrap::run(&settings, bridge.as_ref())?;

    let api_port = settings.api_port;
    let state = AppState::new(Arc::new(settings), bridge);
    let app = peergate::server::router(state);

    let addr = format!("0.0.0.0:{}", api_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
