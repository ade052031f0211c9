//! relayd — real-time WebSocket relay server.
//!
//! Accepts persistent WebSocket connections and relays structured JSON
//! messages: `ping` is answered with `pong`, `broadcast` fans out to every
//! other open connection, anything else is echoed back to the sender.
//!
//! Usage:
//!   relayd                       # 0.0.0.0:8080
//!   relayd --port 9000 --host 127.0.0.1
//!   RELAY_PORT=9000 relayd       # environment fallback

use clap::Parser;
use relay_transport::{RelayServer, ServerConfig};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "relayd", about = "Real-time WebSocket relay server")]
struct Cli {
    /// Port to listen on (falls back to RELAY_PORT, then 8080)
    #[arg(long)]
    port: Option<u16>,

    /// Hostname to bind to (falls back to RELAY_HOST, then 0.0.0.0)
    #[arg(long)]
    host: Option<String>,

    /// Maximum concurrent connections
    #[arg(long, default_value = "1024")]
    max_connections: usize,

    /// Enable verbose logging
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let hostname = cli
        .host
        .or_else(|| std::env::var("RELAY_HOST").ok())
        .unwrap_or_else(|| "0.0.0.0".into());
    let port = cli
        .port
        .or_else(|| std::env::var("RELAY_PORT").ok().and_then(|p| p.parse().ok()))
        .unwrap_or(8080);

    let config = ServerConfig {
        port,
        hostname,
        max_connections: Some(cli.max_connections),
    };

    let mut server = match RelayServer::start(config).await {
        Ok(server) => server,
        Err(e) => {
            error!("failed to start relay server: {e}");
            std::process::exit(1);
        }
    };

    info!("press Ctrl+C to stop");
    wait_for_shutdown_signal().await;

    info!("shutdown signal received");
    server.stop().await;
}

/// Resolves on SIGINT, or SIGTERM on unix.
async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
