//! Rewriting proxy
//!
//! Fetches a target URL on behalf of the caller and rewrites every URL in
//! HTML, CSS and JavaScript responses so follow-up requests come back
//! through the proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌────────────────────────────────────────────────────────┐
//!                    │                     REWRITE PROXY                       │
//!                    │                                                         │
//!  GET /web?url=     │  ┌────────┐   ┌──────────────────┐   ┌──────────────┐  │
//!  ──────────────────┼─▶│  http  │──▶│ request pipeline │──▶│   upstream   │──┼──▶ Target
//!                    │  │ server │   │ validate/auth/hdr│   │ reqwest GET  │  │    Server
//!                    │  └────────┘   └──────────────────┘   └──────┬───────┘  │
//!                    │       ▲                                     │          │
//!                    │       │        ┌──────────────────┐         ▼          │
//!  ◀─────────────────┼───────┴────────│ response pipeline│◀── classify body   │
//!  rewritten reply   │                │ headers/html/css/│                    │
//!                    │                │ js → rewrite/    │                    │
//!                    │                └──────────────────┘                    │
//!                    │                                                         │
//!                    │  GET /proxy?url=  → passthrough (stream, CORS only)     │
//!                    │                                                         │
//!                    │  config · security · observability · lifecycle          │
//!                    └────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use rewrite_proxy::config::{load_config, ProxyConfig};
use rewrite_proxy::lifecycle::{wait_for_signal, Shutdown};
use rewrite_proxy::observability::{logging, metrics};
use rewrite_proxy::HttpServer;

#[derive(Parser, Debug)]
#[command(name = "rewrite-proxy", version, about = "Content-rewriting HTTP proxy")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };

    logging::init_logging(&config.observability)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = ?args.config,
        "rewrite-proxy starting"
    );
    tracing::info!(
        bind_address = %config.listener.bind_address,
        proxy_base = %config.rewrite.proxy_base,
        request_timeout_secs = config.timeouts.request_secs,
        api_keys = config.api_keys.len(),
        "Configuration loaded"
    );
    if config.api_keys.is_empty() {
        tracing::warn!("No API keys configured; every /web request will be rejected");
    }

    if config.observability.metrics_enabled {
        let addr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config)?;
    let server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    wait_for_signal().await;
    shutdown.trigger();
    server_task.await??;

    tracing::info!("Shutdown complete");
    Ok(())
}
