//! SearXNG edge router
//!
//! Fronts a fixed pool of SearXNG sidecars behind one HTTP endpoint.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ body limit ─▶ /search (validate) ─┐
//!                                  /mcp (tool call)  ───┤
//!                                  /* (verbatim)     ───┤
//!                                                       ▼
//!                                         pool: select 1 of first k slots
//!                                               activate (start if stopped)
//!                                               forward, no retry
//!                                                       │
//!     Client Response                                   ▼
//!     ◀────────────── merged Server-Timing ◀──── sidecar response
//!
//!     Background: reaper (idle stop, error cooldown), shutdown fan-out
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use searxng_edge::config::{load_config, EdgeConfig};
use searxng_edge::http::HttpServer;
use searxng_edge::lifecycle::{wait_for_signal, Shutdown};
use searxng_edge::observability::{init_logging, metrics};
use searxng_edge::pool::LocalPool;

#[derive(Parser, Debug)]
#[command(name = "searxng-edge", version, about = "Edge router for a pool of SearXNG instances")]
struct Args {
    /// Path to the TOML configuration file; defaults apply when omitted.
    #[arg(short, long, env = "SEARXNG_EDGE_CONFIG")]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,

    /// Validate the configuration and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => EdgeConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    if args.check {
        println!("configuration ok");
        return Ok(());
    }

    init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "searxng-edge starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        capacity = config.pool.capacity,
        window = config.pool.window,
        max_body_size = config.security.max_body_size,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let pool = LocalPool::new(&config.pool)?;
    let shutdown = Shutdown::new();

    let reaper = tokio::spawn(pool.reaper().run(shutdown.subscribe()));

    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        signal_shutdown.trigger();
    });

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(&config, Arc::new(pool));
    server.run(listener, shutdown.subscribe()).await?;

    // The reaper stops running sidecars once it sees the shutdown event.
    if let Err(e) = reaper.await {
        tracing::error!(error = %e, "Sidecar reaper task failed");
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
