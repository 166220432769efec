//! Binary entry point: load config, assemble the engine, serve.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use viaduct::config::{load_config, ProxyConfig};
use viaduct::engine::Engine;
use viaduct::observability;

#[derive(Parser, Debug)]
#[command(name = "viaduct", about = "HTTP reverse proxy", version)]
struct Args {
    /// Path to the TOML configuration file. Defaults apply when omitted.
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

    observability::logging::init(&config.observability.log_level);

    tracing::info!(
        bind_address = %config.listener.bind_address,
        routes = config.routes.len(),
        origins = config.origins.len(),
        "viaduct starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => observability::metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "failed to parse metrics address"
            ),
        }
    }

    let bind_address = config.listener.bind_address.clone();
    let (engine, events) = Engine::new(config).map_err(|errors| {
        errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    })?;

    tokio::spawn(observability::consume_events(events));

    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "listening for connections");

    engine.start(listener).await?;

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received");
    engine.stop().await;

    tracing::info!("shutdown complete");
    Ok(())
}
