// src/main.rs

//! The main entry point for the agentd server application.

use agentd::config::Config;
use agentd::core::storage::{KeyValueStore, MemoryStore};
use agentd::server;
use anyhow::Result;
use std::env;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{filter::EnvFilter, prelude::*};

#[tokio::main]
async fn main() -> Result<()> {
    run_app().await
}

async fn run_app() -> Result<()> {
    const VERSION: &str = env!("AGENTD_VERSION");

    let args: Vec<String> = env::args().collect();

    if args.contains(&"--version".to_string()) {
        println!("agentd version {VERSION}");
        return Ok(());
    }

    // The configuration path can be provided via a --config flag; otherwise it
    // defaults to "config.toml".
    let config_path = args
        .iter()
        .position(|arg| arg == "--config")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
        .unwrap_or("config.toml");

    let mut config = match Config::from_file(config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration from \"{config_path}\": {e:#}");
            std::process::exit(1);
        }
    };

    if let Some(port_index) = args.iter().position(|arg| arg == "--port") {
        match args.get(port_index + 1).map(|s| s.parse::<u16>()) {
            Some(Ok(port)) if port != 0 => config.port = port,
            Some(_) => {
                eprintln!("Invalid port number: {}", args[port_index + 1]);
                std::process::exit(1);
            }
            None => {
                eprintln!("--port flag requires a value");
                std::process::exit(1);
            }
        }
    }

    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone());
    tracing_subscriber::registry()
        .with(EnvFilter::new(log_level))
        .with(
            tracing_subscriber::fmt::layer()
                .compact() // Use the compact, single-line format.
                .with_ansi(true),
        )
        .init();

    info!("Starting agentd {}", VERSION);

    let store: Arc<dyn KeyValueStore> = match &config.store.seed_file {
        Some(path) => Arc::new(MemoryStore::from_seed_file(path)?),
        None => Arc::new(MemoryStore::new()),
    };

    if let Err(e) = server::run(config, store).await {
        error!("Server runtime error: {:#}", e);
        return Err(e);
    }

    Ok(())
}
