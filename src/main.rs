use anyhow::Context;
use env_logger::Builder;
use log::{LevelFilter, info};
use std::path::PathBuf;

use crate::config::ServerConfig;

mod config;
mod server;
mod telemetry;

/// Loads the config file named on the command line, or the defaults.
fn load_config() -> anyhow::Result<ServerConfig> {
    match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => {
            let config = ServerConfig::load(&path).with_context(|| format!("Invalid configuration in {}", path.display()))?;
            info!("Loaded configuration from {}", path.display());
            Ok(config)
        }
        None => Ok(ServerConfig::default()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logging setup
    Builder::new()
        .filter_level(LevelFilter::Info)
        .filter(Some("hexapod_telemetry_sim"), LevelFilter::Debug)
        .parse_default_env()
        .init();

    let config = load_config()?;
    if !config.simulation.perturbation {
        info!("Random voltage/current jumps disabled");
    }

    let listener = server::bind(&config).await?;
    server::serve(listener, config.simulation).await
}
