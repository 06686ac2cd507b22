use std::sync::Arc;

use clap::Parser;
use env_logger::Env;
use log::{error, info};
use radacct::configuration::config::{CliArgs, Config};
use radacct::storage::DatabaseStorage;
use radacct::web_interface::{ApiState, WebServer};

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    // Logging is not up yet, so configuration errors go to stderr
    let config = match Config::load(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Unable to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // https://docs.rs/env_logger/latest/env_logger/
    let default_level = config.logging.level_filter().to_string();
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level))
        .format_target(false)
        .init();

    info!("radacct v{} starting", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration loaded: store timeout {} ms, default NAS {}",
        config.accounting.store_timeout_ms, config.accounting.default_nas_address
    );

    let storage = match DatabaseStorage::connect(&config.database).await {
        Ok(storage) => Arc::new(storage),
        Err(e) => {
            error!("Unable to open the session store: {}, exiting...", e);
            std::process::exit(1);
        }
    };

    let state = ApiState::new(storage.clone(), storage.clone(), storage, &config.accounting);
    let server = WebServer::new(state);
    if let Err(e) = server.start(&config.server).await {
        error!("Web server failed: {}, exiting...", e);
        std::process::exit(1);
    }
}
