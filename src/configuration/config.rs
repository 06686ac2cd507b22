use super::types::*;
use crate::error_handling::types::ConfigError;
use clap::Parser;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Command line of the `radacct` binary.
///
/// Every flag is optional; when present it overrides the matching value of the
/// configuration file.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "radacct")]
#[command(version)]
#[command(about = "RADIUS accounting and usage-metering engine")]
pub struct CliArgs {
    /// Path to a TOML configuration file
    pub config_file: Option<PathBuf>,

    /// Address the HTTP API listens on
    #[arg(long)]
    pub bind_address: Option<String>,

    /// Port the HTTP API listens on
    #[arg(long)]
    pub port: Option<u16>,

    /// Session store connection URL
    #[arg(long, env = "RADACCT_DATABASE_URL")]
    pub database_url: Option<String>,
}

/// Application configuration.
///
/// # Fields Overview
///
/// - `server`: where the HTTP API listens
/// - `database`: session store URL and pool limits
/// - `accounting`: NAS sentinel, request timeout and report defaults
/// - `logging`: default log level (`RUST_LOG` still wins)
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub accounting: AccountingConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Reads and validates a TOML configuration file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config =
            toml::from_str(content).map_err(|e| ConfigError::TomlError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Builds the effective configuration: file (or defaults) then CLI overrides.
    pub fn load(args: &CliArgs) -> Result<Self, ConfigError> {
        let mut config = match &args.config_file {
            Some(path) => Self::from_file(path)?,
            None => Config::default(),
        };
        config.apply_overrides(args);
        config.validate()?;
        Ok(config)
    }

    fn apply_overrides(&mut self, args: &CliArgs) {
        if let Some(addr) = &args.bind_address {
            self.server.bind_address = addr.clone();
        }
        if let Some(port) = args.port {
            self.server.port = port;
        }
        if let Some(url) = &args.database_url {
            self.database.url = url.clone();
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::NotInRange("server.port must be non-zero".into()));
        }
        if self.server.bind_address.trim().is_empty() {
            return Err(ConfigError::Missing("server.bind_address".into()));
        }
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::Missing("database.url".into()));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::NotInRange(
                "database.max_connections must be at least 1".into(),
            ));
        }
        if self.database.connect_timeout_secs == 0 || self.database.acquire_timeout_secs == 0 {
            return Err(ConfigError::NotInRange(
                "database timeouts must be at least 1 second".into(),
            ));
        }
        if self.accounting.store_timeout_ms == 0 {
            return Err(ConfigError::NotInRange(
                "accounting.store_timeout_ms must be non-zero".into(),
            ));
        }
        if self.accounting.default_nas_address.trim().is_empty() {
            return Err(ConfigError::Missing("accounting.default_nas_address".into()));
        }
        Ok(())
    }
}
