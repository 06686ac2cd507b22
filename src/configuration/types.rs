use serde::Deserialize;
use std::time::Duration;

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: String::from("0.0.0.0"),
            port: 8000,
        }
    }
}

/// Session store connection settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// sea-orm connection URL, e.g. `sqlite://radacct.sqlite3?mode=rwc`
    pub url: String,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
    pub acquire_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::from("sqlite://radacct.sqlite3?mode=rwc"),
            max_connections: 5,
            connect_timeout_secs: 5,
            acquire_timeout_secs: 5,
        }
    }
}

impl DatabaseConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }
}

/// Accounting engine behaviour and report defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AccountingConfig {
    /// NAS address recorded when an event carries none
    pub default_nas_address: String,
    /// Upper bound for any single store interaction made on behalf of a request
    pub store_timeout_ms: u64,
    pub default_period_days: u32,
    pub default_daily_days: u32,
    pub default_top_limit: u32,
}

impl Default for AccountingConfig {
    fn default() -> Self {
        Self {
            default_nas_address: String::from("127.0.0.1"),
            store_timeout_ms: 5000,
            default_period_days: 30,
            default_daily_days: 30,
            default_top_limit: 10,
        }
    }
}

impl AccountingConfig {
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
        }
    }
}

impl LoggingConfig {
    /// Parsed level filter, falling back to `Info` for unknown names.
    pub fn level_filter(&self) -> log::LevelFilter {
        self.level.parse().unwrap_or(log::LevelFilter::Info)
    }
}
