use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    TomlError(String),
    #[error("Value out of range: {0}")]
    NotInRange(String),
    #[error("Missing value: {0}")]
    Missing(String),
}

/// Failures of the session store.
///
/// Duplicate starts and orphan updates are not errors; they are reported as
/// outcomes by the lifecycle handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("Storage connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Storage write failed: {0}")]
    WriteFailed(String),
    #[error("Storage read failed: {0}")]
    ReadFailed(String),
    #[error("Storage operation timed out after {0} ms")]
    Timeout(u64),
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Processing timed out after {0} ms")]
    Timeout(u64),
}

#[derive(Debug, Error)]
pub enum WebError {
    #[error("Unable to bind {addr}: {reason}")]
    Bind { addr: String, reason: String },
}
