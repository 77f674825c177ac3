// Startup error module

use thiserror::Error;

/// Failures that stop the server before it starts serving
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid listen address: {0}")]
    Address(String),

    #[error("Logger initialization failed: {0}")]
    Logger(#[source] std::io::Error),

    #[error("Failed to build Tokio runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },
}
