// Configuration module entry point
// Layered configuration (defaults, TOML file, environment) and shared state

mod state;
mod types;

use std::net::SocketAddr;
use std::time::Duration;

// Re-export public types
pub use state::{shutdown_requested, AppState};
pub use types::Config;

/// Default config file, resolved without extension by the `config` crate
pub const DEFAULT_CONFIG_PATH: &str = "config";

/// Environment variable prefix, e.g. `CUSTOMIZER_SERVER__PORT=8080`
pub const ENV_PREFIX: &str = "CUSTOMIZER";

impl Config {
    /// Load configuration from the given file path.
    ///
    /// The file is optional; missing keys fall back to the serde defaults and
    /// `CUSTOMIZER_*` environment variables override both.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    /// Per-request deadline: the larger of the read and write timeouts.
    ///
    /// Applies to each request on a keep-alive connection, not to the
    /// connection as a whole.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(std::cmp::max(
            self.performance.read_timeout,
            self.performance.write_timeout,
        ))
    }
}
