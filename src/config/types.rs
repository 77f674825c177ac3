// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
    pub routes: RoutesConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Tokio worker threads, CPU cores when unset
    pub workers: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            workers: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    /// Minimum level written: error, warn, info or debug
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    pub error_log_file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            access_log: true,
            access_log_format: "combined".to_string(),
            access_log_file: None,
            error_log_file: None,
        }
    }
}

/// Performance configuration, timeouts in seconds
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PerformanceConfig {
    pub keep_alive: bool,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
    /// Time in-flight connections get to finish after a shutdown signal
    pub shutdown_grace: u64,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            keep_alive: true,
            read_timeout: 30,
            write_timeout: 30,
            max_connections: None,
            shutdown_grace: 5,
        }
    }
}

/// HTTP configuration
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HttpConfig {
    pub server_name: String,
    pub enable_cors: bool,
    pub max_body_size: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            server_name: "shoe-customizer".to_string(),
            enable_cors: false,
            max_body_size: 1_048_576, // 1MB
        }
    }
}

/// Routes configuration
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct RoutesConfig {
    /// Health check configuration
    pub health: HealthConfig,
}

/// Health check configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HealthConfig {
    /// Enable health check endpoints
    #[serde(default = "default_health_enabled")]
    pub enabled: bool,
    /// Liveness check path (default: /healthz)
    #[serde(default = "default_healthz_path")]
    pub liveness_path: String,
    /// Readiness check path (default: /readyz)
    #[serde(default = "default_readyz_path")]
    pub readiness_path: String,
}

#[allow(clippy::missing_const_for_fn)]
fn default_health_enabled() -> bool {
    true
}

#[allow(clippy::missing_const_for_fn)]
fn default_healthz_path() -> String {
    "/healthz".to_string()
}

#[allow(clippy::missing_const_for_fn)]
fn default_readyz_path() -> String {
    "/readyz".to_string()
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: default_health_enabled(),
            liveness_path: default_healthz_path(),
            readiness_path: default_readyz_path(),
        }
    }
}
