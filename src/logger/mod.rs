//! Logger module
//!
//! Provides logging utilities for the customization server including:
//! - Server lifecycle logging
//! - Access logging with multiple formats
//! - Leveled error, warning and debug logging
//! - File-based logging support

mod format;
pub mod writer;

pub use format::AccessLogEntry;

use crate::config::Config;
use std::net::SocketAddr;
use std::str::FromStr;

/// Log severity, ordered from most to least severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" | "trace" => Ok(Self::Debug),
            other => Err(format!("Unknown log level '{other}'")),
        }
    }
}

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    let level = config.logging.level.parse::<LogLevel>().map_err(|e: String| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e)
    })?;
    writer::init(
        level,
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

/// Whether messages at `level` are written, `Info` and above before `init`
pub fn enabled(level: LogLevel) -> bool {
    writer::get().map_or(LogLevel::Info, writer::LogWriter::level) >= level
}

/// Write to info/access log
fn write_info(message: &str) {
    match writer::get() {
        Some(w) => w.write_info(message),
        None => println!("{message}"),
    }
}

/// Write to error log
fn write_error(message: &str) {
    match writer::get() {
        Some(w) => w.write_error(message),
        None => eprintln!("{message}"),
    }
}

/// Write to access log specifically
fn write_access(message: &str) {
    match writer::get() {
        Some(w) => w.write_access(message),
        None => println!("{message}"),
    }
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    if !enabled(LogLevel::Info) {
        return;
    }
    write_info("======================================");
    write_info("Shoe customizer started successfully");
    write_info(&format!("Listening on: http://{addr}"));
    write_info(&format!("  - POST http://{addr}/customize"));
    write_info(&format!("Model asset: {}", crate::api::BASKET_MODEL_PATH));
    if config.routes.health.enabled {
        write_info(&format!(
            "  - GET  http://{addr}{}  (liveness)",
            config.routes.health.liveness_path
        ));
        write_info(&format!(
            "  - GET  http://{addr}{}  (readiness)",
            config.routes.health.readiness_path
        ));
    }
    write_info(&format!("Log level: {}", config.logging.level));
    if let Some(workers) = config.server.workers {
        write_info(&format!("Worker threads: {workers}"));
    }
    if let Some(max) = config.performance.max_connections {
        write_info(&format!("Max connections: {max}"));
    }
    write_info(&format!("Max body size: {} bytes", config.http.max_body_size));
    if let Some(ref path) = config.logging.access_log_file {
        write_info(&format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        write_info(&format!("Error log: {path}"));
    }
    write_info("======================================");
}

pub fn log_info(message: &str) {
    if enabled(LogLevel::Info) {
        write_info(&format!("[INFO] {message}"));
    }
}

pub fn log_debug(message: &str) {
    if enabled(LogLevel::Debug) {
        write_info(&format!("[DEBUG] {message}"));
    }
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    log_debug(&format!("[Connection] Accepted from: {peer_addr}"));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    log_error(&format!("Failed to serve connection: {err:?}"));
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    if enabled(LogLevel::Warn) {
        write_error(&format!("[WARN] {message}"));
    }
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    write_access(&entry.format(format));
}

pub fn log_shutdown_requested(signal: &str) {
    log_info(&format!("[SIGNAL] {signal} received, shutting down"));
}

pub fn log_shutdown_complete(remaining: usize) {
    if remaining == 0 {
        log_info("Server stopped, all connections closed");
    } else {
        log_warning(&format!(
            "Server stopped with {remaining} connection(s) still open"
        ));
    }
}
