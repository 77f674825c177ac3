use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

mod api;
mod config;
mod error;
mod handler;
mod http;
mod logger;
mod server;

use error::StartupError;

fn main() -> Result<(), StartupError> {
    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var(format!("{}_CONFIG", config::ENV_PREFIX)).ok())
        .unwrap_or_else(|| config::DEFAULT_CONFIG_PATH.to_string());

    let cfg = config::Config::load_from(&config_path)?;
    let addr = cfg.get_socket_addr().map_err(StartupError::Address)?;
    logger::init(&cfg).map_err(StartupError::Logger)?;

    // Worker count from config, CPU cores otherwise
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build().map_err(StartupError::Runtime)?;

    runtime.block_on(async_main(cfg, addr))
}

async fn async_main(cfg: config::Config, addr: std::net::SocketAddr) -> Result<(), StartupError> {
    let listener =
        server::create_listener(addr).map_err(|source| StartupError::Bind { addr, source })?;
    logger::log_server_start(&addr, &cfg);

    let state = Arc::new(config::AppState::new(cfg));
    server::start_signal_handler(Arc::clone(&state));

    let remaining =
        server::start_server_loop(listener, state, Arc::new(AtomicUsize::new(0))).await;
    logger::log_shutdown_complete(remaining);

    Ok(())
}
