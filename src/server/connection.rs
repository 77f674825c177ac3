// Connection handling module
// Accepts a single TCP connection and serves HTTP/1.1 on it

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};

use crate::config::{self, AppState};
use crate::handler;
use crate::logger;

/// Accept and process a connection, checking limits and logging.
///
/// # Arguments
///
/// * `stream` - The TCP stream to handle
/// * `peer_addr` - The peer's socket address
/// * `state` - Shared application state
/// * `conn_counter` - Active connection counter
pub fn accept_connection(
    stream: tokio::net::TcpStream,
    peer_addr: std::net::SocketAddr,
    state: &Arc<AppState>,
    conn_counter: &Arc<AtomicUsize>,
) {
    // Increment counter first, then check limit (prevents race condition)
    let prev_count = conn_counter.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = state.config.performance.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            conn_counter.fetch_sub(1, Ordering::SeqCst);
            logger::log_warning(&format!(
                "Max connections reached: {prev_count}/{max_conn}. Connection from {peer_addr} rejected."
            ));
            drop(stream);
            return;
        }
    }

    if let Err(e) = stream.set_nodelay(true) {
        logger::log_debug(&format!("Failed to set TCP_NODELAY for {peer_addr}: {e}"));
    }
    logger::log_connection_accepted(&peer_addr);

    handle_connection(stream, peer_addr, Arc::clone(state), Arc::clone(conn_counter));
}

/// Serve one connection in a spawned task.
///
/// Keep-alive and the header read timeout come from the performance config.
/// Each request is bounded separately by `Config::request_timeout` in the
/// router, so long-lived keep-alive connections are not cut mid-request.
/// A shutdown request lets the in-flight request finish, then closes the
/// connection.
fn handle_connection(
    stream: tokio::net::TcpStream,
    peer_addr: std::net::SocketAddr,
    state: Arc<AppState>,
    conn_counter: Arc<AtomicUsize>,
) {
    tokio::spawn(async move {
        let io = TokioIo::new(stream);
        let performance = &state.config.performance;

        let mut builder = http1::Builder::new();
        builder
            .timer(TokioTimer::new())
            .keep_alive(performance.keep_alive)
            .header_read_timeout(Duration::from_secs(performance.read_timeout));

        let service_state = Arc::clone(&state);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| {
                handler::handle_request(req, Arc::clone(&service_state), peer_addr)
            }),
        );
        tokio::pin!(conn);

        let shutdown = config::shutdown_requested(state.subscribe_shutdown());
        let served = tokio::select! {
            result = conn.as_mut() => result,
            () = shutdown => {
                conn.as_mut().graceful_shutdown();
                conn.as_mut().await
            }
        };

        if let Err(err) = served {
            logger::log_connection_error(&err);
        }

        conn_counter.fetch_sub(1, Ordering::SeqCst);
    });
}
