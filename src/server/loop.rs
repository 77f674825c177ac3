// Server loop module
// Accepts connections until shutdown, then drains in-flight connections

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use super::connection::accept_connection;
use crate::config::{self, AppState};
use crate::logger;

/// How often the drain phase re-checks the active connection count
const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Run the accept loop on `listener` until shutdown is requested.
///
/// Returns the number of connections still open when the grace period
/// (`performance.shutdown_grace`) ran out.
pub async fn start_server_loop(
    listener: TcpListener,
    state: Arc<AppState>,
    active_connections: Arc<AtomicUsize>,
) -> usize {
    let shutdown = config::shutdown_requested(state.subscribe_shutdown());
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &active_connections);
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            () = &mut shutdown => {
                logger::log_info("Stopped accepting new connections");
                break;
            }
        }
    }

    // Close the listening socket before waiting on open connections
    drop(listener);

    let grace = Duration::from_secs(state.config.performance.shutdown_grace);
    drain_connections(&active_connections, grace).await
}

/// Wait until no connections remain or `grace` elapses
async fn drain_connections(active_connections: &AtomicUsize, grace: Duration) -> usize {
    let deadline = tokio::time::Instant::now() + grace;

    loop {
        let remaining = active_connections.load(Ordering::SeqCst);
        if remaining == 0 || tokio::time::Instant::now() >= deadline {
            return remaining;
        }
        tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::server::create_listener;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    async fn spawn_server(
        configure: impl FnOnce(&mut Config),
    ) -> (
        std::net::SocketAddr,
        Arc<AppState>,
        tokio::task::JoinHandle<usize>,
    ) {
        let mut config = Config::default();
        config.logging.access_log = false;
        config.performance.shutdown_grace = 1;
        configure(&mut config);

        let listener = create_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(AppState::new(config));
        let handle = tokio::spawn(start_server_loop(
            listener,
            Arc::clone(&state),
            Arc::new(AtomicUsize::new(0)),
        ));
        (addr, state, handle)
    }

    async fn raw_request(addr: std::net::SocketAddr, request: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    fn post_customize(body: &str) -> String {
        format!(
            "POST /customize HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    #[tokio::test]
    async fn test_round_trip_over_tcp() {
        let (addr, state, handle) = spawn_server(|_| {}).await;

        let response = raw_request(
            addr,
            &post_customize(r#"{"shoeType": "running", "description": "red with white laces"}"#),
        )
        .await;
        assert!(response.starts_with("HTTP/1.1 200 OK"), "{response}");
        assert!(response.ends_with(r#"{"model":"/src/models/basket.glb"}"#), "{response}");

        let response = raw_request(addr, &post_customize("{}")).await;
        assert!(response.starts_with("HTTP/1.1 400 Bad Request"), "{response}");

        state.request_shutdown();
        let remaining = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(remaining, 0);
    }

    #[tokio::test]
    async fn test_listener_closed_after_shutdown() {
        let (addr, state, handle) = spawn_server(|_| {}).await;
        state.request_shutdown();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(TcpStream::connect(addr).await.is_err());
    }

    #[tokio::test]
    async fn test_connection_limit_rejects_extra_connections() {
        let (addr, state, handle) = spawn_server(|c| c.performance.max_connections = Some(0)).await;

        let mut stream = TcpStream::connect(addr).await.unwrap();
        let _ = stream.write_all(post_customize("{}").as_bytes()).await;
        let mut buf = Vec::new();
        let read = stream.read_to_end(&mut buf).await;
        // Rejected connections are closed without an HTTP response
        assert!(read.is_err() || buf.is_empty());

        state.request_shutdown();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_drain_returns_when_idle() {
        let counter = AtomicUsize::new(0);
        assert_eq!(drain_connections(&counter, Duration::from_secs(5)).await, 0);

        counter.store(2, Ordering::SeqCst);
        assert_eq!(drain_connections(&counter, Duration::from_millis(60)).await, 2);
    }
}
