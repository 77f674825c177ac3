//! Request routing dispatch module
//!
//! Entry point for HTTP request processing, responsible for method validation, route matching, and dispatching.

use crate::api;
use crate::config::AppState;
use crate::handler::customize;
use crate::http;
use crate::logger::{self, AccessLogEntry};
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::header::{REFERER, USER_AGENT};
use hyper::{HeaderMap, Method, Request, Response, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

pub const CUSTOMIZE_PATH: &str = "/customize";
const CUSTOMIZE_ALLOW: &str = "POST, OPTIONS";
const HEALTH_ALLOW: &str = "GET, HEAD";

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    remote_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let started = Instant::now();
    let (parts, body) = req.into_parts();
    let path = parts.uri.path().to_string();

    let limit = state.config.request_timeout();
    let routed = route_request(&parts.method, &path, &parts.headers, body, &state);
    let mut response = match tokio::time::timeout(limit, routed).await {
        Ok(resp) => resp,
        Err(_) => {
            logger::log_warning(&format!(
                "Request {} {path} from {remote_addr} timed out after {} seconds",
                parts.method,
                limit.as_secs()
            ));
            api::error_response(&api::ApiError::RequestTimeout {
                secs: limit.as_secs(),
            })
        }
    };

    let http_config = &state.config.http;
    http::apply_common_headers(&mut response, &http_config.server_name, http_config.enable_cors);

    let logging = &state.config.logging;
    if logging.access_log {
        let mut entry = AccessLogEntry::new(
            remote_addr.ip().to_string(),
            parts.method.to_string(),
            path,
        );
        entry.query = parts.uri.query().map(ToString::to_string);
        entry.http_version = version_label(parts.version).to_string();
        entry.status = response.status().as_u16();
        entry.body_bytes = response
            .body()
            .size_hint()
            .exact()
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0);
        entry.referer = header_string(&parts.headers, REFERER);
        entry.user_agent = header_string(&parts.headers, USER_AGENT);
        entry.request_time = started.elapsed();
        logger::log_access(&entry, &logging.access_log_format);
    }

    Ok(response)
}

/// Route request based on method and path
async fn route_request<B>(
    method: &Method,
    path: &str,
    headers: &HeaderMap,
    body: B,
    state: &AppState,
) -> Response<Full<Bytes>>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let config = &state.config;

    // Health checks first, they must stay cheap
    let health = &config.routes.health;
    if health.enabled && (path == health.liveness_path || path == health.readiness_path) {
        return match *method {
            Method::GET | Method::HEAD => {
                let draining = path == health.readiness_path && state.is_shutting_down();
                http::build_health_response(!draining, *method == Method::HEAD)
            }
            _ => api::method_not_allowed(HEALTH_ALLOW),
        };
    }

    if path != CUSTOMIZE_PATH {
        logger::log_debug(&format!("No route for {method} {path}"));
        return api::not_found(path);
    }

    match *method {
        Method::POST => {
            if let Some(resp) = check_body_size(headers, config.http.max_body_size) {
                return resp;
            }
            customize::handle_customize(body, config.http.max_body_size).await
        }
        Method::OPTIONS => http::build_options_response(CUSTOMIZE_ALLOW, config.http.enable_cors),
        _ => {
            logger::log_warning(&format!("Method not allowed: {method} {path}"));
            api::method_not_allowed(CUSTOMIZE_ALLOW)
        }
    }
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size(headers: &HeaderMap, max_body_size: u64) -> Option<Response<Full<Bytes>>> {
    let content_length = headers.get(hyper::header::CONTENT_LENGTH)?;
    content_length.to_str().map_or_else(
        |_| {
            logger::log_warning("Content-Length header contains non-ASCII characters");
            None
        },
        |size_str| match size_str.parse::<u64>() {
            Ok(size) if size > max_body_size => {
                logger::log_warning(&format!(
                    "Request body too large: {size} bytes (max: {max_body_size})"
                ));
                Some(api::error_response(&api::ApiError::PayloadTooLarge {
                    limit: max_body_size,
                }))
            }
            Err(_) => {
                logger::log_warning(&format!(
                    "Invalid Content-Length value: '{size_str}', relying on streamed limit"
                ));
                None
            }
            _ => None,
        },
    )
}

fn header_string(headers: &HeaderMap, name: hyper::header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

const fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::BASKET_MODEL_PATH;
    use crate::config::Config;
    use http_body_util::BodyExt;
    use hyper::StatusCode;

    fn test_state(configure: impl FnOnce(&mut Config)) -> Arc<AppState> {
        let mut config = Config::default();
        config.logging.access_log = false;
        configure(&mut config);
        Arc::new(AppState::new(config))
    }

    fn remote() -> SocketAddr {
        "127.0.0.1:50000".parse().unwrap()
    }

    async fn send(
        state: &Arc<AppState>,
        method: Method,
        path: &str,
        body: &str,
    ) -> (StatusCode, HeaderMap, Bytes) {
        let req = Request::builder()
            .method(method)
            .uri(path)
            .header("content-type", "application/json")
            .body(Full::new(Bytes::from(body.to_string())))
            .unwrap();
        let resp = handle_request(req, Arc::clone(state), remote()).await.unwrap();
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        (status, headers, bytes)
    }

    fn json(bytes: &Bytes) -> serde_json::Value {
        serde_json::from_slice(bytes).unwrap()
    }

    #[tokio::test]
    async fn test_customize_returns_constant_model() {
        let state = test_state(|_| {});
        let (status, headers, body) = send(
            &state,
            Method::POST,
            "/customize",
            r#"{"shoeType": "running", "description": "red with white laces"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers["content-type"], "application/json");
        assert_eq!(headers["server"], "shoe-customizer");
        assert_eq!(json(&body), serde_json::json!({"model": "/src/models/basket.glb"}));
    }

    #[tokio::test]
    async fn test_customize_is_idempotent() {
        let state = test_state(|_| {});
        let request = r#"{"shoeType": "Jordan", "description": "black"}"#;
        let first = send(&state, Method::POST, "/customize", request).await;
        let second = send(&state, Method::POST, "/customize", request).await;
        assert_eq!(first.0, StatusCode::OK);
        assert_eq!(first.0, second.0);
        assert_eq!(first.2, second.2);
    }

    #[tokio::test]
    async fn test_output_independent_of_input() {
        let state = test_state(|_| {});
        for body in [
            r#"{"shoeType": "", "description": ""}"#,
            r#"{"shoeType": "Dunk", "description": "x", "extra": [1, 2]}"#,
            r#"{"description": "ünïcödé", "shoeType": "trail"}"#,
        ] {
            let (status, _, bytes) = send(&state, Method::POST, "/customize", body).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(json(&bytes)["model"], BASKET_MODEL_PATH);
        }
    }

    #[tokio::test]
    async fn test_missing_fields_are_client_errors() {
        let state = test_state(|_| {});
        for body in [
            "{}",
            r#"{"description": "red"}"#,
            r#"{"shoeType": "running"}"#,
        ] {
            let (status, _, bytes) = send(&state, Method::POST, "/customize", body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body}");
            let value = json(&bytes);
            assert!(value.get("model").is_none());
            assert_eq!(value["error"]["kind"], "missing_field");
        }
    }

    #[tokio::test]
    async fn test_non_json_body_is_client_error() {
        let state = test_state(|_| {});
        let (status, _, bytes) =
            send(&state, Method::POST, "/customize", "shoeType=running").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json(&bytes)["error"]["kind"], "invalid_json");
    }

    #[tokio::test]
    async fn test_content_length_over_limit() {
        let state = test_state(|c| c.http.max_body_size = 16);
        let req = Request::builder()
            .method(Method::POST)
            .uri("/customize")
            .header("content-length", "1000")
            .body(Full::new(Bytes::from_static(b"{}")))
            .unwrap();
        let resp = handle_request(req, state, remote()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_wrong_method_on_customize() {
        let state = test_state(|_| {});
        let (status, headers, _) = send(&state, Method::GET, "/customize", "").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(headers["allow"], "POST, OPTIONS");
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_found() {
        let state = test_state(|_| {});
        let (status, _, bytes) = send(&state, Method::POST, "/customise", "{}").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json(&bytes)["error"]["code"], 404);
    }

    #[tokio::test]
    async fn test_preflight_with_cors() {
        let state = test_state(|c| c.http.enable_cors = true);
        let (status, headers, _) = send(&state, Method::OPTIONS, "/customize", "").await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(headers["access-control-allow-origin"], "*");
        assert_eq!(headers["access-control-allow-methods"], "POST, OPTIONS");
    }

    #[tokio::test]
    async fn test_health_checks() {
        let state = test_state(|_| {});
        let (status, _, body) = send(&state, Method::GET, "/healthz", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(&body[..], b"ok");

        let (status, _, body) = send(&state, Method::HEAD, "/readyz", "").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.is_empty());

        state.request_shutdown();
        let (status, _, body) = send(&state, Method::GET, "/readyz", "").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(&body[..], b"draining");

        // Liveness is unaffected by shutdown
        let (status, _, body) = send(&state, Method::GET, "/healthz", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn test_health_disabled_falls_through_to_not_found() {
        let state = test_state(|c| c.routes.health.enabled = false);
        let (status, _, _) = send(&state, Method::GET, "/healthz", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    /// Body that never yields a frame, like a client that stalls mid-upload
    struct StalledBody;

    impl Body for StalledBody {
        type Data = Bytes;
        type Error = Infallible;

        fn poll_frame(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<Option<Result<hyper::body::Frame<Bytes>, Infallible>>> {
            std::task::Poll::Pending
        }
    }

    #[tokio::test]
    async fn test_stalled_request_times_out() {
        let state = test_state(|c| {
            c.performance.read_timeout = 1;
            c.performance.write_timeout = 1;
        });
        let req = Request::builder()
            .method(Method::POST)
            .uri("/customize")
            .body(StalledBody)
            .unwrap();

        let resp = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            handle_request(req, state, remote()),
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(resp.status(), StatusCode::REQUEST_TIMEOUT);
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(json(&bytes)["error"]["kind"], "request_timeout");
    }

    #[tokio::test]
    async fn test_access_log_enabled_does_not_change_response() {
        let state = test_state(|c| {
            c.logging.access_log = true;
            c.logging.access_log_format = "json".to_string();
        });
        let (status, _, _) = send(
            &state,
            Method::POST,
            "/customize",
            r#"{"shoeType": "a", "description": "b"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
}
