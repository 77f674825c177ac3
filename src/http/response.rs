//! HTTP response building module
//!
//! Protocol-level responses and headers, independent of the customization API.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, ACCESS_CONTROL_ALLOW_ORIGIN, SERVER};
use hyper::{Response, StatusCode};

/// Build OPTIONS response (preflight request)
pub fn build_options_response(allow: &'static str, enable_cors: bool) -> Response<Full<Bytes>> {
    let mut builder = Response::builder().status(204).header("Allow", allow);

    if enable_cors {
        builder = builder
            .header("Access-Control-Allow-Methods", allow)
            .header("Access-Control-Allow-Headers", "Content-Type")
            .header("Access-Control-Max-Age", "86400");
    }

    builder.body(Full::new(Bytes::new())).unwrap_or_else(|e| {
        log_build_error("OPTIONS", &e);
        Response::new(Full::new(Bytes::new()))
    })
}

/// Build health check response (liveness/readiness)
///
/// `200 ok` while serving, `503 draining` once the server is shutting down.
pub fn build_health_response(serving: bool, is_head: bool) -> Response<Full<Bytes>> {
    let (code, status) = if serving {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "draining")
    };
    let body = if is_head {
        Bytes::new()
    } else {
        Bytes::from_static(status.as_bytes())
    };

    Response::builder()
        .status(code)
        .header("Content-Type", "text/plain")
        .header("Content-Length", status.len())
        .header("Cache-Control", "no-cache")
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error("health", &e);
            Response::new(Full::new(Bytes::from_static(status.as_bytes())))
        })
}

/// Add headers every response carries: `Server`, plus the CORS origin when enabled
pub fn apply_common_headers(
    resp: &mut Response<Full<Bytes>>,
    server_name: &str,
    enable_cors: bool,
) {
    let headers = resp.headers_mut();
    if let Ok(value) = HeaderValue::from_str(server_name) {
        headers.insert(SERVER, value);
    }
    if enable_cors {
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    }
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_without_cors() {
        let resp = build_options_response("POST, OPTIONS", false);
        assert_eq!(resp.status(), 204);
        assert_eq!(resp.headers()["allow"], "POST, OPTIONS");
        assert!(resp.headers().get("access-control-allow-methods").is_none());
    }

    #[test]
    fn test_options_with_cors() {
        let resp = build_options_response("POST, OPTIONS", true);
        assert_eq!(resp.headers()["access-control-allow-methods"], "POST, OPTIONS");
        assert_eq!(resp.headers()["access-control-allow-headers"], "Content-Type");
    }

    #[test]
    fn test_health_response_draining_is_unavailable() {
        let resp = build_health_response(false, false);
        assert_eq!(resp.status(), 503);
        assert_eq!(resp.headers()["content-length"], "8");

        assert_eq!(build_health_response(true, false).status(), 200);
    }

    #[test]
    fn test_common_headers() {
        let mut resp = build_health_response(true, false);
        apply_common_headers(&mut resp, "shoe-customizer", true);
        assert_eq!(resp.headers()["server"], "shoe-customizer");
        assert_eq!(resp.headers()["access-control-allow-origin"], "*");

        let mut resp = build_health_response(true, true);
        apply_common_headers(&mut resp, "shoe-customizer", false);
        assert!(resp.headers().get("access-control-allow-origin").is_none());
    }
}
