// API response utility functions module

use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use serde::Serialize;

use super::error::ApiError;

/// Build JSON response
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let json = match serde_json::to_vec(body) {
        Ok(j) => j,
        Err(e) => {
            logger::log_error(&format!("Failed to serialize response: {e}"));
            return error_body(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal",
                "Internal server error",
            );
        }
    };

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(json)))
        .unwrap_or_else(|e| {
            logger::log_error(&format!("Failed to build response: {e}"));
            Response::new(Full::new(Bytes::from("Error")))
        })
}

/// Structured error body: `{"error": {"code", "kind", "message"}}`
fn error_body(status: StatusCode, kind: &str, message: &str) -> Response<Full<Bytes>> {
    let body = serde_json::json!({
        "error": {
            "code": status.as_u16(),
            "kind": kind,
            "message": message
        }
    });
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::from(message.to_string()))))
}

/// Response for a failed customization request
pub fn error_response(err: &ApiError) -> Response<Full<Bytes>> {
    error_body(err.status(), err.kind(), &err.to_string())
}

/// 404 Not Found response
pub fn not_found(path: &str) -> Response<Full<Bytes>> {
    error_body(
        StatusCode::NOT_FOUND,
        "not_found",
        &format!("No route for '{path}', available: POST /customize"),
    )
}

/// 405 Method Not Allowed response
pub fn method_not_allowed(allow: &str) -> Response<Full<Bytes>> {
    let mut resp = error_body(
        StatusCode::METHOD_NOT_ALLOWED,
        "method_not_allowed",
        &format!("Allowed methods: {allow}"),
    );
    if let Ok(value) = allow.parse() {
        resp.headers_mut().insert(hyper::header::ALLOW, value);
    }
    resp
}
