// API error module
// Typed failure outcomes of reading and validating a customization request

use hyper::StatusCode;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("Request body must be a JSON object")]
    NotAnObject,

    #[error("Missing required field '{0}'")]
    MissingField(&'static str),

    #[error("Field '{field}' must be a {expected}")]
    InvalidFieldType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("Request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: u64 },

    #[error("Failed to read request body: {0}")]
    BodyRead(String),

    #[error("Request not completed within {secs} seconds")]
    RequestTimeout { secs: u64 },
}

impl ApiError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::RequestTimeout { .. } => StatusCode::REQUEST_TIMEOUT,
            Self::InvalidJson(_)
            | Self::NotAnObject
            | Self::MissingField(_)
            | Self::InvalidFieldType { .. }
            | Self::BodyRead(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Stable machine-readable identifier used in error bodies
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidJson(_) => "invalid_json",
            Self::NotAnObject => "not_an_object",
            Self::MissingField(_) => "missing_field",
            Self::InvalidFieldType { .. } => "invalid_field_type",
            Self::PayloadTooLarge { .. } => "payload_too_large",
            Self::BodyRead(_) => "body_read",
            Self::RequestTimeout { .. } => "request_timeout",
        }
    }
}
