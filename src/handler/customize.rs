//! Customization endpoint
//!
//! Reads a bounded request body, validates it and answers with the model asset.

use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::{Response, StatusCode};

use crate::api::{self, ApiError, CustomizationRequest, CustomizationResponse};
use crate::logger::{self, LogLevel};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Handle `POST /customize`
pub async fn handle_customize<B>(body: B, max_body_size: u64) -> Response<Full<Bytes>>
where
    B: Body,
    B::Error: Into<BoxError>,
{
    let result = match read_body(body, max_body_size).await {
        Ok(bytes) => customize(&bytes),
        Err(e) => Err(e),
    };

    match result {
        Ok(response) => api::json_response(StatusCode::OK, &response),
        Err(e) => {
            logger::log_warning(&format!("Rejected customization request: {e}"));
            api::error_response(&e)
        }
    }
}

/// Validate a raw body and pick the model for it
pub fn customize(body: &[u8]) -> Result<CustomizationResponse, ApiError> {
    let request = CustomizationRequest::from_slice(body)?;

    // shoe type and description do not influence the model yet
    if logger::enabled(LogLevel::Debug) {
        logger::log_debug(&format!(
            "customize: shoeType={:?} description_len={} (inputs unused for model selection)",
            request.shoe_type,
            request.description.len()
        ));
    }

    Ok(CustomizationResponse::from(&request))
}

/// Collect the body, failing once more than `limit` bytes arrive
async fn read_body<B>(body: B, limit: u64) -> Result<Bytes, ApiError>
where
    B: Body,
    B::Error: Into<BoxError>,
{
    let max = usize::try_from(limit).unwrap_or(usize::MAX);
    match Limited::new(body, max).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            Err(ApiError::PayloadTooLarge { limit })
        }
        Err(e) => Err(ApiError::BodyRead(e.to_string())),
    }
}
