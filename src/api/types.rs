// API types module
// Request/response bodies of the customization endpoint

use serde::Serialize;
use serde_json::{Map, Value};

use super::error::ApiError;

/// Asset returned for every customization request
pub const BASKET_MODEL_PATH: &str = "/src/models/basket.glb";

/// Body of `POST /customize`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomizationRequest {
    pub shoe_type: String,
    pub description: String,
}

impl CustomizationRequest {
    /// Parse and validate a raw request body.
    ///
    /// Both keys must be present and hold strings; any other keys are ignored.
    pub fn from_slice(body: &[u8]) -> Result<Self, ApiError> {
        let value: Value =
            serde_json::from_slice(body).map_err(|e| ApiError::InvalidJson(e.to_string()))?;

        let Value::Object(fields) = value else {
            return Err(ApiError::NotAnObject);
        };

        Ok(Self {
            shoe_type: required_string(&fields, "shoeType")?,
            description: required_string(&fields, "description")?,
        })
    }
}

fn required_string(fields: &Map<String, Value>, name: &'static str) -> Result<String, ApiError> {
    match fields.get(name) {
        None => Err(ApiError::MissingField(name)),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(ApiError::InvalidFieldType {
            field: name,
            expected: "string",
        }),
    }
}

/// Success body of `POST /customize`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomizationResponse {
    pub model: String,
}

/// Pick the model asset for a request.
///
/// Every request currently maps to the basket model; shoe type and
/// description are accepted but do not take part in the choice.
pub const fn select_model(_request: &CustomizationRequest) -> &'static str {
    BASKET_MODEL_PATH
}

impl From<&CustomizationRequest> for CustomizationResponse {
    fn from(request: &CustomizationRequest) -> Self {
        Self {
            model: select_model(request).to_string(),
        }
    }
}
