// API module entry
// Wire types, validation and JSON responses of the customization endpoint

mod error;
mod response;
mod types;

pub use error::ApiError;
pub use response::{error_response, json_response, method_not_allowed, not_found};
pub use types::{CustomizationRequest, CustomizationResponse, BASKET_MODEL_PATH};
