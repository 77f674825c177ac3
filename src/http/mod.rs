//! HTTP protocol layer module
//!
//! Protocol-level helpers shared by the router, decoupled from the customization API.

pub mod response;

// Re-export commonly used types
pub use response::{apply_common_headers, build_health_response, build_options_response};
