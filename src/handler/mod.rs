//! Request handler module
//!
//! Routes requests to the customization endpoint, health checks and
//! protocol-level responses.

pub mod customize;
pub mod router;

// Re-export main entry point
pub use router::handle_request;
