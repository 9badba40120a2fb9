//! HTTP request handlers for the gateway API
//!
//! Handlers validate path and query input, call the upstream service
//! through the state's trait objects and relay the result.

pub mod devices;
pub mod telemetry;

use serde::Serialize;

use crate::error::ApiError;

/// Acknowledgement body for fire-and-forget calls
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Parse a numeric path identifier, reporting `what` on failure
pub(crate) fn parse_id(raw: &str, what: &str) -> Result<u64, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid {} ID", what)))
}
