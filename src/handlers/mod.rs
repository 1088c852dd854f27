// handlers/mod.rs - two-tier handler layout
//
// Public (allow-listed, no token) and Protected (Bearer token via auth_guard).
pub mod protected;
pub mod public;

use axum::body::Bytes;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::filter::ListRequest;

/// `?id=` query used by get-by-id and toggle routes
#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id: Option<String>,
}

impl IdQuery {
    pub fn parse(&self) -> Result<Uuid, ApiError> {
        let raw = self
            .id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ApiError::bad_request("Query parameter id is required"))?;
        Uuid::parse_str(raw).map_err(|_| ApiError::bad_request(format!("Invalid id: {}", raw)))
    }
}

/// `/get/all` body; an empty body lists everything with default ordering.
pub fn list_request(body: &Bytes) -> Result<ListRequest, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ListRequest::default());
    }
    serde_json::from_slice(body).map_err(|e| ApiError::bad_request(format!("Invalid list request: {}", e)))
}
