// handlers/mod.rs - three security tiers
//
// Public (no token) -> Protected (valid bearer token, per-route role guards)
// -> Elevated (owner only)

pub mod elevated;
pub mod protected;
pub mod public;

use axum::body::Bytes;
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// Parse a JSON body that callers may omit entirely.
pub(crate) fn optional_json<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| ApiError::invalid_json(format!("Invalid JSON body: {}", e)))
}

/// Trimmed, required string field
pub(crate) fn required(field: &str, value: &str) -> Result<String, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::field_error(field, format!("{} is required", field)));
    }
    Ok(value.to_string())
}

/// Trimmed optional field; blank counts as absent
pub(crate) fn optional(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
