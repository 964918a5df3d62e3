//! Request encoding.
//!
//! `encode` validates a request object and serializes it to the JSON the
//! service expects. Field omission rules live on the types themselves
//! (`skip_serializing_if`), so encoding the same unchanged object always
//! yields the same bytes.

use serde::Serialize;

use crate::error::ApiError;
use crate::types::parameters::{Parameters, DEFAULT_KEY};

/// A request body the client can send.
pub trait Encode: Serialize {
    /// Check structural preconditions before anything goes on the wire.
    fn validate(&self) -> Result<(), ApiError> {
        Ok(())
    }
}

/// Validate and serialize `value` to its JSON wire form.
pub fn encode<T: Encode + ?Sized>(value: &T) -> Result<String, ApiError> {
    value.validate()?;
    serde_json::to_string(value).map_err(|e| ApiError::Encoding(e.to_string()))
}

pub(crate) fn require_non_empty(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::Encoding(format!("{field} must not be empty")));
    }
    Ok(())
}

pub(crate) fn require_no_blank(field: &str, values: &[String]) -> Result<(), ApiError> {
    if values.iter().any(|v| v.trim().is_empty()) {
        return Err(ApiError::Encoding(format!("{field} contains an empty entry")));
    }
    Ok(())
}

pub(crate) fn require_recipients(field: &str, values: &[String]) -> Result<(), ApiError> {
    if values.is_empty() {
        return Err(ApiError::Encoding(format!("{field} requires at least one recipient")));
    }
    require_no_blank(field, values)
}

pub(crate) fn require_parameters(parameters: &Parameters) -> Result<(), ApiError> {
    match parameters.reserved_key_conflict() {
        Some(name) => Err(ApiError::Encoding(format!(
            "parameter {name} uses the reserved recipient key {DEFAULT_KEY:?}"
        ))),
        None => Ok(()),
    }
}
