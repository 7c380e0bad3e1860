//! JSON framing helpers.

use crate::error::LexError;
use crate::ops::operations::{Request, Response};

/// Serialize a request to pretty JSON.
///
/// # Errors
///
/// Returns an internal error if serialization fails.
pub fn to_json_pretty(request: &Request) -> Result<String, LexError> {
    serde_json::to_string_pretty(request).map_err(|e| LexError::internal(format!("serialize request: {e}")))
}

/// Deserialize a request from JSON.
///
/// Callers should then invoke `request.validate()` before executing.
///
/// # Errors
///
/// Returns an internal error if `s` is not a valid request.
pub fn from_json(s: &str) -> Result<Request, LexError> {
    serde_json::from_str::<Request>(s).map_err(|e| LexError::internal(format!("deserialize request: {e}")))
}

/// Serialize a response to pretty JSON.
///
/// # Errors
///
/// Returns an internal error if serialization fails.
pub fn response_to_json_pretty(response: &Response) -> Result<String, LexError> {
    serde_json::to_string_pretty(response).map_err(|e| LexError::internal(format!("serialize response: {e}")))
}
