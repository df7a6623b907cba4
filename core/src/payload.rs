//! JSON encoding for request payloads.

use serde::Serialize;

use crate::error::ApiError;

/// A request body the client can send.
///
/// Implemented by the push, schedule and tag payload types. The default
/// `to_json` covers every `Serialize` type.
pub trait JsonPayload: Serialize {
    fn to_json(&self) -> Result<String, ApiError> {
        serde_json::to_string(self).map_err(ApiError::Serialization)
    }
}
