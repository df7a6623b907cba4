//! Typed results returned by the API operations.
//!
//! # Design
//! `ApiResponse` pairs the HTTP status with either the parsed success body
//! or the parsed vendor error body. A 4xx/5xx from the API is therefore a
//! normal return value; only transport failures surface as `ApiError`.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schedule::SchedulePayload;

/// Typed response wrapper.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse<T> {
    pub status: u16,
    pub result: Result<T, VendorError>,
}

impl<T> ApiResponse<T> {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    pub fn ok(&self) -> Option<&T> {
        self.result.as_ref().ok()
    }

    pub fn error(&self) -> Option<&VendorError> {
        self.result.as_ref().err()
    }

    pub fn into_result(self) -> Result<T, VendorError> {
        self.result
    }
}

/// Error body returned by the API on 4xx/5xx.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorError {
    #[serde(default)]
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<ErrorDetails>,
}

impl VendorError {
    /// True when none of the error fields were present.
    pub(crate) fn is_empty(&self) -> bool {
        self.error.is_none() && self.error_code.is_none() && self.details.is_none()
    }
}

impl fmt::Display for VendorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.error.as_deref().unwrap_or("unknown error"))?;
        if let Some(code) = self.error_code {
            write!(f, " (code {code})")?;
        }
        if let Some(detail) = self.details.as_ref().and_then(|d| d.error.as_deref()) {
            write!(f, ": {detail}")?;
        }
        Ok(())
    }
}

impl std::error::Error for VendorError {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// JSON path of the offending field in the request body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<ErrorLocation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorLocation {
    pub line: u32,
    pub column: u32,
}

/// Result of a push or validate call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub operation_id: Option<Uuid>,
    #[serde(default)]
    pub push_ids: Vec<Uuid>,
}

/// Result of creating or updating a schedule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub operation_id: Option<Uuid>,
    #[serde(default)]
    pub schedule_urls: Vec<String>,
    #[serde(default)]
    pub schedules: Vec<SchedulePayload>,
}

/// One page of schedules.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListAllSchedulesResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub total_count: usize,
    /// Absolute URL of the following page, if any.
    #[serde(default)]
    pub next_page: Option<String>,
    #[serde(default)]
    pub schedules: Vec<SchedulePayload>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListTagsResponse {
    #[serde(default)]
    pub tags: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vendor_error_display_includes_code_and_detail() {
        let err: VendorError = serde_json::from_str(
            r#"{"ok":false,"error":"Could not parse request body.","error_code":40001,
                "details":{"error":"Unexpected token","location":{"line":1,"column":12}}}"#,
        )
        .unwrap();
        assert_eq!(
            err.to_string(),
            "Could not parse request body. (code 40001): Unexpected token"
        );
        assert_eq!(
            err.details.unwrap().location,
            Some(ErrorLocation { line: 1, column: 12 })
        );
    }

    #[test]
    fn empty_vendor_error_detected() {
        let err: VendorError = serde_json::from_str(r#"{"ok":false}"#).unwrap();
        assert!(err.is_empty());
    }

    #[test]
    fn accessors_follow_result() {
        let resp = ApiResponse {
            status: 200,
            result: Ok(ListTagsResponse { tags: vec!["a".into()] }),
        };
        assert!(resp.is_ok());
        assert_eq!(resp.ok().unwrap().tags, vec!["a".to_string()]);
        assert!(resp.error().is_none());

        let resp: ApiResponse<ListTagsResponse> = ApiResponse {
            status: 401,
            result: Err(VendorError::default()),
        };
        assert!(!resp.is_ok());
        assert!(resp.into_result().is_err());
    }
}
