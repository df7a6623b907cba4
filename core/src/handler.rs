//! Response handlers: raw `HttpResponse` in, `ApiResponse<T>` out.
//!
//! One handler per result type. Push and validate share
//! `PushResponseHandler`; schedule creation and update share
//! `ScheduleResponseHandler`.

use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::http::HttpResponse;
use crate::response::{
    ApiResponse, ListAllSchedulesResponse, ListTagsResponse, PushResponse, ScheduleResponse,
    VendorError,
};
use crate::schedule::SchedulePayload;

pub trait ResponseHandler {
    type Output: DeserializeOwned;

    /// Parse `response`. Only a malformed 2xx body is an error; any 4xx/5xx
    /// becomes a `VendorError` inside the returned `ApiResponse`.
    fn handle(&self, response: HttpResponse) -> Result<ApiResponse<Self::Output>, ApiError> {
        parse_response(response)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PushResponseHandler;

impl ResponseHandler for PushResponseHandler {
    type Output = PushResponse;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ScheduleResponseHandler;

impl ResponseHandler for ScheduleResponseHandler {
    type Output = ScheduleResponse;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ListAllSchedulesResponseHandler;

impl ResponseHandler for ListAllSchedulesResponseHandler {
    type Output = ListAllSchedulesResponse;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ListScheduleResponseHandler;

impl ResponseHandler for ListScheduleResponseHandler {
    type Output = SchedulePayload;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ListTagsResponseHandler;

impl ResponseHandler for ListTagsResponseHandler {
    type Output = ListTagsResponse;
}

/// Shared parsing for every handler.
///
/// An empty 2xx body is read as `{}` so results made only of defaulted
/// fields still parse.
pub fn parse_response<T: DeserializeOwned>(response: HttpResponse) -> Result<ApiResponse<T>, ApiError> {
    let status = response.status;

    if response.is_success() {
        let body = match response.body.trim() {
            "" => "{}",
            body => body,
        };
        let parsed = serde_json::from_str(body)
            .map_err(|source| ApiError::Deserialization { status, source })?;
        return Ok(ApiResponse {
            status,
            result: Ok(parsed),
        });
    }

    Ok(ApiResponse {
        status,
        result: Err(vendor_error(status, &response.body)),
    })
}

/// Parse a vendor error body, or synthesize one from the raw text when the
/// body is not a recognisable error document.
fn vendor_error(status: u16, body: &str) -> VendorError {
    match serde_json::from_str::<VendorError>(body) {
        Ok(err) if !err.is_empty() => err,
        _ => {
            let text = body.trim();
            let error = if text.is_empty() {
                ureq::http::StatusCode::from_u16(status)
                    .ok()
                    .and_then(|s| s.canonical_reason())
                    .map_or_else(|| format!("HTTP {status}"), str::to_string)
            } else {
                text.to_string()
            };
            VendorError {
                ok: false,
                error: Some(error),
                ..VendorError::default()
            }
        }
    }
}
