//! Error types for the Airship API client.
//!
//! # Design
//! Two enums, split by when they can happen. `ConfigError` only comes out of
//! client construction. `ApiError` covers a single call: argument checks that
//! fire before anything is sent, payload encoding, transport failures, and a
//! success body that does not match the expected type.
//!
//! Well-formed vendor error responses (4xx/5xx with a JSON body) are not
//! errors here. They are returned inside `ApiResponse` so callers can branch
//! on the status.

use thiserror::Error;

/// Errors raised while validating a `ClientConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required field was absent or blank. Carries the field name.
    #[error("{0} needed to build ApiClient")]
    MissingField(&'static str),

    #[error("invalid base URI {uri:?}: {reason}")]
    InvalidBaseUri { uri: String, reason: String },

    #[error("invalid proxy descriptor: {0}")]
    InvalidProxy(String),
}

/// Errors returned by `ApiClient` operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A required argument was blank. Raised before any network activity.
    #[error("{0} is required")]
    MissingArgument(&'static str),

    #[error("invalid URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    /// A 2xx body could not be deserialized into the expected type.
    #[error("deserialization of HTTP {status} body failed: {source}")]
    Deserialization {
        status: u16,
        #[source]
        source: serde_json::Error,
    },

    /// The network call itself failed: connection, TLS, or I/O.
    #[error("transport error: {0}")]
    Transport(#[from] ureq::Error),
}
