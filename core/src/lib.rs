//! Synchronous client for the Urban Airship push API.
//!
//! # Overview
//! `ApiClient` sends push notifications, manages scheduled pushes and tags.
//! Every call is one blocking round-trip: build the request, authenticate
//! it, send it, parse the response.
//!
//! # Design
//! - `ApiClient` is immutable after construction; `ClientConfig` (or the
//!   chaining `ApiClientBuilder`) is validated once, up front.
//! - Each operation also has a `build_*` form that returns the provisioned
//!   `HttpRequest` without sending it, and a `ResponseHandler` that parses a
//!   raw `HttpResponse`, so the I/O boundary stays explicit.
//! - Vendor error bodies come back inside `ApiResponse`; only argument,
//!   encoding and transport problems are `ApiError`s.
//!
//! ```no_run
//! use airship_core::{ApiClient, DeviceTypes, PushPayload, Selector};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ApiClient::builder().key("app-key").secret("master-secret").build()?;
//! let payload = PushPayload::new(Selector::tag("sports"), DeviceTypes::All).with_alert("Goal!");
//! let response = client.push(&payload)?;
//! match response.result {
//!     Ok(push) => println!("sent {:?}", push.push_ids),
//!     Err(err) => eprintln!("rejected with {}: {err}", response.status),
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod executor;
pub mod handler;
pub mod http;
pub mod payload;
pub mod provision;
pub mod push;
pub mod response;
pub mod schedule;
pub mod tag;

pub use client::{ApiClient, ApiClientBuilder};
pub use config::{ClientConfig, Credentials, ProxyHost, ProxyInfo};
pub use error::{ApiError, ConfigError};
pub use executor::{AuthScope, Executor};
pub use handler::ResponseHandler;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use payload::JsonPayload;
pub use push::{DeviceType, DeviceTypes, Notification, PushPayload, Selector};
pub use response::{
    ApiResponse, ErrorDetails, ErrorLocation, ListAllSchedulesResponse, ListTagsResponse,
    PushResponse, ScheduleResponse, VendorError,
};
pub use schedule::{Order, Schedule, SchedulePayload};
pub use tag::{
    AddRemove, AddRemoveDeviceFromTagPayload, BatchModificationPayload, BatchTagSet,
    DeviceIdentifier,
};
