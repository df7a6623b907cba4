//! Request provisioning: vendor headers on every request and proxy routing
//! for the transport agent.

use tracing::debug;

use crate::config::ProxyInfo;
use crate::error::ConfigError;
use crate::http::HttpRequest;

pub const CONTENT_TYPE: &str = "Content-Type";
pub const ACCEPT: &str = "Accept";
pub const USER_AGENT: &str = "User-Agent";

const VENDOR_MEDIA_TYPE: &str = "application/vnd.urbanairship+json;";
const USER_AGENT_PREFIX: &str = "UARustLib";

/// Reported when the library version cannot be determined.
pub const UNKNOWN_USER_AGENT: &str = "UNKNOWN";

/// `application/vnd.urbanairship+json; version=<N>`
pub fn vendor_media_type(version: u32) -> String {
    format!("{VENDOR_MEDIA_TYPE} version={version}")
}

/// User agent derived from the version this crate was built as.
pub fn user_agent() -> String {
    user_agent_from(option_env!("CARGO_PKG_VERSION"))
}

/// Falls back to `UNKNOWN` rather than failing; the value is only
/// diagnostic.
pub fn user_agent_from(version: Option<&str>) -> String {
    match version.map(str::trim) {
        Some(v) if !v.is_empty() => format!("{USER_AGENT_PREFIX}/{v}"),
        _ => UNKNOWN_USER_AGENT.to_string(),
    }
}

/// Attach the user agent and the versioned media type as both
/// `Content-Type` and `Accept`.
pub fn provision_request(mut request: HttpRequest, version: u32) -> HttpRequest {
    let media_type = vendor_media_type(version);
    request.set_header(USER_AGENT, user_agent());
    request.set_header(CONTENT_TYPE, media_type.clone());
    request.set_header(ACCEPT, media_type);
    request
}

/// Build the transport agent, routed through `proxy` when one is
/// configured.
///
/// Non-2xx statuses come back as responses, not errors, so vendor error
/// bodies reach the response handlers. Proxy environment variables are
/// ignored: only the configured descriptor routes traffic.
pub fn provision_agent(proxy: Option<&ProxyInfo>) -> Result<ureq::Agent, ConfigError> {
    let proxy = match proxy {
        Some(info) => {
            let uri = info.to_uri()?;
            debug!(proxy = %info.host(), "routing requests through proxy");
            let proxy = ureq::Proxy::new(uri.as_str())
                .map_err(|e| ConfigError::InvalidProxy(format!("{}: {e}", info.host())))?;
            Some(proxy)
        }
        None => None,
    };

    Ok(ureq::Agent::config_builder()
        .http_status_as_error(false)
        .proxy(proxy)
        .build()
        .new_agent())
}
