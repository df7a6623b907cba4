//! Authentication and the network round-trip.
//!
//! # Design
//! An `Executor` is assembled per call from the client's immutable settings.
//! It knows which host the app credentials belong to and sends them on the
//! first request instead of waiting for a 401 challenge. Proxy settings are
//! tracked as two separate facts, matching how they are configured: a
//! preemptive scope for the proxy host, and the credentials for that host
//! when the descriptor carries any. The agent routes through the proxy with
//! CONNECT and sends those credentials on the CONNECT itself, so no proxy
//! header is ever put on the request.

use tracing::debug;
use url::Url;

use crate::config::{Credentials, ProxyHost};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

pub const AUTHORIZATION: &str = "Authorization";

/// Host and port the API credentials are valid for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthScope {
    pub host: String,
    pub port: u16,
}

impl AuthScope {
    /// Scope of `url`. `None` when it has no host or no known port.
    pub fn of(url: &Url) -> Option<Self> {
        Some(Self {
            host: url.host_str()?.to_string(),
            port: url.port_or_known_default()?,
        })
    }
}

/// Sends one authenticated request.
pub struct Executor {
    agent: ureq::Agent,
    target: AuthScope,
    credentials: Credentials,
    preemptive_proxy: Option<ProxyHost>,
    proxy_credentials: Option<(ProxyHost, Credentials)>,
}

impl Executor {
    pub fn new(agent: ureq::Agent, target: AuthScope, credentials: Credentials) -> Self {
        Self {
            agent,
            target,
            credentials,
            preemptive_proxy: None,
            proxy_credentials: None,
        }
    }

    /// Authenticate against `proxy` on the first request.
    pub fn auth_preemptive_proxy(mut self, proxy: ProxyHost) -> Self {
        self.preemptive_proxy = Some(proxy);
        self
    }

    pub fn proxy_auth(mut self, proxy: ProxyHost, credentials: Credentials) -> Self {
        self.proxy_credentials = Some((proxy, credentials));
        self
    }

    pub fn target(&self) -> &AuthScope {
        &self.target
    }

    pub fn preemptive_proxy(&self) -> Option<&ProxyHost> {
        self.preemptive_proxy.as_ref()
    }

    pub fn proxy_credentials(&self) -> Option<&(ProxyHost, Credentials)> {
        self.proxy_credentials.as_ref()
    }

    /// Attach `Authorization` when the request targets the API host.
    ///
    /// Proxy credentials are never added here: anything on the request is
    /// tunnelled through to the API host.
    pub fn authenticate(&self, request: &mut HttpRequest) -> Result<(), ApiError> {
        let url = Url::parse(&request.url).map_err(|source| ApiError::InvalidUrl {
            url: request.url.clone(),
            source,
        })?;

        if AuthScope::of(&url).as_ref() == Some(&self.target) {
            request.set_header(AUTHORIZATION, self.credentials.basic_authorization());
        }
        Ok(())
    }

    /// Authenticate and send `request`, blocking until the response body has
    /// been read. Any status, including 4xx/5xx, is returned as a response.
    pub fn execute(&self, mut request: HttpRequest) -> Result<HttpResponse, ApiError> {
        self.authenticate(&mut request)?;

        let HttpRequest {
            method,
            url,
            headers,
            body,
        } = request;

        let agent = &self.agent;
        let result = match (method, body) {
            (HttpMethod::Get, _) => with_headers(agent.get(url.as_str()), &headers).call(),
            (HttpMethod::Delete, _) => with_headers(agent.delete(url.as_str()), &headers).call(),
            (HttpMethod::Post, Some(body)) => {
                with_headers(agent.post(url.as_str()), &headers).send(body.as_bytes())
            }
            (HttpMethod::Post, None) => with_headers(agent.post(url.as_str()), &headers).send_empty(),
            (HttpMethod::Put, Some(body)) => {
                with_headers(agent.put(url.as_str()), &headers).send(body.as_bytes())
            }
            (HttpMethod::Put, None) => with_headers(agent.put(url.as_str()), &headers).send_empty(),
        };

        let mut response = match result {
            Ok(response) => response,
            Err(e) => {
                debug!(%method, %url, error = %e, "HTTP request failed");
                return Err(e.into());
            }
        };

        let status = response.status().as_u16();
        debug!(%method, %url, status, "received HTTP response");

        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.body_mut().read_to_string()?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}
