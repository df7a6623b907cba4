//! Client configuration: credentials, endpoint, API version and proxy.
//!
//! # Design
//! `ClientConfig` is a plain struct of optional fields. `Default` fills in
//! the public endpoint and the current API version, so a caller normally
//! sets only the key and secret. `validate` turns it into the immutable
//! `Settings` that `ApiClient` holds, reporting the first missing field.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use url::Url;

use crate::error::ConfigError;

pub const DEFAULT_BASE_URI: &str = "https://go.urbanairship.com";
pub const DEFAULT_VERSION: u32 = 3;

/// A user name and password pair used for Basic authentication.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// Value for an `Authorization` or `Proxy-Authorization` header.
    pub fn basic_authorization(&self) -> String {
        let token = STANDARD.encode(format!("{}:{}", self.username, self.password));
        format!("Basic {token}")
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Address of an HTTP proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyHost {
    pub scheme: String,
    pub host: String,
    pub port: u16,
}

impl ProxyHost {
    /// A plain `http` proxy.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            scheme: "http".to_string(),
            host: host.into(),
            port,
        }
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }
}

impl fmt::Display for ProxyHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}", self.scheme, self.host, self.port)
    }
}

/// Proxy descriptor: where to route outbound calls and, optionally, how to
/// authenticate against the proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyInfo {
    host: ProxyHost,
    credentials: Option<Credentials>,
}

impl ProxyInfo {
    pub fn new(host: ProxyHost) -> Self {
        Self {
            host,
            credentials: None,
        }
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn host(&self) -> &ProxyHost {
        &self.host
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// The proxy as a URI with credentials embedded in the user-info part,
    /// the form the transport agent accepts.
    pub(crate) fn to_uri(&self) -> Result<Url, ConfigError> {
        let mut uri = Url::parse(&self.host.to_string())
            .map_err(|e| ConfigError::InvalidProxy(format!("{}: {e}", self.host)))?;
        if let Some(credentials) = &self.credentials {
            uri.set_username(credentials.username())
                .and_then(|()| uri.set_password(Some(credentials.password())))
                .map_err(|()| {
                    ConfigError::InvalidProxy(format!("{} cannot carry credentials", self.host))
                })?;
        }
        Ok(uri)
    }
}

/// Unvalidated client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub key: Option<String>,
    pub secret: Option<String>,
    pub base_uri: Option<String>,
    pub version: Option<u32>,
    pub proxy: Option<ProxyInfo>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            key: None,
            secret: None,
            base_uri: Some(DEFAULT_BASE_URI.to_string()),
            version: Some(DEFAULT_VERSION),
            proxy: None,
        }
    }
}

impl ClientConfig {
    /// Default endpoint and version with the given app credentials.
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            secret: Some(secret.into()),
            ..Self::default()
        }
    }

    pub fn validate(self) -> Result<Settings, ConfigError> {
        let key = required_text(self.key, "app key")?;
        let secret = required_text(self.secret, "app secret")?;
        let raw_uri = required_text(self.base_uri, "base URI")?;
        let version = self.version.ok_or(ConfigError::MissingField("version"))?;

        let base_uri = Url::parse(&raw_uri).map_err(|e| ConfigError::InvalidBaseUri {
            uri: raw_uri.clone(),
            reason: e.to_string(),
        })?;
        if base_uri.cannot_be_a_base() || base_uri.host_str().is_none() {
            return Err(ConfigError::InvalidBaseUri {
                uri: raw_uri,
                reason: "no host".to_string(),
            });
        }

        if let Some(proxy) = &self.proxy {
            proxy.to_uri()?;
        }

        Ok(Settings {
            credentials: Credentials::new(key, secret),
            base_uri,
            version,
            proxy: self.proxy,
        })
    }
}

fn required_text(value: Option<String>, field: &'static str) -> Result<String, ConfigError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::MissingField(field)),
    }
}

/// Validated, immutable configuration held by `ApiClient`.
#[derive(Debug, Clone)]
pub struct Settings {
    pub credentials: Credentials,
    pub base_uri: Url,
    pub version: u32,
    pub proxy: Option<ProxyInfo>,
}
