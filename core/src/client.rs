//! The Airship API client.
//!
//! # Design
//! `ApiClient` holds only immutable settings and a shared transport agent.
//! Every operation is split in two layers:
//!
//! - `build_*` validates arguments and produces a fully provisioned
//!   `HttpRequest` (absolute URL, vendor headers, JSON body) without touching
//!   the network.
//! - The operation method itself (`push`, `list_tags`, ...) builds the
//!   request, hands it to a freshly provisioned `Executor` for
//!   authentication and the round-trip, then parses the result with the
//!   operation's `ResponseHandler`.
//!
//! Argument checks happen in `build_*`, so a bad call never reaches the
//! network. Deletion and tag mutations return the raw `HttpResponse`.

use std::fmt;

use tracing::debug;
use url::Url;

use crate::config::{ClientConfig, ProxyInfo, Settings};
use crate::error::{ApiError, ConfigError};
use crate::executor::{AuthScope, Executor};
use crate::handler::{
    ListAllSchedulesResponseHandler, ListScheduleResponseHandler, ListTagsResponseHandler,
    PushResponseHandler, ResponseHandler, ScheduleResponseHandler,
};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::payload::JsonPayload;
use crate::provision::{provision_agent, provision_request};
use crate::push::PushPayload;
use crate::response::{
    ApiResponse, ListAllSchedulesResponse, ListTagsResponse, PushResponse, ScheduleResponse,
};
use crate::schedule::{Order, SchedulePayload};
use crate::tag::{AddRemoveDeviceFromTagPayload, BatchModificationPayload};

pub const API_PUSH_PATH: &str = "/api/push/";
pub const API_VALIDATE_PATH: &str = "/api/push/validate/";
pub const API_SCHEDULE_PATH: &str = "/api/schedules/";
pub const API_TAGS_PATH: &str = "/api/tags/";
pub const API_TAGS_BATCH_PATH: &str = "/api/tags/batch/";

/// Synchronous client for the Airship push API.
///
/// Cheap to clone; clones share the underlying connection agent. Safe to use
/// from several threads at once.
#[derive(Clone)]
pub struct ApiClient {
    settings: Settings,
    target: AuthScope,
    agent: ureq::Agent,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
        let settings = config.validate()?;
        let target =
            AuthScope::of(&settings.base_uri).ok_or_else(|| ConfigError::InvalidBaseUri {
                uri: settings.base_uri.to_string(),
                reason: "no known port for scheme".to_string(),
            })?;
        let agent = provision_agent(settings.proxy.as_ref())?;
        Ok(Self {
            settings,
            target,
            agent,
        })
    }

    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    pub fn app_key(&self) -> &str {
        self.settings.credentials.username()
    }

    pub fn app_secret(&self) -> &str {
        self.settings.credentials.password()
    }

    pub fn base_uri(&self) -> &Url {
        &self.settings.base_uri
    }

    pub fn version(&self) -> u32 {
        self.settings.version
    }

    pub fn proxy_info(&self) -> Option<&ProxyInfo> {
        self.settings.proxy.as_ref()
    }

    /// Executor carrying this client's credentials and proxy auth.
    pub fn provision_executor(&self) -> Executor {
        let mut executor = Executor::new(
            self.agent.clone(),
            self.target.clone(),
            self.settings.credentials.clone(),
        );

        if let Some(proxy) = &self.settings.proxy {
            executor = executor.auth_preemptive_proxy(proxy.host().clone());
            if let Some(credentials) = proxy.credentials() {
                executor = executor.proxy_auth(proxy.host().clone(), credentials.clone());
            }
        }

        executor
    }

    // -----------------------------------------------------------------------
    // Push API
    // -----------------------------------------------------------------------

    pub fn build_push(&self, payload: &PushPayload) -> Result<HttpRequest, ApiError> {
        self.request_with_body(HttpMethod::Post, self.endpoint(API_PUSH_PATH)?, payload)
    }

    pub fn push(&self, payload: &PushPayload) -> Result<ApiResponse<PushResponse>, ApiError> {
        let request = self.build_push(payload)?;
        self.send("push", request, PushResponseHandler)
    }

    pub fn build_validate(&self, payload: &PushPayload) -> Result<HttpRequest, ApiError> {
        self.request_with_body(HttpMethod::Post, self.endpoint(API_VALIDATE_PATH)?, payload)
    }

    /// Validate a push without delivering it.
    pub fn validate(&self, payload: &PushPayload) -> Result<ApiResponse<PushResponse>, ApiError> {
        let request = self.build_validate(payload)?;
        self.send("validate push", request, PushResponseHandler)
    }

    // -----------------------------------------------------------------------
    // Schedules API
    // -----------------------------------------------------------------------

    pub fn build_schedule(&self, payload: &SchedulePayload) -> Result<HttpRequest, ApiError> {
        self.request_with_body(HttpMethod::Post, self.endpoint(API_SCHEDULE_PATH)?, payload)
    }

    pub fn schedule(
        &self,
        payload: &SchedulePayload,
    ) -> Result<ApiResponse<ScheduleResponse>, ApiError> {
        let request = self.build_schedule(payload)?;
        self.send("schedule", request, ScheduleResponseHandler)
    }

    pub fn build_list_all_schedules(&self) -> Result<HttpRequest, ApiError> {
        Ok(self.request(HttpMethod::Get, self.endpoint(API_SCHEDULE_PATH)?))
    }

    pub fn list_all_schedules(&self) -> Result<ApiResponse<ListAllSchedulesResponse>, ApiError> {
        let request = self.build_list_all_schedules()?;
        self.send("list all schedules", request, ListAllSchedulesResponseHandler)
    }

    /// The query is written as `start=..&limit=..&order=..`, in that order.
    /// `start` is form-encoded so it cannot spill into the other fields.
    pub fn build_list_all_schedules_page(
        &self,
        start: &str,
        limit: u32,
        order: Order,
    ) -> Result<HttpRequest, ApiError> {
        let start: String = url::form_urlencoded::byte_serialize(start.as_bytes()).collect();
        let path = format!("/api/schedules?start={start}&limit={limit}&order={order}");
        Ok(self.request(HttpMethod::Get, self.endpoint(&path)?))
    }

    pub fn list_all_schedules_page(
        &self,
        start: &str,
        limit: u32,
        order: Order,
    ) -> Result<ApiResponse<ListAllSchedulesResponse>, ApiError> {
        let request = self.build_list_all_schedules_page(start, limit, order)?;
        self.send("list all schedules", request, ListAllSchedulesResponseHandler)
    }

    /// Follow a `next_page` URL. Only its path and query are used; scheme
    /// and host always come from the configured base URI.
    pub fn build_list_all_schedules_next(&self, next_page: &str) -> Result<HttpRequest, ApiError> {
        let next = Url::parse(next_page).map_err(|source| ApiError::InvalidUrl {
            url: next_page.to_string(),
            source,
        })?;
        let mut url = self.join(next.path())?;
        url.set_query(next.query());
        Ok(self.request(HttpMethod::Get, url.into()))
    }

    pub fn list_all_schedules_next(
        &self,
        next_page: &str,
    ) -> Result<ApiResponse<ListAllSchedulesResponse>, ApiError> {
        let request = self.build_list_all_schedules_next(next_page)?;
        self.send("list all schedules", request, ListAllSchedulesResponseHandler)
    }

    pub fn build_list_schedule(&self, id: &str) -> Result<HttpRequest, ApiError> {
        let url = self.resource(API_SCHEDULE_PATH, id, "schedule id")?;
        Ok(self.request(HttpMethod::Get, url))
    }

    pub fn list_schedule(&self, id: &str) -> Result<ApiResponse<SchedulePayload>, ApiError> {
        let request = self.build_list_schedule(id)?;
        self.send("list specific schedule", request, ListScheduleResponseHandler)
    }

    pub fn build_update_schedule(
        &self,
        payload: &SchedulePayload,
        id: &str,
    ) -> Result<HttpRequest, ApiError> {
        let url = self.resource(API_SCHEDULE_PATH, id, "schedule id")?;
        self.request_with_body(HttpMethod::Put, url, payload)
    }

    pub fn update_schedule(
        &self,
        payload: &SchedulePayload,
        id: &str,
    ) -> Result<ApiResponse<ScheduleResponse>, ApiError> {
        let request = self.build_update_schedule(payload, id)?;
        self.send("update schedule", request, ScheduleResponseHandler)
    }

    pub fn build_delete_schedule(&self, id: &str) -> Result<HttpRequest, ApiError> {
        let url = self.resource(API_SCHEDULE_PATH, id, "schedule id")?;
        Ok(self.request(HttpMethod::Delete, url))
    }

    pub fn delete_schedule(&self, id: &str) -> Result<HttpResponse, ApiError> {
        let request = self.build_delete_schedule(id)?;
        self.send_raw("delete schedule", request)
    }

    // -----------------------------------------------------------------------
    // Tags API
    // -----------------------------------------------------------------------

    pub fn build_list_tags(&self) -> Result<HttpRequest, ApiError> {
        Ok(self.request(HttpMethod::Get, self.endpoint(API_TAGS_PATH)?))
    }

    pub fn list_tags(&self) -> Result<ApiResponse<ListTagsResponse>, ApiError> {
        let request = self.build_list_tags()?;
        self.send("list tags", request, ListTagsResponseHandler)
    }

    pub fn build_create_tag(&self, tag: &str) -> Result<HttpRequest, ApiError> {
        let url = self.resource(API_TAGS_PATH, tag, "tag")?;
        Ok(self.request(HttpMethod::Put, url))
    }

    pub fn create_tag(&self, tag: &str) -> Result<HttpResponse, ApiError> {
        let request = self.build_create_tag(tag)?;
        self.send_raw("create tag", request)
    }

    pub fn build_delete_tag(&self, tag: &str) -> Result<HttpRequest, ApiError> {
        let url = self.resource(API_TAGS_PATH, tag, "tag")?;
        Ok(self.request(HttpMethod::Delete, url))
    }

    pub fn delete_tag(&self, tag: &str) -> Result<HttpResponse, ApiError> {
        let request = self.build_delete_tag(tag)?;
        self.send_raw("delete tag", request)
    }

    pub fn build_add_remove_devices_from_tag(
        &self,
        tag: &str,
        payload: &AddRemoveDeviceFromTagPayload,
    ) -> Result<HttpRequest, ApiError> {
        let url = self.resource(API_TAGS_PATH, tag, "tag")?;
        self.request_with_body(HttpMethod::Post, url, payload)
    }

    pub fn add_remove_devices_from_tag(
        &self,
        tag: &str,
        payload: &AddRemoveDeviceFromTagPayload,
    ) -> Result<HttpResponse, ApiError> {
        let request = self.build_add_remove_devices_from_tag(tag, payload)?;
        self.send_raw("add/remove devices from tag", request)
    }

    pub fn build_batch_modification_of_tags(
        &self,
        payload: &BatchModificationPayload,
    ) -> Result<HttpRequest, ApiError> {
        self.request_with_body(HttpMethod::Post, self.endpoint(API_TAGS_BATCH_PATH)?, payload)
    }

    pub fn batch_modification_of_tags(
        &self,
        payload: &BatchModificationPayload,
    ) -> Result<HttpResponse, ApiError> {
        let request = self.build_batch_modification_of_tags(payload)?;
        self.send_raw("batch modification of tags", request)
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn join(&self, path: &str) -> Result<Url, ApiError> {
        self.settings
            .base_uri
            .join(path)
            .map_err(|source| ApiError::InvalidUrl {
                url: path.to_string(),
                source,
            })
    }

    fn endpoint(&self, path: &str) -> Result<String, ApiError> {
        self.join(path).map(String::from)
    }

    /// `collection` with `id` appended as a single, percent-encoded path
    /// segment.
    fn resource(
        &self,
        collection: &str,
        id: &str,
        argument: &'static str,
    ) -> Result<String, ApiError> {
        if id.trim().is_empty() {
            return Err(ApiError::MissingArgument(argument));
        }
        let mut url = self.join(collection)?;
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(id);
        }
        Ok(url.into())
    }

    fn request(&self, method: HttpMethod, url: String) -> HttpRequest {
        provision_request(HttpRequest::new(method, url), self.settings.version)
    }

    fn request_with_body<P: JsonPayload>(
        &self,
        method: HttpMethod,
        url: String,
        payload: &P,
    ) -> Result<HttpRequest, ApiError> {
        let mut request = self.request(method, url);
        request.body = Some(payload.to_json()?);
        Ok(request)
    }

    fn send<H: ResponseHandler>(
        &self,
        operation: &'static str,
        request: HttpRequest,
        handler: H,
    ) -> Result<ApiResponse<H::Output>, ApiError> {
        let response = self.send_raw(operation, request)?;
        handler.handle(response)
    }

    fn send_raw(&self, operation: &'static str, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!(operation, method = %request.method, url = %request.url, "executing request");
        self.provision_executor().execute(request)
    }
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("app_key", &self.app_key())
            .field("app_secret", &"<redacted>")
            .field("base_uri", &self.settings.base_uri.as_str())
            .field("version", &self.settings.version)
            .field("proxy", &self.settings.proxy)
            .finish()
    }
}

/// Chaining front-end over `ClientConfig`.
#[derive(Debug, Clone, Default)]
pub struct ApiClientBuilder {
    config: ClientConfig,
}

impl ApiClientBuilder {
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.config.key = Some(key.into());
        self
    }

    pub fn secret(mut self, secret: impl Into<String>) -> Self {
        self.config.secret = Some(secret.into());
        self
    }

    pub fn base_uri(mut self, base_uri: impl Into<String>) -> Self {
        self.config.base_uri = Some(base_uri.into());
        self
    }

    pub fn version(mut self, version: u32) -> Self {
        self.config.version = Some(version);
        self
    }

    pub fn proxy_info(mut self, proxy: ProxyInfo) -> Self {
        self.config.proxy = Some(proxy);
        self
    }

    pub fn build(self) -> Result<ApiClient, ConfigError> {
        ApiClient::new(self.config)
    }
}
