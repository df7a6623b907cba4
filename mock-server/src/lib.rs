//! In-memory imitation of the Urban Airship push API.
//!
//! Every route sits behind one guard that records the request, then checks
//! Basic auth against the configured app key/secret and that the `Accept`
//! header names the vendor media type. Payloads are kept as raw JSON; only
//! the fields the real API insists on are checked.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{Arc, Mutex, PoisonError},
};

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;
use uuid::Uuid;

const VENDOR_MEDIA_TYPE: &str = "application/vnd.urbanairship+json";

#[derive(Clone, Debug)]
pub struct MockConfig {
    pub app_key: String,
    pub app_secret: String,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            app_key: "test-key".to_string(),
            app_secret: "test-secret".to_string(),
        }
    }
}

/// A request as it reached the server, before any checks.
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub method: String,
    pub uri: String,
    pub headers: Vec<(String, String)>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Default)]
struct Store {
    /// Insertion order doubles as listing order.
    schedules: Vec<(String, Value)>,
    /// Tag name to device ids.
    tags: BTreeMap<String, BTreeSet<String>>,
}

#[derive(Clone)]
pub struct AppState {
    config: Arc<MockConfig>,
    store: Arc<RwLock<Store>>,
    log: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl AppState {
    pub fn new(config: MockConfig) -> Self {
        Self {
            config: Arc::new(config),
            store: Arc::default(),
            log: Arc::default(),
        }
    }

    /// Every request received so far, oldest first.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn expected_authorization(&self) -> String {
        let token = STANDARD.encode(format!("{}:{}", self.config.app_key, self.config.app_secret));
        format!("Basic {token}")
    }
}

pub fn app() -> Router {
    router(AppState::new(MockConfig::default()))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/push/", post(push))
        .route("/api/push/validate/", post(validate))
        .route("/api/schedules/", get(list_schedules).post(create_schedule))
        .route("/api/schedules", get(list_schedules))
        .route(
            "/api/schedules/{id}",
            get(get_schedule).put(update_schedule).delete(delete_schedule),
        )
        .route("/api/tags/", get(list_tags))
        .route("/api/tags/batch/", post(batch_tags))
        .route(
            "/api/tags/{tag}",
            put(create_tag).delete(delete_tag).post(add_remove_devices),
        )
        .layer(middleware::from_fn_with_state(state.clone(), guard))
        .with_state(state)
}

pub async fn run(listener: TcpListener, state: AppState) -> Result<(), std::io::Error> {
    axum::serve(listener, router(state)).await
}

async fn guard(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let recorded = RecordedRequest {
        method: request.method().to_string(),
        uri: request.uri().to_string(),
        headers: request
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
            .collect(),
    };
    debug!(method = %recorded.method, uri = %recorded.uri, "mock request");
    state
        .log
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(recorded);

    let headers = request.headers();
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == state.expected_authorization());
    if !authorized {
        return vendor_error(StatusCode::UNAUTHORIZED, "Unauthorized", 40101, None);
    }

    let accepts_vendor_type = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with(VENDOR_MEDIA_TYPE) && v.contains("version="));
    if !accepts_vendor_type {
        return vendor_error(
            StatusCode::NOT_ACCEPTABLE,
            "Unsupported or missing API version",
            40601,
            None,
        );
    }

    next.run(request).await
}

fn vendor_error(status: StatusCode, message: &str, code: u32, detail: Option<String>) -> Response {
    let mut body = json!({
        "ok": false,
        "operation_id": Uuid::new_v4(),
        "error": message,
        "error_code": code,
    });
    if let Some(detail) = detail {
        body["details"] = json!({ "error": detail });
    }
    (status, Json(body)).into_response()
}

fn not_found(what: &str) -> Response {
    vendor_error(StatusCode::NOT_FOUND, &format!("Could not find {what}"), 40401, None)
}

fn parse_body(body: &str) -> Result<Value, Response> {
    serde_json::from_str(body).map_err(|e| {
        vendor_error(
            StatusCode::BAD_REQUEST,
            "Could not parse request body.",
            40001,
            Some(e.to_string()),
        )
    })
}

fn check_push(push: &Value) -> Result<(), Response> {
    for field in ["audience", "device_types"] {
        if push.get(field).is_none() {
            return Err(vendor_error(
                StatusCode::BAD_REQUEST,
                "Could not parse request body.",
                40001,
                Some(format!("{field} is required")),
            ));
        }
    }
    Ok(())
}

fn check_schedule(schedule: &Value) -> Result<(), Response> {
    if schedule.pointer("/schedule/scheduled_time").is_none() {
        return Err(vendor_error(
            StatusCode::BAD_REQUEST,
            "Could not parse request body.",
            40001,
            Some("schedule.scheduled_time is required".to_string()),
        ));
    }
    check_push(schedule.get("push").unwrap_or(&Value::Null))
}

fn base_url(headers: &HeaderMap) -> String {
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    format!("http://{host}")
}

// --- push ---

async fn push(body: String) -> Result<(StatusCode, Json<Value>), Response> {
    let payload = parse_body(&body)?;
    check_push(&payload)?;
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "ok": true,
            "operation_id": Uuid::new_v4(),
            "push_ids": [Uuid::new_v4()],
        })),
    ))
}

async fn validate(body: String) -> Result<Json<Value>, Response> {
    let payload = parse_body(&body)?;
    check_push(&payload)?;
    Ok(Json(json!({ "ok": true })))
}

// --- schedules ---

#[derive(Deserialize)]
struct ListParams {
    start: Option<String>,
    limit: Option<usize>,
    order: Option<String>,
}

async fn create_schedule(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<(StatusCode, Json<Value>), Response> {
    let mut schedule = parse_body(&body)?;
    check_schedule(&schedule)?;

    let id = Uuid::new_v4().to_string();
    let url = format!("{}/api/schedules/{id}", base_url(&headers));
    schedule["url"] = Value::String(url.clone());
    state.store.write().await.schedules.push((id, schedule.clone()));

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "ok": true,
            "operation_id": Uuid::new_v4(),
            "schedule_urls": [url],
            "schedules": [schedule],
        })),
    ))
}

async fn list_schedules(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Json<Value> {
    let store = state.store.read().await;
    let mut ordered: Vec<&(String, Value)> = store.schedules.iter().collect();
    let order = params.order.unwrap_or_else(|| "asc".to_string());
    if order == "desc" {
        ordered.reverse();
    }

    let from = match &params.start {
        Some(start) => ordered.iter().position(|(id, _)| id == start).unwrap_or(ordered.len()),
        None => 0,
    };
    let remaining = &ordered[from..];
    let limit = params.limit.unwrap_or(remaining.len());
    let page: Vec<Value> = remaining.iter().take(limit).map(|(_, s)| s.clone()).collect();

    let mut body = json!({
        "ok": true,
        "count": page.len(),
        "total_count": ordered.len(),
        "schedules": page,
    });
    // A zero limit never advances, so it gets no next page.
    if let Some((next_id, _)) = remaining.get(limit).filter(|_| limit > 0) {
        body["next_page"] = Value::String(format!(
            "{}/api/schedules?start={next_id}&limit={limit}&order={order}",
            base_url(&headers)
        ));
    }
    Json(body)
}

async fn get_schedule(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, Response> {
    let store = state.store.read().await;
    store
        .schedules
        .iter()
        .find(|(sid, _)| *sid == id)
        .map(|(_, s)| Json(s.clone()))
        .ok_or_else(|| not_found("schedule"))
}

async fn update_schedule(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: String,
) -> Result<Json<Value>, Response> {
    let mut replacement = parse_body(&body)?;
    check_schedule(&replacement)?;

    let mut store = state.store.write().await;
    let (_, stored) = store
        .schedules
        .iter_mut()
        .find(|(sid, _)| *sid == id)
        .ok_or_else(|| not_found("schedule"))?;
    let url = stored["url"].clone();
    replacement["url"] = url.clone();
    *stored = replacement;

    Ok(Json(json!({
        "ok": true,
        "operation_id": Uuid::new_v4(),
        "schedule_urls": [url],
    })))
}

async fn delete_schedule(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, Response> {
    let mut store = state.store.write().await;
    let before = store.schedules.len();
    store.schedules.retain(|(sid, _)| *sid != id);
    if store.schedules.len() == before {
        return Err(not_found("schedule"));
    }
    Ok(StatusCode::NO_CONTENT)
}

// --- tags ---

const DEVICE_KINDS: [&str; 4] = ["ios_channels", "android_channels", "device_tokens", "apids"];
const DEVICE_ID_KINDS: [&str; 4] = ["ios_channel", "android_channel", "device_token", "apid"];

async fn list_tags(State(state): State<AppState>) -> Json<Value> {
    let store = state.store.read().await;
    let tags: Vec<&String> = store.tags.keys().collect();
    Json(json!({ "tags": tags }))
}

async fn create_tag(State(state): State<AppState>, Path(tag): Path<String>) -> StatusCode {
    let mut store = state.store.write().await;
    if store.tags.contains_key(&tag) {
        return StatusCode::OK;
    }
    store.tags.insert(tag, BTreeSet::new());
    StatusCode::CREATED
}

async fn delete_tag(State(state): State<AppState>, Path(tag): Path<String>) -> Result<StatusCode, Response> {
    let mut store = state.store.write().await;
    store
        .tags
        .remove(&tag)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(|| not_found("tag"))
}

async fn add_remove_devices(
    State(state): State<AppState>,
    Path(tag): Path<String>,
    body: String,
) -> Result<Json<Value>, Response> {
    let payload = parse_body(&body)?;
    let groups: Vec<&Value> = DEVICE_KINDS.iter().filter_map(|k| payload.get(*k)).collect();
    if groups.is_empty() {
        return Err(vendor_error(
            StatusCode::BAD_REQUEST,
            "Could not parse request body.",
            40001,
            Some("at least one device list is required".to_string()),
        ));
    }

    let mut store = state.store.write().await;
    let devices = store.tags.entry(tag).or_default();
    for group in groups {
        for id in string_list(group.get("add")) {
            devices.insert(id);
        }
        for id in string_list(group.get("remove")) {
            devices.remove(&id);
        }
    }
    Ok(Json(json!({ "ok": true })))
}

async fn batch_tags(State(state): State<AppState>, body: String) -> Result<Json<Value>, Response> {
    let payload = parse_body(&body)?;
    let entries = payload.as_array().ok_or_else(|| {
        vendor_error(
            StatusCode::BAD_REQUEST,
            "Could not parse request body.",
            40001,
            Some("expected an array".to_string()),
        )
    })?;

    let mut assignments = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let device = DEVICE_ID_KINDS
            .iter()
            .find_map(|k| entry.get(*k).and_then(Value::as_str));
        match (device, entry.get("tags").and_then(Value::as_array)) {
            (Some(device), Some(_)) => {
                assignments.push((device.to_string(), string_list(entry.get("tags"))));
            }
            _ => {
                return Err(vendor_error(
                    StatusCode::BAD_REQUEST,
                    "Could not parse request body.",
                    40001,
                    Some(format!("entry {index} needs a device identifier and tags")),
                ))
            }
        }
    }

    let mut store = state.store.write().await;
    for (device, tags) in assignments {
        for tag in tags {
            store.tags.entry(tag).or_default().insert(device.clone());
        }
    }
    Ok(Json(json!({ "ok": true })))
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
