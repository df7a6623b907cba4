use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, router, AppState, MockConfig};
use serde_json::{json, Value};
use tower::ServiceExt;

// "test-key:test-secret"
const AUTH: &str = "Basic dGVzdC1rZXk6dGVzdC1zZWNyZXQ=";
const MEDIA_TYPE: &str = "application/vnd.urbanairship+json; version=3";

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn api_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::AUTHORIZATION, AUTH)
        .header(http::header::ACCEPT, MEDIA_TYPE)
        .header(http::header::CONTENT_TYPE, MEDIA_TYPE)
        .body(body.to_string())
        .unwrap()
}

fn schedule_body(alert: &str) -> String {
    json!({
        "name": alert,
        "schedule": { "scheduled_time": "2013-04-01T18:45:00" },
        "push": { "audience": "all", "device_types": "all", "notification": { "alert": alert } }
    })
    .to_string()
}

// --- guard ---

#[tokio::test]
async fn missing_auth_returns_401_vendor_error() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/api/tags/")
                .header(http::header::ACCEPT, MEDIA_TYPE)
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(resp).await;
    assert_eq!(body["ok"], false);
    assert_eq!(body["error_code"], 40101);
}

#[tokio::test]
async fn plain_json_accept_returns_406() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/api/tags/")
                .header(http::header::AUTHORIZATION, AUTH)
                .header(http::header::ACCEPT, "application/json")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_ACCEPTABLE);
}

#[tokio::test]
async fn requests_are_recorded_even_when_rejected() {
    let state = AppState::new(MockConfig::default());
    let resp = router(state.clone())
        .oneshot(Request::builder().uri("/api/push/").body(String::new()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let recorded = state.requests();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].method, "GET");
    assert_eq!(recorded[0].uri, "/api/push/");
}

// --- push ---

#[tokio::test]
async fn push_returns_202_with_ids() {
    let resp = app()
        .oneshot(api_request(
            "POST",
            "/api/push/",
            r#"{"audience":"all","device_types":"all","notification":{"alert":"hi"}}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::ACCEPTED);
    let body = body_json(resp).await;
    assert_eq!(body["ok"], true);
    assert_eq!(body["push_ids"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn push_without_audience_returns_400() {
    let resp = app()
        .oneshot(api_request("POST", "/api/push/", r#"{"device_types":"all"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body["error_code"], 40001);
    assert_eq!(body["details"]["error"], "audience is required");
}

#[tokio::test]
async fn push_malformed_json_returns_400() {
    let resp = app()
        .oneshot(api_request("POST", "/api/push/", "{not json"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn validate_returns_200() {
    let resp = app()
        .oneshot(api_request(
            "POST",
            "/api/push/validate/",
            r#"{"audience":{"tag":"a"},"device_types":["ios"]}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, json!({ "ok": true }));
}

// --- schedules ---

#[tokio::test]
async fn get_schedule_not_found() {
    let resp = app()
        .oneshot(api_request("GET", "/api/schedules/missing", ""))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(resp).await["error_code"], 40401);
}

#[tokio::test]
async fn delete_schedule_not_found() {
    let resp = app()
        .oneshot(api_request("DELETE", "/api/schedules/missing", ""))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn schedule_lifecycle() {
    use tower::Service;

    let mut app = app().into_service();

    let mut ids = Vec::new();
    for alert in ["one", "two", "three"] {
        let resp = ServiceExt::ready(&mut app)
            .await
            .unwrap()
            .call(api_request("POST", "/api/schedules/", &schedule_body(alert)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body = body_json(resp).await;
        let url = body["schedule_urls"][0].as_str().unwrap().to_string();
        assert_eq!(body["schedules"][0]["url"], url.as_str());
        ids.push(url.rsplit('/').next().unwrap().to_string());
    }

    // first page of two, ascending
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(api_request(
            "GET",
            &format!("/api/schedules?start={}&limit=2&order=asc", ids[0]),
            "",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let page = body_json(resp).await;
    assert_eq!(page["count"], 2);
    assert_eq!(page["total_count"], 3);
    let next = page["next_page"].as_str().unwrap();
    assert!(next.ends_with(&format!("/api/schedules?start={}&limit=2&order=asc", ids[2])));

    // descending, no pagination
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(api_request("GET", "/api/schedules?order=desc", ""))
        .await
        .unwrap();
    let page = body_json(resp).await;
    assert_eq!(page["schedules"][0]["name"], "three");
    assert!(page.get("next_page").is_none());

    // update keeps the url
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(api_request(
            "PUT",
            &format!("/api/schedules/{}", ids[1]),
            &schedule_body("two, revised"),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(api_request("GET", &format!("/api/schedules/{}", ids[1]), ""))
        .await
        .unwrap();
    let schedule = body_json(resp).await;
    assert_eq!(schedule["name"], "two, revised");
    assert!(schedule["url"].as_str().unwrap().ends_with(&ids[1]));

    // delete
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(api_request("DELETE", &format!("/api/schedules/{}", ids[1]), ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(api_request("GET", "/api/schedules/", ""))
        .await
        .unwrap();
    assert_eq!(body_json(resp).await["total_count"], 2);
}

#[tokio::test]
async fn zero_limit_page_has_no_next_page() {
    use tower::Service;

    let mut app = app().into_service();

    let mut first = None;
    for alert in ["one", "two"] {
        let resp = ServiceExt::ready(&mut app)
            .await
            .unwrap()
            .call(api_request("POST", "/api/schedules/", &schedule_body(alert)))
            .await
            .unwrap();
        let body = body_json(resp).await;
        let url = body["schedule_urls"][0].as_str().unwrap();
        first.get_or_insert_with(|| url.rsplit('/').next().unwrap().to_string());
    }

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(api_request(
            "GET",
            &format!("/api/schedules?start={}&limit=0&order=asc", first.unwrap()),
            "",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let page = body_json(resp).await;
    assert_eq!(page["count"], 0);
    assert_eq!(page["total_count"], 2);
    assert!(page.get("next_page").is_none());
}

// --- tags ---

#[tokio::test]
async fn tag_lifecycle() {
    use tower::Service;

    let mut app = app().into_service();

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(api_request("PUT", "/api/tags/sports", ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(api_request("PUT", "/api/tags/sports", ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(api_request(
            "POST",
            "/api/tags/news",
            r#"{"device_tokens":{"add":["AAA"]}}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(api_request(
            "POST",
            "/api/tags/batch/",
            r#"[{"apid":"c2c0f5d6","tags":["weather"]}]"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(api_request("GET", "/api/tags/", ""))
        .await
        .unwrap();
    assert_eq!(body_json(resp).await["tags"], json!(["news", "sports", "weather"]));

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(api_request("DELETE", "/api/tags/sports", ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(api_request("DELETE", "/api/tags/sports", ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn add_remove_without_device_lists_returns_400() {
    let resp = app()
        .oneshot(api_request("POST", "/api/tags/news", "{}"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn batch_entry_without_identifier_returns_400() {
    let resp = app()
        .oneshot(api_request("POST", "/api/tags/batch/", r#"[{"tags":["a"]}]"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body["details"]["error"], "entry 0 needs a device identifier and tags");
}
