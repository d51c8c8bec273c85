//! Full HTTP round trips through the gateway router, with both service
//! adapters mounted over one in-memory store.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

use sb_domain::config::{Config, StoreBackend};
use sb_domain::error::{Error, Result};
use sb_gateway::api;
use sb_gateway::bootstrap::build_app_state;
use sb_gateway::state::AppState;
use sb_sessions::{
    CasOutcome, SessionAccessor, SessionId, SessionPolicy, SessionRecord, SessionStore,
};

fn memory_config() -> Config {
    let mut config = Config::default();
    config.store.backend = StoreBackend::Memory;
    config
}

fn app_with(config: Config) -> (Router, AppState) {
    let state = build_app_state(Arc::new(config)).unwrap();
    (api::router(&state).with_state(state.clone()), state)
}

fn app() -> Router {
    app_with(memory_config()).0
}

fn request(method: Method, uri: &str, cookie: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, req: Request<Body>) -> Response {
    app.clone().oneshot(req).await.unwrap()
}

async fn body_json(resp: Response) -> Value {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// The `name=value` pair from the response's `Set-Cookie`.
fn session_cookie(resp: &Response) -> String {
    resp.headers()
        .get(header::SET_COOKIE)
        .expect("Set-Cookie header")
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_owned()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Adapters
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn legacy_issues_cookie_with_default_user() {
    let app = app();
    let resp = send(&app, request(Method::GET, "/legacy", None, None)).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let set_cookie = resp.headers()[header::SET_COOKIE].to_str().unwrap().to_owned();
    assert!(set_cookie.starts_with("SESSIONID="));
    assert!(set_cookie.contains("HttpOnly"));

    let cookie = session_cookie(&resp);
    let body = body_json(resp).await;
    assert_eq!(body["status"], "✅ User logged in (Legacy)");
    assert_eq!(body["user"], json!({"id": 1, "name": "Legacy User"}));
    assert_eq!(format!("SESSIONID={}", body["session_id"].as_str().unwrap()), cookie);
}

#[tokio::test]
async fn framework_change_is_seen_by_legacy() {
    let app = app();

    let first = send(&app, request(Method::GET, "/legacy", None, None)).await;
    let cookie = session_cookie(&first);
    let sid = body_json(first).await["session_id"].clone();

    let changed = send(&app, request(Method::GET, "/update-session", Some(&cookie), None)).await;
    assert_eq!(changed.status(), StatusCode::OK);
    let changed = body_json(changed).await;
    assert_eq!(changed["session_id"], sid);
    assert_eq!(changed["user"], json!({"id": 666, "name": "CHANGED BY SF"}));

    let again = send(&app, request(Method::GET, "/legacy", Some(&cookie), None)).await;
    let again = body_json(again).await;
    assert_eq!(again["session_id"], sid);
    assert_eq!(again["user"], json!({"id": 666, "name": "CHANGED BY SF"}));
}

#[tokio::test]
async fn me_echoes_received_cookies() {
    let app = app();
    let first = send(&app, request(Method::GET, "/me", None, None)).await;
    let cookie = session_cookie(&first);

    let header_value = format!("{cookie}; theme=dark");
    let resp = send(&app, request(Method::GET, "/me", Some(&header_value), None)).await;
    let body = body_json(resp).await;
    assert_eq!(body["cookies"]["theme"], "dark");
    assert_eq!(
        format!("SESSIONID={}", body["cookies"]["SESSIONID"].as_str().unwrap()),
        cookie
    );
    assert_eq!(body["user"], json!({"id": 1, "name": "Legacy User"}));
}

#[tokio::test]
async fn post_update_session_merges_attributes() {
    let app = app();
    let first = send(&app, request(Method::GET, "/legacy", None, None)).await;
    let cookie = session_cookie(&first);

    let resp = send(
        &app,
        request(
            Method::POST,
            "/update-session",
            Some(&cookie),
            Some(json!({"name": "Merged", "role": "admin"})),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        body_json(resp).await["user"],
        json!({"id": 1, "name": "Merged", "role": "admin"})
    );
}

#[tokio::test]
async fn post_update_session_refuses_non_object_body() {
    let (app, state) = app_with(memory_config());

    let resp = send(
        &app,
        request(Method::POST, "/update-session", None, Some(json!([1, 2, 3]))),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(resp.headers().get(header::SET_COOKIE).is_none());
    let body = body_json(resp).await;
    assert!(body["error"].as_str().is_some_and(|m| !m.is_empty()));

    let resp = send(
        &app,
        Request::builder()
            .method(Method::POST)
            .uri("/update-session")
            .body(Body::from("{\"name\": \"x\"}"))
            .unwrap(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert!(body_json(resp).await["error"].is_string());

    assert_eq!(state.accessor.store().len().unwrap(), 0);
}

#[tokio::test]
async fn malformed_cookie_gets_fresh_session() {
    let app = app();
    let resp = send(
        &app,
        request(Method::GET, "/legacy", Some("SESSIONID=not valid!"), None),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = session_cookie(&resp);
    assert_ne!(cookie, "SESSIONID=not valid!");
    assert_eq!(cookie.len(), "SESSIONID=".len() + 64);
}

#[tokio::test]
async fn unknown_well_formed_id_is_adopted() {
    let app = app();
    let resp = send(
        &app,
        request(Method::GET, "/legacy", Some("SESSIONID=minted-elsewhere"), None),
    )
    .await;
    assert_eq!(session_cookie(&resp), "SESSIONID=minted-elsewhere");
    assert_eq!(body_json(resp).await["session_id"], "minted-elsewhere");
}

#[tokio::test]
async fn only_configured_adapters_are_mounted() {
    let mut config = memory_config();
    config.server.adapters = vec!["legacy".into()];
    let (app, _) = app_with(config);

    let legacy = send(&app, request(Method::GET, "/legacy", None, None)).await;
    assert_eq!(legacy.status(), StatusCode::OK);
    let me = send(&app, request(Method::GET, "/me", None, None)).await;
    assert_eq!(me.status(), StatusCode::NOT_FOUND);
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Health and diagnostics
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn health_reports_backend_and_count() {
    let app = app();
    send(&app, request(Method::GET, "/legacy", None, None)).await;

    let resp = send(&app, request(Method::GET, "/v1/health", None, None)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["store"], "memory");
    assert_eq!(body["sessions"], 1);
}

#[tokio::test]
async fn diagnostics_get_and_delete() {
    let app = app();
    let first = send(&app, request(Method::GET, "/legacy", None, None)).await;
    let sid = body_json(first).await["session_id"]
        .as_str()
        .unwrap()
        .to_owned();
    let uri = format!("/v1/sessions/{sid}");

    let resp = send(&app, request(Method::GET, &uri, None, None)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let record = body_json(resp).await;
    assert_eq!(record["id"], sid.as_str());
    assert_eq!(record["attributes"], json!({"id": 1, "name": "Legacy User"}));

    let resp = send(&app, request(Method::DELETE, &uri, None, None)).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = send(&app, request(Method::GET, &uri, None, None)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let resp = send(&app, request(Method::DELETE, &uri, None, None)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn diagnostics_reject_malformed_id() {
    let app = app();
    let resp = send(&app, request(Method::GET, "/v1/sessions/bad%20id", None, None)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Store outage
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

struct DownStore;

impl SessionStore for DownStore {
    fn backend(&self) -> &'static str {
        "down"
    }
    fn get(&self, _id: &SessionId) -> Result<SessionRecord> {
        Err(Error::StoreUnavailable("backend down".into()))
    }
    fn put(&self, _record: &SessionRecord) -> Result<()> {
        Err(Error::StoreUnavailable("backend down".into()))
    }
    fn delete(&self, _id: &SessionId) -> Result<()> {
        Err(Error::StoreUnavailable("backend down".into()))
    }
    fn compare_and_swap(&self, _record: &SessionRecord, _expected: Option<u64>) -> Result<CasOutcome> {
        Err(Error::StoreUnavailable("backend down".into()))
    }
    fn purge_expired(&self, _cutoff: DateTime<Utc>) -> Result<usize> {
        Err(Error::StoreUnavailable("backend down".into()))
    }
    fn len(&self) -> Result<usize> {
        Err(Error::StoreUnavailable("backend down".into()))
    }
}

#[tokio::test]
async fn unavailable_store_is_503_everywhere() {
    let config = Arc::new(memory_config());
    let state = AppState {
        accessor: Arc::new(SessionAccessor::new(
            Arc::new(DownStore),
            SessionPolicy::from(&config.sessions),
        )),
        config,
    };
    let app = api::router(&state).with_state(state);

    for uri in ["/legacy", "/me", "/update-session", "/v1/health"] {
        let resp = send(&app, request(Method::GET, uri, None, None)).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE, "{uri}");
        assert!(resp.headers().get(header::SET_COOKIE).is_none(), "{uri}");
    }
}
