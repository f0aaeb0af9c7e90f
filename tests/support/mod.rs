//! In-process mock of the Appsmith endpoints the crate talks to.
//!
//! The mock enforces the same session contract as the real server: writes
//! need the `X-XSRF-TOKEN` header, and everything past login needs the
//! `SESSION` cookie the login endpoint hands out. Each login issues a new
//! session value; [`MockAppsmith::expire_session`] forgets the current one.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Form, Json, Router};
use serde_json::{Value, json};

use appsmith_ops::appsmith::{AppsmithApi, SessionClient};
use appsmith_ops::config::{AppsmithConfig, Credentials};

pub const EMAIL: &str = "ops@example.com";
pub const PASSWORD: &str = "correct-horse";
const XSRF: &str = "tok-1";

/// A recorded request body.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub path: String,
    pub query: HashMap<String, String>,
    pub body: Value,
}

#[derive(Debug)]
pub struct Inner {
    pub issue_xsrf: bool,
    pub logins: u32,
    /// Session value the server currently accepts.
    pub session: Option<String>,
    pub pages: HashMap<String, Value>,
    pub page_names: Vec<(String, String)>,
    pub saves: Vec<Recorded>,
    pub publishes: Vec<String>,
    pub create_attempts: Vec<Recorded>,
    pub create_failures: usize,
    pub fail_saves: bool,
}

impl Default for Inner {
    fn default() -> Self {
        Self {
            issue_xsrf: true,
            logins: 0,
            session: None,
            pages: HashMap::new(),
            page_names: Vec::new(),
            saves: Vec::new(),
            publishes: Vec::new(),
            create_attempts: Vec::new(),
            create_failures: 0,
            fail_saves: false,
        }
    }
}

#[derive(Clone, Default)]
pub struct MockAppsmith {
    inner: Arc<Mutex<Inner>>,
}

impl MockAppsmith {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }

    /// Register a page with one layout.
    pub fn with_page(self, page_id: &str, name: &str, layout_id: &str, layout: Value) -> Self {
        let mut layout = layout;
        layout["id"] = json!(layout_id);
        {
            let mut state = self.state();
            state.pages.insert(
                page_id.to_string(),
                json!({"data": {"id": page_id, "name": name, "layouts": [layout]}}),
            );
            state
                .page_names
                .push((page_id.to_string(), name.to_string()));
        }
        self
    }

    /// Drop the server-side session, as a server restart or timeout would.
    pub fn expire_session(&self) {
        self.state().session = None;
    }

    fn has_session(&self, headers: &HeaderMap) -> bool {
        let current = self.state().session.clone();
        current.is_some() && cookie(headers, "SESSION") == current
    }

    /// 401 unless the request carries a session; 403 for unsigned writes.
    fn guard(&self, headers: &HeaderMap, write: bool) -> Option<Response> {
        if !self.has_session(headers) {
            return Some((StatusCode::UNAUTHORIZED, Json(json!({"message": "login required"}))).into_response());
        }
        if write && !has_xsrf(headers) {
            return Some((StatusCode::FORBIDDEN, Json(json!({"message": "missing xsrf"}))).into_response());
        }
        None
    }

    /// Start serving on an ephemeral port; returns the base URL.
    pub async fn spawn(&self) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(self.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }
}

pub fn config(base_url: &str) -> AppsmithConfig {
    AppsmithConfig::new(base_url)
        .unwrap()
        .with_credentials(Credentials::new(EMAIL, PASSWORD))
}

pub fn api(base_url: &str) -> AppsmithApi {
    AppsmithApi::new(SessionClient::new(config(base_url)).unwrap())
}

fn cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.to_string())
}

fn has_xsrf(headers: &HeaderMap) -> bool {
    headers
        .get("x-xsrf-token")
        .and_then(|v| v.to_str().ok())
        == Some(XSRF)
}

fn router(mock: MockAppsmith) -> Router {
    Router::new()
        .route("/api/v1/users/me", get(users_me))
        .route("/api/v1/login", post(login))
        .route("/api/v1/health", get(|| async { Json(json!({"data": "ok"})) }))
        .route(
            "/api/v1/forbidden",
            get(|| async { (StatusCode::FORBIDDEN, Json(json!({"message": "forbidden"}))) }),
        )
        .route(
            "/api/v1/boom",
            get(|| async { (StatusCode::BAD_GATEWAY, "x".repeat(3000)) }),
        )
        .route("/api/v1/pages", get(list_pages).post(create_page))
        .route("/api/v1/pages/{page_id}", get(fetch_page))
        .route("/api/v1/layouts/{layout_id}/pages/{page_id}", put(save_layout))
        .route("/api/v1/applications/publish/{app_id}", post(publish))
        .with_state(mock)
}

async fn users_me(State(mock): State<MockAppsmith>, headers: HeaderMap) -> Response {
    let anonymous = !mock.has_session(&headers);
    let body = Json(json!({"data": {"email": if anonymous { "anonymousUser" } else { EMAIL }, "isAnonymous": anonymous}}));
    if mock.state().issue_xsrf && cookie(&headers, "XSRF-TOKEN").is_none() {
        let set = format!("XSRF-TOKEN={XSRF}; Path=/");
        return ([(header::SET_COOKIE, set)], body).into_response();
    }
    body.into_response()
}

async fn login(
    State(mock): State<MockAppsmith>,
    headers: HeaderMap,
    Form(fields): Form<HashMap<String, String>>,
) -> Response {
    if !has_xsrf(&headers) {
        return (StatusCode::FORBIDDEN, "missing xsrf").into_response();
    }
    let logins = {
        let mut state = mock.state();
        state.logins += 1;
        state.logins
    };
    let accepted = fields.get("username").map(String::as_str) == Some(EMAIL)
        && fields.get("password").map(String::as_str) == Some(PASSWORD);
    if !accepted {
        return StatusCode::OK.into_response();
    }
    let session = format!("s-{logins}");
    mock.state().session = Some(session.clone());
    let set = format!("SESSION={session}; Path=/; HttpOnly");
    ([(header::SET_COOKIE, set)], StatusCode::OK).into_response()
}

async fn list_pages(
    State(mock): State<MockAppsmith>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if let Some(denied) = mock.guard(&headers, false) {
        return denied;
    }
    let _ = query.get("applicationId");
    let pages: Vec<Value> = mock
        .state()
        .page_names
        .iter()
        .map(|(id, name)| json!({"id": id, "name": name}))
        .collect();
    Json(json!({"data": {"pages": pages}})).into_response()
}

async fn create_page(
    State(mock): State<MockAppsmith>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Response {
    if let Some(denied) = mock.guard(&headers, true) {
        return denied;
    }
    let mut state = mock.state();
    state.create_attempts.push(Recorded {
        path: "/api/v1/pages".to_string(),
        query,
        body: body.clone(),
    });
    if state.create_failures > 0 {
        state.create_failures -= 1;
        return (StatusCode::BAD_REQUEST, Json(json!({"message": "applicationId is required"})))
            .into_response();
    }

    let name = body["name"].as_str().unwrap_or("Untitled").to_string();
    state.pages.insert(
        "p-new".to_string(),
        json!({"data": {"id": "p-new", "name": name, "layouts": [
            {"id": "l-new", "dsl": {"widgetId": "0", "widgetName": "MainContainer", "type": "CANVAS_WIDGET", "children": []}}
        ]}}),
    );
    state.page_names.push(("p-new".to_string(), name));
    Json(json!({"data": {"id": "p-new"}})).into_response()
}

async fn fetch_page(
    State(mock): State<MockAppsmith>,
    headers: HeaderMap,
    Path(page_id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if let Some(denied) = mock.guard(&headers, false) {
        return denied;
    }
    assert_eq!(query.get("migrateDsl").map(String::as_str), Some("false"));
    match mock.state().pages.get(&page_id) {
        Some(page) => Json(page.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({"message": "no such page"}))).into_response(),
    }
}

async fn save_layout(
    State(mock): State<MockAppsmith>,
    headers: HeaderMap,
    Path((layout_id, page_id)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Response {
    if let Some(denied) = mock.guard(&headers, true) {
        return denied;
    }
    let mut state = mock.state();
    if state.fail_saves {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"message": "save exploded"})))
            .into_response();
    }
    state.saves.push(Recorded {
        path: format!("/api/v1/layouts/{layout_id}/pages/{page_id}"),
        query,
        body: body.clone(),
    });
    if let Some(layouts) = state
        .pages
        .get_mut(&page_id)
        .and_then(|p| p["data"]["layouts"].as_array_mut())
    {
        for layout in layouts.iter_mut() {
            if layout["id"] == json!(layout_id) {
                layout["dsl"] = body["dsl"].clone();
            }
        }
    }
    Json(json!({"data": {"id": layout_id, "layoutOnLoadActions": []}, "responseMeta": {"success": true}}))
        .into_response()
}

async fn publish(
    State(mock): State<MockAppsmith>,
    headers: HeaderMap,
    Path(app_id): Path<String>,
) -> Response {
    if let Some(denied) = mock.guard(&headers, true) {
        return denied;
    }
    mock.state().publishes.push(app_id);
    Json(json!({"data": true})).into_response()
}
