#![allow(dead_code)]
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use chrono::Datelike;
use eduportal_backend::{
    config::{Config, StorageBackend},
    db::{DocumentStore, MemoryDocumentStore},
    models::timetable::Weekday,
    routes::build_router,
    services::bootstrap::bootstrap,
    state::AppState,
    utils::now_in_timezone,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

pub const ADMIN_PASSWORD: &str = "admin123";

pub fn test_config() -> Config {
    Config {
        storage_backend: StorageBackend::Memory,
        production_mode: false,
        ..Config::default()
    }
}

pub struct TestApp {
    pub state: AppState,
    pub router: Router,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_store(Arc::new(MemoryDocumentStore::new()), test_config()).await
    }

    pub async fn with_config(config: Config) -> Self {
        Self::with_store(Arc::new(MemoryDocumentStore::new()), config).await
    }

    pub async fn with_store(store: Arc<dyn DocumentStore>, config: Config) -> Self {
        let state = AppState::new(config, store);
        bootstrap(&state.repos, &state.config)
            .await
            .expect("bootstrap collections");
        let router = build_router(state.clone());
        Self { state, router }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router response")
    }

    pub async fn call(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let response = self.send(json_request(method, uri, token, body)).await;
        let status = response.status();
        (status, body_json(response).await)
    }

    pub async fn login(&self, username: &str, password: &str) -> String {
        let (status, body) = self
            .call(
                "POST",
                "/api/auth/login",
                None,
                Some(json!({ "username": username, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        body["session_token"]
            .as_str()
            .expect("session token")
            .to_string()
    }

    pub async fn admin_token(&self) -> String {
        self.login("ADMIN", ADMIN_PASSWORD).await
    }

    /// Creates a Faculty account through the admin API and returns its username.
    pub async fn create_faculty(&self, admin_token: &str, name: &str) -> String {
        let (status, body) = self
            .call(
                "POST",
                "/api/users/add",
                Some(admin_token),
                Some(json!({ "name": name, "role": "Faculty" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "add user failed: {}", body);
        body["user"]["username"]
            .as_str()
            .expect("username")
            .to_string()
    }

    /// Creates a student record (and its login) and returns `(id, username)`.
    pub async fn create_student(&self, token: &str, name: &str, section: &str) -> (String, String) {
        let (status, body) = self
            .call(
                "POST",
                "/api/students/add",
                Some(token),
                Some(json!({ "student_name": name, "section": section })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "add student failed: {}", body);
        (
            body["student"]["id"].as_str().expect("id").to_string(),
            body["student"]["username"]
                .as_str()
                .expect("username")
                .to_string(),
        )
    }

    pub async fn activities(&self, token: &str) -> Vec<Value> {
        let (status, body) = self
            .call("GET", "/api/activities/list", Some(token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        body["data"].as_array().cloned().unwrap_or_default()
    }
}

pub fn json_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    let body = match body {
        Some(value) => {
            builder = builder.header("Content-Type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    builder.body(body).expect("build request")
}

pub async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
}

/// A teaching day other than today, so list-time expiry never touches the fixture.
pub fn not_today(config: &Config) -> Weekday {
    let today = Weekday::from_chrono(now_in_timezone(&config.time_zone).weekday());
    Weekday::ALL
        .into_iter()
        .find(|day| Some(*day) != today)
        .expect("at least one other teaching day")
}

/// A second teaching day, distinct from `first` and from today.
pub fn another_day(config: &Config, first: Weekday) -> Weekday {
    let today = Weekday::from_chrono(now_in_timezone(&config.time_zone).weekday());
    Weekday::ALL
        .into_iter()
        .find(|day| Some(*day) != today && *day != first)
        .expect("a second teaching day")
}

pub fn class_payload(day: Weekday, section: &str, start: &str, end: &str, class_name: &str) -> Value {
    json!({
        "day": day.as_str(),
        "start_time": start,
        "end_time": end,
        "class_name": class_name,
        "faculty_name": "Dr. Rao",
        "subject": "Mathematics",
        "section": section,
        "classroom": "101",
        "building": "Main",
    })
}
