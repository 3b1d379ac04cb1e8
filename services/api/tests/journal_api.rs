//! End-to-end tests of the HTTP surface over the in-memory storage adapter.

use std::sync::Arc;

use api_lib::adapters::InMemoryDb;
use api_lib::config::Config;
use api_lib::web::{build_router, state::AppState};
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;
use weekly_journal_core::domain::{NewReflection, ReflectionEntry, User, UserCredentials};
use weekly_journal_core::ports::{DatabaseService, PortError, PortResult};
use weekly_journal_core::week::FixedClock;

// 2026-10-18 is the Sunday of 2026-W42.
const CURRENT_WEEK: &str = "2026-W42";

fn test_config() -> Arc<Config> {
    Arc::new(
        Config::from_lookup(|key| match key {
            "STORAGE_BACKEND" => Some("memory".to_string()),
            "COOKIE_SECURE" => Some("false".to_string()),
            _ => None,
        })
        .unwrap(),
    )
}

fn app_with(db: Arc<dyn DatabaseService>) -> Router {
    let clock = FixedClock::on(NaiveDate::from_ymd_opt(2026, 10, 18).unwrap());
    let state = AppState::new(db, Arc::new(clock), test_config());
    build_router(Arc::new(state)).unwrap()
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Option<String>, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let cookie = resp
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_string);
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, cookie, body)
}

fn json_request(method: &str, uri: &str, cookie: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

async fn sign_up(app: &Router, email: &str) -> String {
    let (status, cookie, _) = send(
        app,
        json_request(
            "POST",
            "/auth/signup",
            None,
            json!({"email": email, "password": "hunter22"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    cookie.expect("signup sets the session cookie")
}

#[tokio::test]
async fn test_first_reflection_updates_stats() {
    let app = app_with(Arc::new(InMemoryDb::new()));
    let cookie = sign_up(&app, "me@example.com").await;

    let (status, _, stats) = send(&app, get("/stats", Some(cookie.as_str()))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats, json!({"streak": 0, "avg_rating": 0.0, "total": 0}));

    let uri = format!("/reflections/{}", CURRENT_WEEK);
    let (status, _, saved) = send(
        &app,
        json_request("PUT", &uri, Some(cookie.as_str()), json!({"went_well": "ran 10k", "rating": "4"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(saved["message"], "Reflection saved!");
    assert_eq!(saved["entry"]["rating"], 4);
    assert_eq!(saved["entry"]["rating_label"], "Good");
    assert_eq!(saved["entry"]["week_display"], "Oct 12 - Oct 18, 2026");
    assert_eq!(saved["stats"], json!({"streak": 1, "avg_rating": 4.0, "total": 1}));

    let (_, _, stats) = send(&app, get("/stats", Some(cookie.as_str()))).await;
    assert_eq!(stats, json!({"streak": 1, "avg_rating": 4.0, "total": 1}));
}

#[tokio::test]
async fn test_saving_same_week_twice_keeps_one_row() {
    let db = Arc::new(InMemoryDb::new());
    let app = app_with(db.clone());
    let cookie = sign_up(&app, "me@example.com").await;

    for (text, rating) in [("first draft", 2), ("second thoughts", 5)] {
        let (status, _, saved) = send(
            &app,
            json_request(
                "PUT",
                "/reflections/2026-W40",
                Some(cookie.as_str()),
                json!({"learned": text, "rating": rating}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(saved["stats"]["total"], 1);
        assert_eq!(saved["stats"]["avg_rating"], rating as f64);
    }

    assert_eq!(db.reflection_count().await, 1);
    let (_, _, list) = send(&app, get("/reflections", Some(cookie.as_str()))).await;
    let entries = list["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["learned"], "second thoughts");
    assert_eq!(entries[0]["rating"], 5);
    assert_eq!(list["warning"], Value::Null);

    let (status, _, entry) = send(&app, get("/reflections/2026-W40", Some(cookie.as_str()))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(entry["learned"], "second thoughts");
}

#[tokio::test]
async fn test_streak_breaks_on_gap() {
    let app = app_with(Arc::new(InMemoryDb::new()));
    let cookie = sign_up(&app, "me@example.com").await;

    for week in ["2026-W42", "2026-W40", "2026-W39"] {
        let uri = format!("/reflections/{}", week);
        let (status, _, _) = send(&app, json_request("PUT", &uri, Some(cookie.as_str()), json!({}))).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, _, stats) = send(&app, get("/stats", Some(cookie.as_str()))).await;
    assert_eq!(stats, json!({"streak": 1, "avg_rating": 3.0, "total": 3}));
}

#[tokio::test]
async fn test_reflections_are_private_per_user() {
    let app = app_with(Arc::new(InMemoryDb::new()));
    let alice = sign_up(&app, "alice@example.com").await;
    let bob = sign_up(&app, "bob@example.com").await;

    send(
        &app,
        json_request("PUT", "/reflections/2026-W42", Some(alice.as_str()), json!({"focus": "rest"})),
    )
    .await;

    let (_, _, list) = send(&app, get("/reflections", Some(bob.as_str()))).await;
    assert_eq!(list["entries"], json!([]));
    let (status, _, _) = send(&app, get("/reflections/2026-W42", Some(bob.as_str()))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_requests_without_session_are_rejected() {
    let app = app_with(Arc::new(InMemoryDb::new()));
    let (status, _, _) = send(&app, get("/reflections", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _, _) = send(&app, get("/stats", Some("session=made-up"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_invalidates_session() {
    let app = app_with(Arc::new(InMemoryDb::new()));
    let cookie = sign_up(&app, "me@example.com").await;

    let (status, _, me) = send(&app, get("/auth/me", Some(cookie.as_str()))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "me@example.com");

    let (status, cleared, _) =
        send(&app, json_request("POST", "/auth/logout", Some(cookie.as_str()), json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cleared.as_deref(), Some("session="));

    let (status, _, _) = send(&app, get("/auth/me", Some(cookie.as_str()))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_signup_and_login_errors() {
    let app = app_with(Arc::new(InMemoryDb::new()));
    sign_up(&app, "me@example.com").await;

    let cases = [
        (
            "/auth/signup",
            json!({"email": "me@example.com", "password": "hunter22"}),
            StatusCode::CONFLICT,
            "This email is already registered. Please log in instead.",
        ),
        (
            "/auth/signup",
            json!({"email": "new@example.com", "password": "123"}),
            StatusCode::BAD_REQUEST,
            "Password should be at least 6 characters long.",
        ),
        (
            "/auth/signup",
            json!({"email": "not an email", "password": "hunter22"}),
            StatusCode::BAD_REQUEST,
            "Please enter a valid email address.",
        ),
        (
            "/auth/login",
            json!({"email": "me@example.com", "password": "wrong-one"}),
            StatusCode::UNAUTHORIZED,
            "Invalid email or password. Please try again.",
        ),
    ];
    for (uri, body, expected_status, expected_message) in cases {
        let (status, _, message) = send(&app, json_request("POST", uri, None, body)).await;
        assert_eq!(status, expected_status, "{uri}");
        assert_eq!(message, Value::String(expected_message.to_string()));
    }

    let (status, cookie, _) = send(
        &app,
        json_request(
            "POST",
            "/auth/login",
            None,
            json!({"email": "me@example.com", "password": "hunter22"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(cookie.unwrap().starts_with("session="));
}

#[tokio::test]
async fn test_malformed_input_is_rejected() {
    let app = app_with(Arc::new(InMemoryDb::new()));
    let cookie = sign_up(&app, "me@example.com").await;

    for uri in ["/reflections/2026-42", "/reflections/2026-W54", "/reflections/week"] {
        let (status, _, _) = send(&app, json_request("PUT", uri, Some(cookie.as_str()), json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
    }

    let (status, _, _) = send(
        &app,
        json_request("PUT", "/reflections/2026-W42", Some(cookie.as_str()), json!({"rating": 7})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_week_endpoints() {
    let app = app_with(Arc::new(InMemoryDb::new()));

    let (status, _, current) = send(&app, get("/weeks/current", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(current["week_key"], CURRENT_WEEK);
    assert_eq!(current["monday"], "2026-10-12");
    assert_eq!(current["sunday"], "2026-10-18");
    assert_eq!(current["is_current"], true);

    let (status, _, week) = send(&app, get("/weeks/2025-W01", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(week["monday"], "2024-12-30");
    assert_eq!(week["heading"], "December 30 - January 05, 2025");
    assert_eq!(week["is_current"], false);
}

#[tokio::test]
async fn test_journal_overview_selects_week() {
    let app = app_with(Arc::new(InMemoryDb::new()));
    let cookie = sign_up(&app, "me@example.com").await;
    for (week, rating) in [("2026-W41", 5), ("2026-W42", 4)] {
        let uri = format!("/reflections/{}", week);
        send(&app, json_request("PUT", &uri, Some(cookie.as_str()), json!({"rating": rating}))).await;
    }

    let (status, _, journal) = send(&app, get("/journal", Some(cookie.as_str()))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(journal["selected"]["week_key"], CURRENT_WEEK);
    assert_eq!(journal["entry"]["rating"], 4);
    assert_eq!(journal["stats"], json!({"streak": 2, "avg_rating": 4.5, "total": 2}));
    assert_eq!(journal["history"][0]["week_key"], "2026-W42");
    assert_eq!(journal["history"][1]["week_key"], "2026-W41");

    let (_, _, journal) = send(&app, get("/journal?week=2026-W30", Some(cookie.as_str()))).await;
    assert_eq!(journal["selected"]["is_current"], false);
    assert_eq!(journal["entry"], Value::Null);
}

/// Delegates accounts to the in-memory adapter but cannot reach reflections.
struct ReflectionsDown(InMemoryDb);

#[async_trait]
impl DatabaseService for ReflectionsDown {
    async fn create_user_with_email(&self, email: &str, hash: &str) -> PortResult<User> {
        self.0.create_user_with_email(email, hash).await
    }
    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        self.0.get_user_by_email(email).await
    }
    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        self.0.get_user_by_id(user_id).await
    }
    async fn create_auth_session(
        &self,
        id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        self.0.create_auth_session(id, user_id, expires_at).await
    }
    async fn validate_auth_session(&self, id: &str) -> PortResult<Uuid> {
        self.0.validate_auth_session(id).await
    }
    async fn delete_auth_session(&self, id: &str) -> PortResult<()> {
        self.0.delete_auth_session(id).await
    }
    async fn get_reflections_by_user(&self, _: Uuid) -> PortResult<Vec<ReflectionEntry>> {
        Err(PortError::Unexpected("relation \"reflections\" is unavailable".into()))
    }
    async fn upsert_reflection(&self, _: NewReflection) -> PortResult<ReflectionEntry> {
        Err(PortError::Unexpected("write timed out".into()))
    }
}

#[tokio::test]
async fn test_storage_failures_degrade_gracefully() {
    let app = app_with(Arc::new(ReflectionsDown(InMemoryDb::new())));
    let cookie = sign_up(&app, "me@example.com").await;

    let (status, _, list) = send(&app, get("/reflections", Some(cookie.as_str()))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["entries"], json!([]));
    assert!(list["warning"]
        .as_str()
        .unwrap()
        .starts_with("Error loading reflections:"));

    let (status, _, message) = send(
        &app,
        json_request("PUT", "/reflections/2026-W42", Some(cookie.as_str()), json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        message,
        Value::String(
            "Error saving reflection: An unexpected error occurred: write timed out".to_string()
        )
    );
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = app_with(Arc::new(InMemoryDb::new()));
    let (status, _, doc) = send(&app, get("/api-docs/openapi.json", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(doc["paths"]["/reflections/{week_key}"].is_object());
    assert!(doc["paths"]["/journal"].is_object());
}
