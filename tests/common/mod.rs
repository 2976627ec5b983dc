use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, Response};
use axum::Router;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use http_body_util::BodyExt;
use sqlx::SqlitePool;
use tower::ServiceExt;

use userdesk::app::build_app;
use userdesk::config::AppConfig;
use userdesk::state::AppState;

/// Build a test `AppConfig` with the default admin account.
pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: String::new(),
        admin_email: "admin@example.com".to_string(),
    }
}

/// Build the full application router against the given pool, mirroring the
/// construction in the server binary so tests exercise the same middleware
/// stack.
pub fn build_test_app(pool: SqlitePool) -> Router {
    let state = AppState::from_parts(pool, Arc::new(test_config()));
    build_app(state)
}

pub fn basic_auth_header(email: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{email}:{password}")))
}

fn build_request(
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
    auth: Option<(&str, &str)>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some((email, password)) = auth {
        builder = builder.header(header::AUTHORIZATION, basic_auth_header(email, password));
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn get(app: Router, uri: &str, auth: Option<(&str, &str)>) -> Response<Body> {
    app.oneshot(build_request(Method::GET, uri, None, auth))
        .await
        .unwrap()
}

pub async fn post_json(
    app: Router,
    uri: &str,
    json: serde_json::Value,
    auth: Option<(&str, &str)>,
) -> Response<Body> {
    app.oneshot(build_request(Method::POST, uri, Some(json), auth))
        .await
        .unwrap()
}

pub async fn put_json(
    app: Router,
    uri: &str,
    json: serde_json::Value,
    auth: Option<(&str, &str)>,
) -> Response<Body> {
    app.oneshot(build_request(Method::PUT, uri, Some(json), auth))
        .await
        .unwrap()
}

pub async fn delete(app: Router, uri: &str, auth: Option<(&str, &str)>) -> Response<Body> {
    app.oneshot(build_request(Method::DELETE, uri, None, auth))
        .await
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Seed a user through the public create endpoint and return their id.
pub async fn seed_user(pool: &SqlitePool, name: &str, email: &str, password: &str) -> i64 {
    let app = build_test_app(pool.clone());
    let response = post_json(
        app,
        "/users",
        serde_json::json!({"name": name, "email": email, "password": password}),
        None,
    )
    .await;
    assert_eq!(response.status().as_u16(), 201, "seeding {email} failed");
    let json = body_json(response).await;
    json["user"]["id"].as_i64().unwrap()
}
