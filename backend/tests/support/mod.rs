#![allow(dead_code)]
use std::collections::HashMap;

use axum::{
    body::Body,
    http::{header, Method, Request, Response},
    Router,
};
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tower::ServiceExt;
use website_backend::{
    config::{Config, CredentialCarrier},
    models::user::User,
    routes::router,
    state::AppState,
};

pub const PASSWORD: &str = "password1";

pub fn test_config(carrier: &str) -> Config {
    test_config_with(&[("AUTH_CARRIER", carrier)])
}

pub fn test_config_with(overrides: &[(&str, &str)]) -> Config {
    let mut vars: HashMap<String, String> = HashMap::new();
    vars.insert("DATABASE_URL".into(), "memory".into());
    for (key, value) in overrides {
        vars.insert(key.to_string(), value.to_string());
    }
    Config::from_lookup(|key| vars.get(key).cloned()).expect("test config")
}

pub fn memory_state(carrier: &str) -> AppState {
    AppState::in_memory(test_config(carrier))
}

pub async fn seed_user(state: &AppState, username: &str, capabilities: &[&str]) -> User {
    state
        .authenticator
        .credentials()
        .create(
            username,
            PASSWORD,
            capabilities.iter().map(|c| c.to_string()).collect(),
        )
        .await
        .expect("seed user")
}

pub async fn login_token(state: &AppState, username: &str) -> String {
    state
        .authenticator
        .login(username, PASSWORD)
        .await
        .expect("login")
        .id
        .to_string()
}

pub fn app(state: AppState) -> Router {
    router(state)
}

/// JSON API request, carrying `token` through whichever carrier `state` is
/// configured for.
pub fn api_request(
    state: &AppState,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<&Value>,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::ACCEPT, "application/json");
    if let Some(token) = token {
        builder = match state.config.auth_carrier {
            CredentialCarrier::Cookie => builder.header(
                header::COOKIE,
                format!("{}={}", state.config.session_cookie_name, token),
            ),
            CredentialCarrier::Bearer => {
                builder.header(header::AUTHORIZATION, format!("Bearer {}", token))
            }
        };
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.expect("router response")
}

pub async fn response_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}

/// Connects to `TEST_DATABASE_URL` and migrates it; `None` when unset so
/// database tests can skip on machines without PostgreSQL.
pub async fn test_pool() -> Option<PgPool> {
    let url = std::env::var("TEST_DATABASE_URL").ok()?;
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .expect("connect to TEST_DATABASE_URL");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("run migrations");
    Some(pool)
}
