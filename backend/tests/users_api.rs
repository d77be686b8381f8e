use axum::http::{Method, StatusCode};
use serde_json::json;
use website_backend::models::user::{TIMES_READ, TIMES_WRITE, USERS_ADMIN};

mod support;

use support::{api_request, app, login_token, memory_state, response_json, seed_user, send};

#[tokio::test]
async fn admins_manage_users() {
    let state = memory_state("bearer");
    seed_user(&state, "admin", &[USERS_ADMIN]).await;
    let token = login_token(&state, "admin").await;
    let app = app(state.clone());

    let response = send(
        &app,
        api_request(
            &state,
            Method::POST,
            "/api/users",
            Some(&token),
            Some(&json!({ "username": "michael", "password": "password1" })),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = response_json(response).await;
    assert_eq!(created["username"], "michael");
    assert_eq!(created["capabilities"], json!([TIMES_READ, TIMES_WRITE]));
    assert!(created.get("password_hash").is_none());

    let response = send(
        &app,
        api_request(&state, Method::GET, "/api/users", Some(&token), None),
    )
    .await;
    let listed = response_json(response).await;
    let names: Vec<&str> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["username"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["admin", "michael"]);

    // The new account can log in straight away.
    assert!(state
        .authenticator
        .login("michael", "password1")
        .await
        .is_ok());

    let response = send(
        &app,
        api_request(&state, Method::DELETE, "/api/users/michael", Some(&token), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(
        &app,
        api_request(&state, Method::DELETE, "/api/users/michael", Some(&token), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn duplicate_and_invalid_users_are_rejected() {
    let state = memory_state("bearer");
    seed_user(&state, "admin", &[USERS_ADMIN]).await;
    let token = login_token(&state, "admin").await;
    let app = app(state.clone());

    let response = send(
        &app,
        api_request(
            &state,
            Method::POST,
            "/api/users",
            Some(&token),
            Some(&json!({ "username": "admin", "password": "password1" })),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = send(
        &app,
        api_request(
            &state,
            Method::POST,
            "/api/users",
            Some(&token),
            Some(&json!({ "username": "", "password": "short" })),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = response_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");

    let response = send(
        &app,
        api_request(
            &state,
            Method::POST,
            "/api/users",
            Some(&token),
            Some(&json!({
                "username": "michael",
                "password": "password1",
                "capabilities": ["ROOT"]
            })),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn user_management_requires_the_admin_capability() {
    let state = memory_state("bearer");
    seed_user(&state, "michael", &[TIMES_READ, TIMES_WRITE]).await;
    let token = login_token(&state, "michael").await;
    let app = app(state.clone());

    let response = send(
        &app,
        api_request(&state, Method::GET, "/api/users", Some(&token), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(&app, api_request(&state, Method::GET, "/api/users", None, None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn deleting_a_user_ends_their_sessions() {
    let state = memory_state("bearer");
    seed_user(&state, "admin", &[USERS_ADMIN]).await;
    seed_user(&state, "michael", &[TIMES_READ]).await;
    let admin = login_token(&state, "admin").await;
    let michael = login_token(&state, "michael").await;
    let app = app(state.clone());

    let response = send(
        &app,
        api_request(&state, Method::DELETE, "/api/users/michael", Some(&admin), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(
        &app,
        api_request(&state, Method::GET, "/api/times", Some(&michael), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admins_cannot_delete_themselves() {
    let state = memory_state("bearer");
    seed_user(&state, "admin", &[USERS_ADMIN]).await;
    let token = login_token(&state, "admin").await;
    let app = app(state.clone());

    let response = send(
        &app,
        api_request(&state, Method::DELETE, "/api/users/admin", Some(&token), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
