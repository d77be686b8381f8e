use std::time::Duration;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::{
    config::CredentialCarrier,
    error::AppError,
    middleware::auth::extract_token,
    models::{
        session_token::PingResult,
        user::{LoginRequest, LoginResponse},
    },
    state::AppState,
    utils::cookies::{build_clear_cookie, build_session_cookie},
};

pub const MISSING_CREDENTIALS_MESSAGE: &str = "please enter the username and password";

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(payload) = payload?;
    if payload.username.is_empty() || payload.password.is_empty() {
        return Err(AppError::Unauthorized(MISSING_CREDENTIALS_MESSAGE.to_string()));
    }

    let token = state
        .authenticator
        .login(&payload.username, &payload.password)
        .await?;

    let mut response = Json(LoginResponse {
        success: true,
        token: token.id.clone(),
    })
    .into_response();

    if state.config.auth_carrier == CredentialCarrier::Cookie {
        let max_age = state
            .config
            .token_timeout()
            .to_std()
            .unwrap_or(Duration::ZERO);
        let cookie = build_session_cookie(
            &state.config.session_cookie_name,
            token.id.as_str(),
            max_age,
            state.config.cookie_options(),
        );
        append_cookie(&mut response, &cookie)?;
    }

    Ok(response)
}

/// Ends the presented session. Succeeds whether or not there was one.
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    if let Some(raw_token) = extract_token(&headers, &state.config) {
        state.authenticator.logout(&raw_token).await?;
    }

    let mut response = Json(json!({ "success": true })).into_response();
    if state.config.auth_carrier == CredentialCarrier::Cookie {
        let cookie = build_clear_cookie(
            &state.config.session_cookie_name,
            state.config.cookie_options(),
        );
        append_cookie(&mut response, &cookie)?;
    }
    Ok(response)
}

pub async fn ping(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<PingResult>, AppError> {
    let raw_token = extract_token(&headers, &state.config);
    let result = state.authenticator.ping(raw_token.as_deref()).await?;
    Ok(Json(result))
}

fn append_cookie(response: &mut Response, cookie: &str) -> Result<(), AppError> {
    let value = HeaderValue::from_str(cookie)
        .map_err(|e| AppError::InternalServerError(anyhow::anyhow!("invalid cookie: {}", e)))?;
    response.headers_mut().append(header::SET_COOKIE, value);
    Ok(())
}
