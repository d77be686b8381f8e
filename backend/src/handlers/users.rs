use axum::{
    extract::{rejection::JsonRejection, Extension, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        session_token::ActiveSession,
        user::{default_capabilities, find_unknown_capability, CreateUser, User},
    },
    state::AppState,
};

pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, AppError> {
    let users = state.authenticator.credentials().list().await?;
    Ok(Json(users))
}

pub async fn create_user(
    State(state): State<AppState>,
    Extension(session): Extension<ActiveSession>,
    payload: Result<Json<CreateUser>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let capabilities = payload.capabilities.unwrap_or_else(default_capabilities);
    if let Some(unknown) = find_unknown_capability(&capabilities) {
        return Err(AppError::BadRequest(format!("unknown capability {}", unknown)));
    }

    let user = state
        .authenticator
        .credentials()
        .create(&payload.username, &payload.password, capabilities)
        .await?;
    tracing::info!(admin = %session.user_id, user_id = %user.id, "user created via API");
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Extension(session): Extension<ActiveSession>,
    Path(username): Path<String>,
) -> Result<Json<Value>, AppError> {
    if username == session.username {
        return Err(AppError::BadRequest(
            "Administrators cannot delete their own account".into(),
        ));
    }
    if !state.authenticator.credentials().delete(&username).await? {
        return Err(AppError::NotFound(format!("user `{}` not found", username)));
    }
    tracing::info!(admin = %session.user_id, %username, "user deleted via API");
    Ok(Json(json!({ "success": true })))
}
