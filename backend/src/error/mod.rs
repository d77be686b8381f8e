use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;

use crate::repositories::StoreError;
use crate::services::AuthError;

pub const INVALID_CREDENTIALS_MESSAGE: &str = "invalid username or password";
pub const LOGIN_REQUIRED_MESSAGE: &str = "Login required";

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    Unauthorized(String),
    Forbidden(String),
    Conflict(String),
    BadRequest(String),
    InternalServerError(anyhow::Error),
    Validation(Vec<String>),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::BadRequest(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error_message, code, details) = match self {
            AppError::NotFound(msg) => (msg, "NOT_FOUND", None),
            AppError::Unauthorized(msg) => (msg, "UNAUTHORIZED", None),
            AppError::Forbidden(msg) => (msg, "FORBIDDEN", None),
            AppError::Conflict(msg) => (msg, "CONFLICT", None),
            AppError::BadRequest(msg) => (msg, "BAD_REQUEST", None),
            AppError::InternalServerError(err) => {
                tracing::error!("Internal server error: {:?}", err);
                (
                    "Internal server error".to_string(),
                    "INTERNAL_SERVER_ERROR",
                    None,
                )
            }
            AppError::Validation(errors) => (
                "Validation failed".to_string(),
                "VALIDATION_ERROR",
                Some(serde_json::json!({ "errors": errors })),
            ),
        };

        let body = Json(ErrorResponse {
            success: false,
            error: error_message,
            code: code.to_string(),
            details,
        });

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalServerError(err)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict => AppError::Conflict("Resource already exists".to_string()),
            StoreError::Backend(err) => AppError::InternalServerError(err),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidUser(_)
            | AuthError::InvalidPassword(_)
            | AuthError::InvalidCredentials => {
                AppError::Unauthorized(INVALID_CREDENTIALS_MESSAGE.to_string())
            }
            AuthError::TokenNotFound | AuthError::TokenExpired | AuthError::TokenRevoked => {
                AppError::Unauthorized(LOGIN_REQUIRED_MESSAGE.to_string())
            }
            AuthError::UserExists(username) => {
                AppError::Conflict(format!("user `{}` already exists", username))
            }
            err @ AuthError::MissingCapability(_) => AppError::Forbidden(err.to_string()),
            AuthError::TokenCollision => {
                AppError::InternalServerError(anyhow::anyhow!("session token collision"))
            }
            AuthError::Storage(err) => AppError::InternalServerError(err.into()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    let code = e.code.as_ref();
                    if field == "__all__" {
                        code.to_string()
                    } else {
                        format!("{}: {}", field, code)
                    }
                })
            })
            .collect();
        AppError::Validation(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn response_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        serde_json::from_slice(&bytes).expect("json")
    }

    #[tokio::test]
    async fn app_error_into_response_maps_status_and_body() {
        let cases = [
            (AppError::BadRequest("bad".into()), StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            (AppError::Unauthorized("nope".into()), StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            (AppError::Forbidden("denied".into()), StatusCode::FORBIDDEN, "FORBIDDEN"),
            (AppError::Conflict("taken".into()), StatusCode::CONFLICT, "CONFLICT"),
            (AppError::NotFound("missing".into()), StatusCode::NOT_FOUND, "NOT_FOUND"),
        ];
        for (error, status, code) in cases {
            let response = error.into_response();
            assert_eq!(response.status(), status);
            let json = response_json(response).await;
            assert_eq!(json["success"], false);
            assert_eq!(json["code"], code);
            assert!(json["error"].is_string());
        }
    }

    #[tokio::test]
    async fn app_error_validation_includes_details() {
        let response = AppError::Validation(vec!["field: invalid".to_string()]).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = response_json(response).await;
        assert_eq!(json["error"], "Validation failed");
        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert_eq!(json["details"]["errors"][0], "field: invalid");
    }

    #[tokio::test]
    async fn app_error_internal_maps_to_generic_message() {
        let response = AppError::InternalServerError(anyhow::anyhow!("boom")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = response_json(response).await;
        assert_eq!(json["error"], "Internal server error");
        assert_eq!(json["code"], "INTERNAL_SERVER_ERROR");
        assert!(json["details"].is_null());
    }

    #[tokio::test]
    async fn credential_failures_share_one_message() {
        for err in [
            AuthError::InvalidUser("nobody".into()),
            AuthError::InvalidPassword("michael".into()),
            AuthError::InvalidCredentials,
        ] {
            let response = AppError::from(err).into_response();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            let json = response_json(response).await;
            assert_eq!(json["error"], INVALID_CREDENTIALS_MESSAGE);
        }
    }

    #[tokio::test]
    async fn token_failures_ask_for_a_login() {
        for err in [
            AuthError::TokenNotFound,
            AuthError::TokenExpired,
            AuthError::TokenRevoked,
        ] {
            let response = AppError::from(err).into_response();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            let json = response_json(response).await;
            assert_eq!(json["error"], LOGIN_REQUIRED_MESSAGE);
        }
    }

    #[tokio::test]
    async fn missing_capability_names_the_capability() {
        let response =
            AppError::from(AuthError::MissingCapability("USERS/ADMIN".into())).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let json = response_json(response).await;
        assert_eq!(json["error"], "missing capability USERS/ADMIN");
        assert_eq!(json["code"], "FORBIDDEN");
    }

    #[tokio::test]
    async fn schema_level_validation_errors_are_reported_by_code() {
        let mut errors = validator::ValidationErrors::new();
        errors.add("__all__", validator::ValidationError::new("entry_ends_before_start"));
        errors.add("breaks", validator::ValidationError::new("breaks_negative"));
        let AppError::Validation(mut messages) = AppError::from(errors) else {
            panic!("expected a validation error");
        };
        messages.sort();
        assert_eq!(messages, vec!["breaks: breaks_negative", "entry_ends_before_start"]);
    }

    #[test]
    fn remaining_auth_errors_map_to_matching_statuses() {
        let status = |err: AuthError| AppError::from(err).status();
        assert_eq!(status(AuthError::UserExists("a".into())), StatusCode::CONFLICT);
        assert_eq!(
            status(AuthError::MissingCapability("USERS/ADMIN".into())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status(AuthError::TokenCollision),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status(AuthError::Storage(StoreError::Backend(anyhow::anyhow!("x")))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
