use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::{
    config::{Config, CredentialCarrier},
    error::{AppError, LOGIN_REQUIRED_MESSAGE},
    services::AuthError,
    state::AppState,
    utils::cookies::extract_cookie_value,
};

/// What a gated route demands of the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Authenticated,
    Capability(&'static str),
}

/// Rejects requests without a live session (or without the required
/// capability) before they reach the handler. On success the resolved
/// [`ActiveSession`](crate::models::session_token::ActiveSession) is available
/// to handlers as an `Extension`.
pub async fn auth(
    State((state, requirement)): State<(AppState, Requirement)>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(raw_token) = extract_token(request.headers(), &state.config) else {
        return reject_unauthenticated(request.headers(), &state.config);
    };

    let session = match state.authenticator.resolve(&raw_token).await {
        Ok(Some(session)) => session,
        Ok(None) => return reject_unauthenticated(request.headers(), &state.config),
        Err(err) => return AppError::from(err).into_response(),
    };

    if let Requirement::Capability(capability) = requirement {
        if !session.has_capability(capability) {
            tracing::warn!(
                user_id = %session.user_id,
                capability,
                path = %request.uri().path(),
                "missing capability"
            );
            return reject_forbidden(request.headers(), capability);
        }
    }

    request.extensions_mut().insert(session);
    next.run(request).await
}

/// The raw token from the deployment's credential carrier, if present.
pub fn extract_token(headers: &HeaderMap, config: &Config) -> Option<String> {
    let token = match config.auth_carrier {
        CredentialCarrier::Bearer => headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_bearer_token)
            .map(str::to_owned),
        CredentialCarrier::Cookie => headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find_map(|raw| extract_cookie_value(raw, &config.session_cookie_name)),
    };
    token.filter(|value| !value.is_empty())
}

fn parse_bearer_token(header: &str) -> Option<&str> {
    let (scheme, rest) = header.trim().split_once(' ')?;
    if scheme.eq_ignore_ascii_case("bearer") {
        Some(rest.trim())
    } else {
        None
    }
}

/// JSON unless the client asked for something else. A missing `Accept`
/// header counts as JSON.
pub fn accepts_json(headers: &HeaderMap) -> bool {
    let Some(accept) = headers
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok())
    else {
        return true;
    };
    if accept.trim().is_empty() {
        return true;
    }
    accept.split(',').any(|entry| {
        let media = entry.split(';').next().unwrap_or("").trim();
        media.eq_ignore_ascii_case("application/json") || media.ends_with("+json")
    })
}

fn reject_unauthenticated(headers: &HeaderMap, config: &Config) -> Response {
    if accepts_json(headers) {
        AppError::Unauthorized(LOGIN_REQUIRED_MESSAGE.to_string()).into_response()
    } else {
        Redirect::to(&config.login_redirect).into_response()
    }
}

fn reject_forbidden(headers: &HeaderMap, capability: &str) -> Response {
    let err = AuthError::MissingCapability(capability.to_string());
    if accepts_json(headers) {
        AppError::from(err).into_response()
    } else {
        (StatusCode::FORBIDDEN, err.to_string()).into_response()
    }
}
