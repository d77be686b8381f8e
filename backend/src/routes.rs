use axum::{
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    handlers::{auth, timesheets, users},
    middleware::{self as gate, log_requests, Requirement},
    models::user::{TIMES_READ, TIMES_WRITE, USERS_ADMIN},
    state::AppState,
};

pub fn router(state: AppState) -> Router {
    // Logout and ping answer anonymous callers too.
    let public_routes = Router::new()
        .route("/api/login", post(auth::login))
        .route("/api/logout", post(auth::logout))
        .route("/api/ping", get(auth::ping));

    let timesheet_routes = Router::new()
        .route(
            "/api/times",
            get(timesheets::list_entries)
                .route_layer(from_fn_with_state(
                    (state.clone(), Requirement::Capability(TIMES_READ)),
                    gate::auth,
                ))
                .merge(post(timesheets::save_entry).route_layer(from_fn_with_state(
                    (state.clone(), Requirement::Capability(TIMES_WRITE)),
                    gate::auth,
                ))),
        )
        .route(
            "/api/times/{id}",
            delete(timesheets::delete_entry).route_layer(from_fn_with_state(
                (state.clone(), Requirement::Capability(TIMES_WRITE)),
                gate::auth,
            )),
        );

    let admin_routes = Router::new()
        .route("/api/users", get(users::list_users).post(users::create_user))
        .route("/api/users/{username}", delete(users::delete_user))
        .route_layer(from_fn_with_state(
            (state.clone(), Requirement::Capability(USERS_ADMIN)),
            gate::auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(timesheet_routes)
        .merge(admin_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(from_fn(log_requests))
                .layer(cors_layer(&state.config.cors_allow_origins)),
        )
        .with_state(state)
}

/// Cross-origin access is off unless origins are listed explicitly; the
/// session cookie requires credentialed requests, which rule out `*`.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if allowed.is_empty() {
        return CorsLayer::new();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(24 * 60 * 60))
}
