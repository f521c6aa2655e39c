//! Router assembly: public auth endpoints, protected endpoints behind
//! the access-token middleware, and the health check.

use axum::{
    middleware,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::{api as auth_api, auth_middleware, AuthState};

/// Create the API router
pub fn create_router(state: AuthState) -> Router {
    // Credential-carrying routes; the refresh endpoint authenticates
    // itself with a refresh token, so none of these sit behind the
    // access-token middleware.
    let auth_routes = Router::new()
        .route("/api/auth/register", post(auth_api::register))
        .route("/api/auth/login", post(auth_api::login))
        .route("/api/auth/refresh", get(auth_api::refresh))
        .with_state(state.clone());

    // Bearer-access-token routes
    let protected_routes = Router::new()
        .route("/api/auth/whoami", get(auth_api::whoami))
        .route("/api/auth/logout", get(auth_api::logout))
        .route("/api/users/all", get(auth_api::list_users))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .with_state(state);

    let public_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .merge(public_routes)
        .merge(auth_routes)
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Health check endpoint
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}
