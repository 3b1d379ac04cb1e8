//! services/api/src/web/mod.rs
//!
//! HTTP layer: handlers, auth middleware and the router that ties them together.

pub mod auth;
pub mod middleware;
pub mod rest;
pub mod state;
pub mod weeks;

pub use middleware::require_auth;

use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::error::ApiError;
use auth::{login_handler, logout_handler, me_handler, signup_handler};
use rest::{
    get_reflection_handler, list_reflections_handler, save_reflection_handler, stats_handler,
    ApiDoc,
};
use state::AppState;
use weeks::{current_week_handler, journal_handler, week_handler};

/// Builds the complete application router, including Swagger UI.
pub fn build_router(app_state: Arc<AppState>) -> Result<Router, ApiError> {
    let origin = app_state
        .config
        .cors_origin
        .parse::<HeaderValue>()
        .map_err(|e| ApiError::Internal(format!("Invalid CORS origin: {}", e)))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/auth/signup", post(signup_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/logout", post(logout_handler))
        .route("/weeks/current", get(current_week_handler))
        .route("/weeks/{week_key}", get(week_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/auth/me", get(me_handler))
        .route("/reflections", get(list_reflections_handler))
        .route(
            "/reflections/{week_key}",
            get(get_reflection_handler).put(save_reflection_handler),
        )
        .route("/stats", get(stats_handler))
        .route("/journal", get(journal_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .with_state(app_state);

    Ok(Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())))
}
