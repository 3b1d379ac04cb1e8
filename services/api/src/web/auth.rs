//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for user signup, login, logout and the current user.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;
use uuid::Uuid;
use weekly_journal_core::domain::{AuthSession, User};
use weekly_journal_core::ports::AuthError;

use crate::web::middleware::{session_id_from_headers, SESSION_COOKIE};
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub user_id: Uuid,
    pub email: String,
}

impl From<User> for AuthResponse {
    fn from(user: User) -> Self {
        Self {
            user_id: user.user_id,
            email: user.email,
        }
    }
}

//=========================================================================================
// Helpers
//=========================================================================================

/// Maps each authentication failure kind onto a status code and its user-facing message.
pub fn auth_error_response(e: AuthError) -> (StatusCode, String) {
    let status = match &e {
        AuthError::AlreadyRegistered => StatusCode::CONFLICT,
        AuthError::WeakPassword { .. } | AuthError::InvalidEmail => StatusCode::BAD_REQUEST,
        AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        AuthError::EmailNotConfirmed => StatusCode::FORBIDDEN,
        AuthError::Backend(_) => {
            error!("Identity backend failure: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, e.to_string())
}

fn session_cookie(state: &AppState, session: &AuthSession) -> String {
    let max_age = (session.expires_at - Utc::now()).num_seconds().max(0);
    format!(
        "{}={}; HttpOnly;{} SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE,
        session.id,
        if state.config.cookie_secure { " Secure;" } else { "" },
        max_age
    )
}

fn cleared_cookie(state: &AppState) -> String {
    format!(
        "{}=; HttpOnly;{} SameSite=Lax; Path=/; Max-Age=0",
        SESSION_COOKIE,
        if state.config.cookie_secure { " Secure;" } else { "" },
    )
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/signup - Create a new user account
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created successfully", body = AuthResponse),
        (status = 400, description = "Invalid email or weak password"),
        (status = 409, description = "Email already registered"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let (user, session) = state
        .identity
        .sign_up(&req.email, &req.password)
        .await
        .map_err(auth_error_response)?;

    let cookie = session_cookie(&state, &session);
    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse::from(user)),
    ))
}

/// POST /auth/login - Login with existing account
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let (user, session) = state
        .identity
        .sign_in(&req.email, &req.password)
        .await
        .map_err(auth_error_response)?;

    let cookie = session_cookie(&state, &session);
    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse::from(user)),
    ))
}

/// POST /auth/logout - Logout and invalidate session
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logout successful"),
        (status = 401, description = "No active session")
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let auth_session_id = session_id_from_headers(&headers)
        .ok_or((StatusCode::UNAUTHORIZED, "No session found".to_string()))?;

    state
        .identity
        .sign_out(auth_session_id)
        .await
        .map_err(auth_error_response)?;
    info!("Logged out");

    Ok((StatusCode::OK, [(header::SET_COOKIE, cleared_cookie(&state))]))
}

/// GET /auth/me - The signed-in user
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Current user", body = AuthResponse),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn me_handler(Extension(user): Extension<User>) -> Json<AuthResponse> {
    Json(AuthResponse::from(user))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_statuses() {
        assert_eq!(
            auth_error_response(AuthError::AlreadyRegistered).0,
            StatusCode::CONFLICT
        );
        assert_eq!(
            auth_error_response(AuthError::InvalidEmail).0,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            auth_error_response(AuthError::EmailNotConfirmed),
            (
                StatusCode::FORBIDDEN,
                "Please verify your email before logging in.".to_string()
            )
        );
        assert_eq!(
            auth_error_response(AuthError::Backend("boom".into())).0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
