//! Authentication API handlers
//!
//! HTTP endpoints for registration, login, token refresh, logout, and user
//! lookup. All business logic lives in the auth service; handlers only adapt
//! requests and responses.
//!
//! Author: hephaex@gmail.com

use crate::auth::{AuthError, AuthResponse, LoginRequest, RefreshRequest, RegisterRequest, UserPublic};
use crate::error::AppError;
use crate::state::AppState;
use axum::{extract::Path, extract::State, response::IntoResponse, Extension, Json};
use authgate_core::Principal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

/// Logout response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LogoutResponse {
    pub message: String,
}

/// Register a new user account
///
/// Duplicate usernames and emails are rejected before the password policy is
/// evaluated; accounts default to the USER role unless one is supplied.
///
/// # Responses
///
/// * `201 Created` - User successfully registered
/// * `400 Bad Request` - Duplicate username/email or weak password
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = UserPublic),
        (status = 400, description = "Duplicate username/email or weak password", body = crate::error::ApiError),
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let user = state.auth.register(request).await?;

    Ok((axum::http::StatusCode::CREATED, Json(user)))
}

/// Login with username and password
///
/// Returns an access token (short-lived, carries the role) and a refresh
/// token (long-lived, stored server-side in the registry).
///
/// # Responses
///
/// * `200 OK` - Authentication successful, returns tokens
/// * `401 Unauthorized` - Invalid credentials
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = crate::error::ApiError),
        (status = 503, description = "Token store unavailable", body = crate::error::ApiError),
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let response = state.auth.login(request).await?;

    Ok(Json(response))
}

/// Refresh the access token
///
/// Exchanges a valid refresh token for a new access token. The refresh token
/// itself is not rotated and stays valid until logout or its own expiry.
///
/// # Responses
///
/// * `200 OK` - New access token issued
/// * `401 Unauthorized` - Invalid, expired, or superseded refresh token
#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh",
    tag = "auth",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Token refreshed successfully", body = AuthResponse),
        (status = 401, description = "Invalid refresh token", body = crate::error::ApiError),
    )
)]
pub async fn refresh_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RefreshRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let response = state.auth.refresh(request).await?;

    Ok(Json(response))
}

/// Logout the current session
///
/// Deletes the stored refresh token; idempotent. Requires authentication.
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    tag = "auth",
    responses(
        (status = 200, description = "Logout successful", body = LogoutResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Result<impl IntoResponse, AuthError> {
    state.auth.logout(&principal.id).await?;

    Ok(Json(LogoutResponse {
        message: "Logged out successfully".to_string(),
    }))
}

/// Get the current user's profile
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "auth",
    responses(
        (status = 200, description = "Current user profile", body = UserPublic),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn me_handler(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .auth
        .get_user(&principal.id)
        .await
        .ok_or_else(|| AppError::NotFound("User".to_string()))?;

    Ok(Json(user))
}

/// Get a user by id
///
/// Guarded by the ownership stage: callers see their own record, admins see
/// everyone's.
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}",
    tag = "users",
    params(("user_id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "User profile", body = UserPublic),
        (status = 403, description = "Not the resource owner", body = crate::error::ApiError),
        (status = 404, description = "User not found", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn user_detail_handler(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .auth
        .get_user(&user_id)
        .await
        .ok_or_else(|| AppError::NotFound("User".to_string()))?;

    Ok(Json(user))
}

/// List all users (admin only)
#[utoipa::path(
    get,
    path = "/api/v1/admin/users",
    tag = "users",
    responses(
        (status = 200, description = "All users", body = [UserPublic]),
        (status = 403, description = "Insufficient permissions", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_users_handler(
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let users: Vec<UserPublic> = state
        .users
        .list()
        .await
        .iter()
        .map(|u| u.to_public())
        .collect();

    Json(users)
}
