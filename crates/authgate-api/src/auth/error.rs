//! Authentication and authorization failure taxonomy
//!
//! Every variant is an expected, client-driven outcome that maps to an HTTP
//! status and a machine-readable code; the web layer only serializes it.
//! Internal faults are folded into `Internal`, surface as a generic failure,
//! and never leak details to the caller.

use super::jwt::JwtError;
use super::password::PasswordError;
use super::repository::RepositoryError;
use crate::error::ApiError;
use authgate_core::Permission;
use authgate_kv::KvError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// Authentication and authorization errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authentication token is required")]
    MissingToken,

    #[error("Token structure or signature is invalid")]
    MalformedToken,

    #[error("Token has expired")]
    ExpiredToken,

    #[error("Refresh token is invalid")]
    InvalidRefreshToken,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Insufficient permissions")]
    InsufficientPermissions { missing: Vec<Permission> },

    #[error("Only the resource owner may access this resource")]
    NotResourceOwner,

    #[error("Username is already taken")]
    DuplicateUsername,

    #[error("Email is already registered")]
    DuplicateEmail,

    #[error("Password does not meet the policy requirements")]
    WeakPassword,

    #[error("Token store is unavailable")]
    StoreUnavailable,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// HTTP status for this failure
    ///
    /// 401 for authentication failures, 403 for authorization failures,
    /// 400 for registration/validation failures.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingToken
            | AuthError::MalformedToken
            | AuthError::ExpiredToken
            | AuthError::InvalidRefreshToken
            | AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::InsufficientPermissions { .. } | AuthError::NotResourceOwner => {
                StatusCode::FORBIDDEN
            }
            AuthError::DuplicateUsername | AuthError::DuplicateEmail | AuthError::WeakPassword => {
                StatusCode::BAD_REQUEST
            }
            AuthError::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error code
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "MISSING_TOKEN",
            AuthError::MalformedToken => "MALFORMED_TOKEN",
            AuthError::ExpiredToken => "EXPIRED_TOKEN",
            AuthError::InvalidRefreshToken => "INVALID_REFRESH_TOKEN",
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::InsufficientPermissions { .. } => "INSUFFICIENT_PERMISSIONS",
            AuthError::NotResourceOwner => "NOT_RESOURCE_OWNER",
            AuthError::DuplicateUsername => "DUPLICATE_USERNAME",
            AuthError::DuplicateEmail => "DUPLICATE_EMAIL",
            AuthError::WeakPassword => "WEAK_PASSWORD",
            AuthError::StoreUnavailable => "STORE_UNAVAILABLE",
            AuthError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match &self {
            // Never echo internal context to the client
            AuthError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };

        let mut error = ApiError::new(self.error_code(), message);
        if let AuthError::InsufficientPermissions { missing } = &self {
            if !missing.is_empty() {
                error = error.with_details(serde_json::json!({ "missing": missing }));
            }
        }

        (status, Json(error)).into_response()
    }
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::MalformedToken => AuthError::MalformedToken,
            JwtError::ExpiredToken => AuthError::ExpiredToken,
            other => AuthError::Internal(other.to_string()),
        }
    }
}

impl From<PasswordError> for AuthError {
    fn from(err: PasswordError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

impl From<RepositoryError> for AuthError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::DuplicateUsername => AuthError::DuplicateUsername,
            RepositoryError::DuplicateEmail => AuthError::DuplicateEmail,
            // Looking up a user that vanished mid-flow is not a client fault
            RepositoryError::UserNotFound => AuthError::Internal("user not found".to_string()),
        }
    }
}

impl From<KvError> for AuthError {
    fn from(_: KvError) -> Self {
        AuthError::StoreUnavailable
    }
}
