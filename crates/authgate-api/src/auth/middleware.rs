//! Authorization chain middleware
//!
//! Request-scoped pipeline of checks, each independently attachable to a
//! protected route group and composed by plain layering. The chain
//! short-circuits at the first failing stage:
//!
//! 1. `auth_middleware` - extracts the bearer token, verifies it, and inserts
//!    the resolved `Principal` into request extensions
//! 2. `require_role` - exact role match
//! 3. `require_permissions` - role resolved through the permission table
//! 4. `require_owner` - path-carried resource id vs the principal

use super::error::AuthError;
use super::jwt::Claims;
use crate::state::AppState;
use authgate_core::{Permission, Principal, Role};
use axum::{
    extract::{RawPathParams, Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::warn;

/// Boxed future type for the middleware factories below
type ChainFuture =
    std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, AuthError>> + Send>>;

/// Build the resolved principal from verified claims
///
/// Tokens without a role claim resolve to the lowest role.
fn principal_from_claims(claims: Claims) -> Principal {
    let role = claims
        .role
        .as_deref()
        .and_then(Role::parse)
        .unwrap_or(Role::User);

    Principal {
        id: claims.sub,
        role,
    }
}

/// Read the bearer credential from the authorization header
fn extract_bearer(request: &Request) -> Result<&str, AuthError> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(AuthError::MissingToken)
}

/// Authentication middleware requiring a valid access token
///
/// On success the resolved `Principal` is available to downstream stages and
/// handlers via `Extension<Principal>`.
///
/// # Usage
///
/// ```ignore
/// let app = Router::new()
///     .route("/protected", get(protected_handler))
///     .route_layer(middleware::from_fn_with_state(state, auth_middleware));
/// ```
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = extract_bearer(&request)?;

    let claims = state.codec.decode_and_verify(token).map_err(|e| {
        warn!("Token verification failed: {e}");
        AuthError::from(e)
    })?;

    request.extensions_mut().insert(principal_from_claims(claims));

    Ok(next.run(request).await)
}

/// Middleware factory for role-based access control
///
/// The required role matches case-insensitively against the token's role
/// claim (roles parse case-insensitively into the enum).
///
/// # Example
///
/// ```ignore
/// let app = Router::new()
///     .route("/admin/users", get(list_users))
///     .route_layer(middleware::from_fn(require_role(Role::Admin)))
///     .route_layer(middleware::from_fn_with_state(state, auth_middleware));
/// ```
pub fn require_role(required: Role) -> impl Fn(Request, Next) -> ChainFuture + Clone {
    move |request: Request, next: Next| {
        Box::pin(async move {
            let principal = request
                .extensions()
                .get::<Principal>()
                .cloned()
                .ok_or(AuthError::MissingToken)?;

            if principal.role != required {
                warn!(
                    "Role check failed for user {}: required {required}, has {}",
                    principal.id, principal.role
                );
                return Err(AuthError::InsufficientPermissions {
                    missing: Vec::new(),
                });
            }

            Ok(next.run(request).await)
        })
    }
}

/// Middleware factory for permission-set access control
///
/// All required permissions must be covered by the set the permission table
/// grants the principal's role; the uncovered remainder is attached to the
/// failure as detail.
pub fn require_permissions(
    required: &'static [Permission],
) -> impl Fn(State<Arc<AppState>>, Request, Next) -> ChainFuture + Clone {
    move |State(state): State<Arc<AppState>>, request: Request, next: Next| {
        Box::pin(async move {
            let principal = request
                .extensions()
                .get::<Principal>()
                .cloned()
                .ok_or(AuthError::MissingToken)?;

            let missing = state.permissions.missing(principal.role, required);
            if !missing.is_empty() {
                warn!(
                    "Permission check failed for user {}: missing {missing:?}",
                    principal.id
                );
                return Err(AuthError::InsufficientPermissions { missing });
            }

            Ok(next.run(request).await)
        })
    }
}

/// Middleware factory for resource-ownership checks
///
/// Compares the named path parameter against the principal's id. Admin
/// bypasses the check unconditionally.
pub fn require_owner(
    param: &'static str,
) -> impl Fn(RawPathParams, Request, Next) -> ChainFuture + Clone {
    move |params: RawPathParams, request: Request, next: Next| {
        Box::pin(async move {
            let principal = request
                .extensions()
                .get::<Principal>()
                .cloned()
                .ok_or(AuthError::MissingToken)?;

            if principal.is_admin() {
                return Ok(next.run(request).await);
            }

            let owns = params
                .iter()
                .find(|(name, _)| *name == param)
                .is_some_and(|(_, value)| value == principal.id);

            if !owns {
                warn!(
                    "Ownership check failed for user {} on parameter {param}",
                    principal.id
                );
                return Err(AuthError::NotResourceOwner);
            }

            Ok(next.run(request).await)
        })
    }
}
