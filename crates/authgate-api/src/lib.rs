//! Authgate API - Token-based authentication and authorization service
//!
//! Provides HTTP endpoints for registration, login, token refresh, and
//! logout, plus a protected item demo exercising the authorization chain.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod state;

use crate::auth::{auth_middleware, require_owner, require_permissions, require_role};
use crate::handlers::{auth as auth_handlers, health, items};
use crate::state::AppState;
use authgate_core::{Permission, Role};
use axum::{
    http::HeaderValue,
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the application router
///
/// Each protected route group declares the ordered subset of authorization
/// stages it requires; the authentication stage is layered over all of them
/// and runs first.
pub fn create_router(state: Arc<AppState>) -> Router {
    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/auth/register", post(auth_handlers::register_handler))
        .route("/auth/login", post(auth_handlers::login_handler))
        .route("/auth/refresh", post(auth_handlers::refresh_handler));

    // Session routes (authentication only)
    let session_routes = Router::new()
        .route("/auth/logout", post(auth_handlers::logout_handler))
        .route("/auth/me", get(auth_handlers::me_handler));

    // Item reads require READ_ITEMS
    let item_read_routes = Router::new()
        .route("/items", get(items::list_items))
        .route("/items/:id", get(items::get_item))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_permissions(&[Permission::ReadItems]),
        ));

    // Item creation requires WRITE_ITEMS; the item is owned by the caller
    let item_write_routes = Router::new()
        .route("/items", post(items::create_item))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_permissions(&[Permission::WriteItems]),
        ));

    // Item updates are restricted to the admin role
    let item_update_routes = Router::new()
        .route("/items/:id", put(items::update_item))
        .route_layer(axum_middleware::from_fn(require_role(Role::Admin)));

    // Item deletion requires DELETE_ITEMS, granted only through the admin's
    // implicit full permission set
    let item_delete_routes = Router::new()
        .route("/items/:id", delete(items::delete_item))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_permissions(&[Permission::DeleteItems]),
        ));

    // User detail is visible to its owner (admin bypasses)
    let owner_routes = Router::new()
        .route("/users/:user_id", get(auth_handlers::user_detail_handler))
        .route_layer(axum_middleware::from_fn(require_owner("user_id")));

    // Admin-only listing
    let admin_routes = Router::new()
        .route("/admin/users", get(auth_handlers::list_users_handler))
        .route_layer(axum_middleware::from_fn(require_role(Role::Admin)));

    let protected_routes = session_routes
        .merge(item_read_routes)
        .merge(item_write_routes)
        .merge(item_update_routes)
        .merge(item_delete_routes)
        .merge(owner_routes)
        .merge(admin_routes)
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let cors = cors_layer(&state);

    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .nest("/api/v1", public_routes.merge(protected_routes))
        .layer(axum_middleware::from_fn(
            middleware::security_headers_middleware,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(state: &AppState) -> CorsLayer {
    let origins: Vec<HeaderValue> = state
        .config
        .server
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}
