//! Authentication and authorization module
//!
//! This module provides token-based authentication with the following components:
//! - Token encoding and verification (access and refresh tokens)
//! - Password hashing with Argon2 and policy validation
//! - The authorization chain middleware for protecting routes
//! - Authentication service orchestrating login, refresh, and logout
//! - The credential store and the refresh token registry

pub mod error;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod registry;
pub mod repository;
pub mod service;

pub use error::AuthError;
pub use jwt::{Claims, JwtError, TokenCodec};
pub use middleware::{auth_middleware, require_owner, require_permissions, require_role};
pub use models::{User, UserPublic};
pub use password::{hash_password, validate_policy, verify_password};
pub use registry::RefreshTokenRegistry;
pub use repository::{CredentialStore, RepositoryError};
pub use service::{AuthResponse, AuthService, LoginRequest, RefreshRequest, RegisterRequest};
