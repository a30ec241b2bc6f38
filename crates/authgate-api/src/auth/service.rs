//! Authentication service layer
//!
//! Business logic for registration, login, token refresh, and logout.
//! Composes the token codec, the credential store, and the refresh token
//! registry; holds no storage of its own.

use super::error::AuthError;
use super::jwt::TokenCodec;
use super::models::{User, UserPublic};
use super::password::{hash_password, validate_policy, verify_password};
use super::registry::RefreshTokenRegistry;
use super::repository::CredentialStore;
use authgate_core::{Role, SecurityConfig};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use utoipa::ToSchema;

/// User registration request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    /// Role for the new account; defaults to USER when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

/// User login request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Token refresh request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Authentication response with tokens
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub user: UserPublic,
}

/// Authentication service
///
/// Constructed once at startup from explicit collaborators; cloning is cheap
/// and shares the underlying store and codec.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<CredentialStore>,
    registry: RefreshTokenRegistry,
    codec: Arc<TokenCodec>,
    security: SecurityConfig,
}

impl AuthService {
    pub fn new(
        users: Arc<CredentialStore>,
        registry: RefreshTokenRegistry,
        codec: Arc<TokenCodec>,
        security: SecurityConfig,
    ) -> Self {
        Self {
            users,
            registry,
            codec,
            security,
        }
    }

    /// Register a new user
    ///
    /// Duplicate checks run before the password policy so no hashing happens
    /// for a request that will be rejected anyway. The final insert re-checks
    /// uniqueness atomically inside the store.
    pub async fn register(&self, request: RegisterRequest) -> Result<UserPublic, AuthError> {
        if self.users.username_taken(&request.username).await {
            warn!("Registration rejected: username already taken");
            return Err(AuthError::DuplicateUsername);
        }
        if self.users.email_taken(&request.email).await {
            warn!("Registration rejected: email already registered");
            return Err(AuthError::DuplicateEmail);
        }

        if !validate_policy(&request.password, &self.security.password) {
            warn!("Registration rejected: password policy violation");
            return Err(AuthError::WeakPassword);
        }

        let password_hash = hash_password(&request.password)?;
        let role = request.role.unwrap_or(Role::User);

        let user = self
            .users
            .insert(User::new(
                request.username,
                password_hash,
                request.email,
                request.full_name,
                role,
            ))
            .await?;

        info!("Registered user {} with role {}", user.id, user.role);
        Ok(user.to_public())
    }

    /// Login with username and password
    ///
    /// Unknown usernames and wrong passwords both collapse into the same
    /// opaque `InvalidCredentials` to prevent username enumeration.
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AuthError> {
        let mut user = match self.users.find_by_username(&request.username).await {
            Some(user) => user,
            None => {
                warn!("Login failed: unknown username");
                return Err(AuthError::InvalidCredentials);
            }
        };

        if !verify_password(&request.password, &user.password_hash)? {
            warn!("Login failed: password mismatch for user {}", user.id);
            return Err(AuthError::InvalidCredentials);
        }

        let now = Utc::now();
        self.users.record_login(&user.id, now).await?;
        user.last_login = Some(now);

        let access_token =
            self.codec
                .issue(&user.id, Some(user.role), self.security.access_token_ttl())?;
        let refresh_token = self
            .codec
            .issue(&user.id, None, self.security.refresh_token_ttl())?;

        // Persisting the refresh token is part of a successful login; a login
        // that cannot persist its token must not return success
        if let Err(e) = self
            .registry
            .save(
                &user.id,
                &refresh_token,
                self.security.refresh_token_ttl().as_secs(),
            )
            .await
        {
            error!("Failed to persist refresh token for user {}: {e}", user.id);
            return Err(AuthError::StoreUnavailable);
        }

        info!("Login successful for user {}", user.id);

        Ok(AuthResponse {
            access_token,
            refresh_token,
            token_type: "bearer".to_string(),
            expires_in: self.security.access_token_ttl().as_secs(),
            user: user.to_public(),
        })
    }

    /// Exchange a refresh token for a new access token
    ///
    /// The refresh token itself is not rotated; the stored slot remains valid
    /// until its own expiry or logout. Every failure mode is the same opaque
    /// `InvalidRefreshToken`.
    pub async fn refresh(&self, request: RefreshRequest) -> Result<AuthResponse, AuthError> {
        let claims = self
            .codec
            .decode_and_verify(&request.refresh_token)
            .map_err(|e| {
                warn!("Refresh token rejected: {e}");
                AuthError::InvalidRefreshToken
            })?;

        if !self
            .registry
            .verify(&claims.sub, &request.refresh_token)
            .await
        {
            warn!("Refresh token does not match stored slot for user {}", claims.sub);
            return Err(AuthError::InvalidRefreshToken);
        }

        let user = self
            .users
            .find_by_id(&claims.sub)
            .await
            .ok_or(AuthError::InvalidRefreshToken)?;

        let access_token =
            self.codec
                .issue(&user.id, Some(user.role), self.security.access_token_ttl())?;

        debug!("Issued new access token for user {}", user.id);

        Ok(AuthResponse {
            access_token,
            refresh_token: request.refresh_token,
            token_type: "bearer".to_string(),
            expires_in: self.security.access_token_ttl().as_secs(),
            user: user.to_public(),
        })
    }

    /// Logout by deleting the stored refresh token
    ///
    /// Idempotent: logging out with no stored token is still a success.
    pub async fn logout(&self, user_id: &str) -> Result<(), AuthError> {
        let deleted = self.registry.delete(user_id).await?;
        info!("Logout for user {user_id} (token deleted: {deleted})");
        Ok(())
    }

    /// Public view of a user
    pub async fn get_user(&self, user_id: &str) -> Option<UserPublic> {
        self.users.find_by_id(user_id).await.map(|u| u.to_public())
    }
}
