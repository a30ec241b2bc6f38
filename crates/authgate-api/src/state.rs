//! Application state management
//!
//! Author: hephaex@gmail.com

use crate::auth::{
    hash_password, AuthService, CredentialStore, JwtError, RefreshTokenRegistry, TokenCodec, User,
};
use crate::handlers::items::ItemStore;
use authgate_core::{AppConfig, PermissionTable, Role};
use authgate_kv::KeyValueStore;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Application state shared across handlers
///
/// Owns the single instance of every auth collaborator; components receive
/// them by reference or cheap clone, never through globals.
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Token codec shared by the service and the authorization chain
    pub codec: Arc<TokenCodec>,
    /// Authentication service
    pub auth: AuthService,
    /// Role-to-permission table consumed by the authorization chain
    pub permissions: PermissionTable,
    /// Credential store
    pub users: Arc<CredentialStore>,
    /// Key-value backend, kept for the readiness probe
    pub kv: Arc<dyn KeyValueStore>,
    /// Item demo storage
    pub items: ItemStore,
    /// Server start time
    pub start_time: Instant,
}

impl AppState {
    /// Create application state from configuration and a key-value backend
    ///
    /// Fails only on signing misconfiguration, which is fatal at startup.
    pub fn new(config: AppConfig, kv: Arc<dyn KeyValueStore>) -> Result<Self, JwtError> {
        let codec = Arc::new(TokenCodec::new(&config.security)?);
        let users = Arc::new(CredentialStore::new());
        let registry = RefreshTokenRegistry::new(kv.clone());
        let auth = AuthService::new(
            users.clone(),
            registry,
            codec.clone(),
            config.security.clone(),
        );

        Ok(Self {
            config,
            codec,
            auth,
            permissions: PermissionTable::default(),
            users,
            kv,
            items: ItemStore::new(),
            start_time: Instant::now(),
        })
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Seed the default admin and user accounts
    ///
    /// Development convenience; seeded credentials bypass the password policy
    /// the way pre-provisioned accounts do.
    pub async fn seed_default_users(&self) {
        if !self.users.is_empty().await {
            warn!("Credential store already populated, skipping default users");
            return;
        }

        let defaults = [
            ("admin", "admin123", "admin@example.com", Role::Admin),
            ("user", "user123", "user@example.com", Role::User),
        ];

        for (username, password, email, role) in defaults {
            let hash = match hash_password(password) {
                Ok(hash) => hash,
                Err(e) => {
                    warn!("Failed to hash default password for {username}: {e}");
                    continue;
                }
            };

            let user = User::new(
                username.to_string(),
                hash,
                email.to_string(),
                None,
                role,
            );

            match self.users.insert(user).await {
                Ok(user) => info!("Seeded default {role} account {}", user.id),
                Err(e) => warn!("Failed to seed default account {username}: {e}"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use authgate_kv::MemoryStore;

    #[tokio::test]
    async fn test_seed_default_users_once() {
        let state =
            AppState::new(AppConfig::default(), Arc::new(MemoryStore::new())).unwrap();

        state.seed_default_users().await;
        assert_eq!(state.users.len().await, 2);

        // Re-seeding is a no-op
        state.seed_default_users().await;
        assert_eq!(state.users.len().await, 2);

        let admin = state.users.find_by_username("admin").await.unwrap();
        assert_eq!(admin.role, Role::Admin);
    }

    #[test]
    fn test_bad_signing_config_is_fatal() {
        let mut config = AppConfig::default();
        config.security.algorithm = "ES256".to_string();

        let result = AppState::new(config, Arc::new(MemoryStore::new()));
        assert!(result.is_err());
    }
}
