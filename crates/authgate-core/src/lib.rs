//! Authgate Core - Shared domain models and configuration
//!
//! This crate defines the abstractions used throughout the authgate system:
//! - Access control primitives (roles, permissions, the role-to-permission table)
//! - The resolved principal handed to business logic after authentication
//! - Configuration management

pub mod config;

pub use config::{AppConfig, ConfigError, PasswordPolicy, RedisConfig, SecurityConfig, ServerConfig};

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use utoipa::ToSchema;

// ============================================================================
// Access Control
// ============================================================================

/// User role
///
/// Defines the access level for a user in the system:
/// - Admin: full access, implicitly granted every permission
/// - Editor: can read and write items
/// - User: read-only access to items
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    User,
    Editor,
}

impl Role {
    /// Convert role to its wire representation
    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => "ADMIN",
            Role::User => "USER",
            Role::Editor => "EDITOR",
        }
    }

    /// Parse a role from a string, case-insensitively
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "ADMIN" => Some(Role::Admin),
            "USER" => Some(Role::User),
            "EDITOR" => Some(Role::Editor),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Fine-grained capability, coarser than an endpoint, finer than a role
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    ReadItems,
    WriteItems,
    DeleteItems,
}

impl Permission {
    pub fn as_str(&self) -> &str {
        match self {
            Permission::ReadItems => "READ_ITEMS",
            Permission::WriteItems => "WRITE_ITEMS",
            Permission::DeleteItems => "DELETE_ITEMS",
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Static role-to-permission mapping
///
/// Injected at construction rather than scattered across conditionals so the
/// mapping is independently testable and swappable. Admin is not listed in the
/// table: it is implicitly granted every permission, including ones added
/// later.
#[derive(Debug, Clone)]
pub struct PermissionTable {
    grants: HashMap<Role, HashSet<Permission>>,
}

impl PermissionTable {
    /// Build a table from explicit per-role grants
    pub fn new(grants: HashMap<Role, HashSet<Permission>>) -> Self {
        Self { grants }
    }

    /// Permissions granted to a role (empty for roles without an entry)
    pub fn permissions_for(&self, role: Role) -> HashSet<Permission> {
        self.grants.get(&role).cloned().unwrap_or_default()
    }

    /// Required permissions the role does not hold
    ///
    /// Returns an empty vector when access should be granted. Admin always
    /// passes regardless of the table contents.
    pub fn missing(&self, role: Role, required: &[Permission]) -> Vec<Permission> {
        if role == Role::Admin {
            return Vec::new();
        }

        let granted = self.grants.get(&role);
        required
            .iter()
            .filter(|p| granted.map_or(true, |set| !set.contains(p)))
            .copied()
            .collect()
    }
}

impl Default for PermissionTable {
    fn default() -> Self {
        let mut grants = HashMap::new();
        grants.insert(Role::User, HashSet::from([Permission::ReadItems]));
        grants.insert(
            Role::Editor,
            HashSet::from([Permission::ReadItems, Permission::WriteItems]),
        );
        Self { grants }
    }
}

// ============================================================================
// Principal
// ============================================================================

/// Resolved identity of the current caller after successful token verification
///
/// Inserted into request extensions by the authentication middleware and
/// consumed by authorization stages and business handlers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    /// User id (token subject)
    pub id: String,
    /// Role carried by the access token
    pub role: Role,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_case_insensitive() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("ADMIN"), Some(Role::Admin));
        assert_eq!(Role::parse("Editor"), Some(Role::Editor));
        assert_eq!(Role::parse("user"), Some(Role::User));
        assert_eq!(Role::parse("superuser"), None);
    }

    #[test]
    fn test_role_round_trip() {
        for role in [Role::Admin, Role::User, Role::Editor] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
    }

    #[test]
    fn test_permission_serialization() {
        let json = serde_json::to_string(&Permission::ReadItems).unwrap();
        assert_eq!(json, "\"READ_ITEMS\"");

        let parsed: Permission = serde_json::from_str("\"WRITE_ITEMS\"").unwrap();
        assert_eq!(parsed, Permission::WriteItems);
    }

    #[test]
    fn test_editor_permission_monotonicity() {
        let table = PermissionTable::default();

        assert!(table
            .missing(Role::Editor, &[Permission::ReadItems])
            .is_empty());
        assert!(table
            .missing(Role::Editor, &[Permission::ReadItems, Permission::WriteItems])
            .is_empty());
        assert_eq!(
            table.missing(Role::Editor, &[Permission::DeleteItems]),
            vec![Permission::DeleteItems]
        );
    }

    #[test]
    fn test_user_read_only() {
        let table = PermissionTable::default();

        assert!(table.missing(Role::User, &[Permission::ReadItems]).is_empty());
        assert_eq!(
            table.missing(Role::User, &[Permission::WriteItems]),
            vec![Permission::WriteItems]
        );
    }

    #[test]
    fn test_admin_implicit_all() {
        let table = PermissionTable::default();

        assert!(table
            .missing(
                Role::Admin,
                &[
                    Permission::ReadItems,
                    Permission::WriteItems,
                    Permission::DeleteItems
                ]
            )
            .is_empty());
    }

    #[test]
    fn test_missing_reports_only_the_gap() {
        let table = PermissionTable::default();

        let missing = table.missing(
            Role::User,
            &[Permission::ReadItems, Permission::DeleteItems],
        );
        assert_eq!(missing, vec![Permission::DeleteItems]);
    }
}
