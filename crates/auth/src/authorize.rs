use std::collections::{BTreeSet, HashMap};

use serde::Serialize;
use thiserror::Error;

use crate::{Permission, Principal, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: role '{role}' may not perform '{permission}'")]
    Forbidden { role: Role, permission: Permission },
}

/// The `(operation, role) → allow` table.
///
/// Anything not listed is denied.
#[derive(Debug, Clone)]
pub struct Policy {
    grants: HashMap<Permission, BTreeSet<Role>>,
}

impl Policy {
    /// An empty policy (denies everything).
    pub fn deny_all() -> Self {
        Self {
            grants: HashMap::new(),
        }
    }

    /// The warehouse role table.
    pub fn standard() -> Self {
        use Permission::*;
        use Role::*;

        const EVERYONE: &[Role] = &[Admin, Supervisor, Picker];
        const LEADS: &[Role] = &[Admin, Supervisor];
        const ADMIN_ONLY: &[Role] = &[Admin];

        Self::deny_all()
            .grant(&[ItemsRead, ReceiptsRead, OrdersRead, DashboardRead], EVERYONE)
            .grant(&[ItemsCreate, ItemsUpdate], ADMIN_ONLY)
            .grant(
                &[
                    ReceiptsCreate,
                    ReceiptsAddLine,
                    ReceiptsReceiveLine,
                    ReceiptsClose,
                ],
                EVERYONE,
            )
            .grant(
                &[OrdersCreate, OrdersAddLine, OrdersPack, OrdersShip, OrdersClose],
                LEADS,
            )
            .grant(&[OrdersPickLine], EVERYONE)
            .grant(
                &[
                    UsersList,
                    UsersCreate,
                    UsersUpdate,
                    UsersResetPassword,
                    UsersDelete,
                ],
                ADMIN_ONLY,
            )
            .grant(&[AccountChangePassword], EVERYONE)
    }

    pub fn grant(mut self, permissions: &[Permission], roles: &[Role]) -> Self {
        for permission in permissions {
            self.grants
                .entry(*permission)
                .or_default()
                .extend(roles.iter().copied());
        }
        self
    }

    pub fn allows(&self, role: Role, permission: Permission) -> bool {
        self.grants
            .get(&permission)
            .is_some_and(|roles| roles.contains(&role))
    }

    /// Roles allowed to perform `permission`, in declaration order.
    pub fn allowed_roles(&self, permission: Permission) -> Vec<Role> {
        self.grants
            .get(&permission)
            .map(|roles| roles.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Everything `role` may do, sorted by name.
    pub fn permissions_for(&self, role: Role) -> Vec<Permission> {
        let mut perms: Vec<Permission> = Permission::ALL
            .into_iter()
            .filter(|p| self.allows(role, *p))
            .collect();
        perms.sort_by_key(|p| p.as_str());
        perms
    }
}

impl Default for Policy {
    fn default() -> Self {
        Self::standard()
    }
}

/// Check a principal against the policy.
///
/// - No IO
/// - No panics
pub fn authorize(
    principal: &Principal,
    required: Permission,
    policy: &Policy,
) -> Result<(), AuthzError> {
    if policy.allows(principal.role, required) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden {
            role: principal.role,
            permission: required,
        })
    }
}

/// Why an authorization decision was (or would be) made.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationExplanation {
    pub required_permission: &'static str,
    pub role: Role,
    pub granted: bool,
    pub reason: String,
    pub allowed_roles: Vec<Role>,
}

/// Explain a decision; used for audit logs and `/whoami`-style tooling.
pub fn explain_authorization(
    principal: &Principal,
    required: Permission,
    policy: &Policy,
) -> AuthorizationExplanation {
    let allowed_roles = policy.allowed_roles(required);
    let granted = allowed_roles.contains(&principal.role);

    let reason = if granted {
        format!("role '{}' is granted '{}'", principal.role, required)
    } else if allowed_roles.is_empty() {
        format!("no role is granted '{required}'")
    } else {
        let names: Vec<&str> = allowed_roles.iter().map(|r| r.as_str()).collect();
        format!(
            "role '{}' lacks '{}' (requires one of: {})",
            principal.role,
            required,
            names.join(", ")
        )
    };

    AuthorizationExplanation {
        required_permission: required.as_str(),
        role: principal.role,
        granted,
        reason,
        allowed_roles,
    }
}
