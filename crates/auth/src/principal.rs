use pantry_core::UserId;

use crate::{Permission, Role};

/// An authenticated caller as seen by the core.
///
/// Built by the presentation layer from whatever identity system it uses;
/// the core never authenticates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: UserId,
    pub permissions: Vec<Permission>,
}

impl Actor {
    pub fn new(user_id: UserId, permissions: Vec<Permission>) -> Self {
        Self {
            user_id,
            permissions,
        }
    }

    /// Build an actor whose permissions are the union of the roles' presets.
    pub fn with_roles(user_id: UserId, roles: &[Role]) -> Self {
        let mut permissions: Vec<Permission> = Vec::new();
        for perm in roles.iter().flat_map(Role::permissions) {
            if !permissions.contains(&perm) {
                permissions.push(perm);
            }
        }
        Self::new(user_id, permissions)
    }

    pub fn member(user_id: UserId) -> Self {
        Self::with_roles(user_id, &[Role::MEMBER])
    }

    pub fn staff(user_id: UserId) -> Self {
        Self::with_roles(user_id, &[Role::STAFF])
    }

    pub fn admin(user_id: UserId) -> Self {
        Self::with_roles(user_id, &[Role::ADMIN])
    }

    pub fn has(&self, required: &Permission) -> bool {
        self.permissions
            .iter()
            .any(|p| p.is_wildcard() || p == required)
    }
}
