use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::Permission;

/// Role identifier used for RBAC.
///
/// Roles are opaque strings; the presets below map the pantry's three
/// built-in roles to their permissions. Unknown roles grant nothing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const MEMBER: Role = Role(Cow::Borrowed("member"));
    pub const STAFF: Role = Role(Cow::Borrowed("staff"));
    pub const ADMIN: Role = Role(Cow::Borrowed("admin"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Permissions granted by this role.
    pub fn permissions(&self) -> Vec<Permission> {
        match self.as_str() {
            "member" => vec![Permission::ORDERS_REQUEST],
            "staff" => vec![
                Permission::ORDERS_REQUEST,
                Permission::ORDERS_MANAGE,
                Permission::ORDERS_VIEW_ALL,
                Permission::BILLING_GENERATE,
                Permission::BILLING_VIEW_ALL,
                Permission::BILLING_DELETE,
            ],
            "admin" => vec![Permission::WILDCARD],
            _ => Vec::new(),
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
