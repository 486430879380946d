use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission identifier.
///
/// Permissions are modeled as opaque strings (e.g. "orders.manage").
/// The wildcard permission `"*"` grants everything.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    /// Place a request for a pantry item on one's own behalf.
    pub const ORDERS_REQUEST: Permission = Permission(Cow::Borrowed("orders.request"));
    /// Approve, deny and issue orders.
    pub const ORDERS_MANAGE: Permission = Permission(Cow::Borrowed("orders.manage"));
    /// Read every user's orders.
    pub const ORDERS_VIEW_ALL: Permission = Permission(Cow::Borrowed("orders.view_all"));
    /// Generate (or regenerate) monthly bills.
    pub const BILLING_GENERATE: Permission = Permission(Cow::Borrowed("billing.generate"));
    /// Read every user's bills.
    pub const BILLING_VIEW_ALL: Permission = Permission(Cow::Borrowed("billing.view_all"));
    /// Remove a bill.
    pub const BILLING_DELETE: Permission = Permission(Cow::Borrowed("billing.delete"));
    /// Allow everything.
    pub const WILDCARD: Permission = Permission(Cow::Borrowed("*"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
