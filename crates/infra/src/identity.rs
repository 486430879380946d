//! Display names of users, owned by the identity system.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use pantry_core::UserId;

/// Resolves a user id to a human-readable name.
///
/// `None` means the identity system does not know the user; callers render a
/// placeholder instead of failing.
pub trait IdentityLookup: Send + Sync {
    fn resolve_display_name(&self, user_id: UserId) -> Option<String>;

    /// Display name, or `fallback` for unknown users.
    fn display_name_or(&self, user_id: UserId, fallback: &str) -> String {
        self.resolve_display_name(user_id)
            .unwrap_or_else(|| fallback.to_string())
    }
}

impl<L> IdentityLookup for Arc<L>
where
    L: IdentityLookup + ?Sized,
{
    fn resolve_display_name(&self, user_id: UserId) -> Option<String> {
        (**self).resolve_display_name(user_id)
    }
}

/// In-memory directory for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    names: RwLock<HashMap<UserId, String>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, user_id: UserId, display_name: impl Into<String>) {
        if let Ok(mut names) = self.names.write() {
            names.insert(user_id, display_name.into());
        }
    }

    pub fn with(self, user_id: UserId, display_name: impl Into<String>) -> Self {
        self.register(user_id, display_name);
        self
    }
}

impl IdentityLookup for InMemoryDirectory {
    fn resolve_display_name(&self, user_id: UserId) -> Option<String> {
        // A poisoned directory resolves nobody.
        self.names.read().ok()?.get(&user_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_registered_users_only() {
        let alice = UserId::new();
        let directory = InMemoryDirectory::new().with(alice, "Alice Doe");

        assert_eq!(directory.resolve_display_name(alice).as_deref(), Some("Alice Doe"));
        assert_eq!(directory.resolve_display_name(UserId::new()), None);
        assert_eq!(directory.display_name_or(UserId::new(), "Unknown"), "Unknown");
    }
}
