use thiserror::Error;

use pantry_core::UserId;

use crate::{Actor, Permission};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),
}

/// Check that the actor holds `required`. Pure policy, no IO.
pub fn authorize(actor: &Actor, required: &Permission) -> Result<(), AuthzError> {
    if actor.has(required) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(required.as_str().to_string()))
    }
}

/// Allow access to `owner`'s records if the actor *is* the owner, otherwise
/// require `required` (e.g. a staff-wide read permission).
pub fn authorize_owner_or(
    actor: &Actor,
    owner: UserId,
    required: &Permission,
) -> Result<(), AuthzError> {
    if actor.user_id == owner {
        return Ok(());
    }
    authorize(actor, required)
}
