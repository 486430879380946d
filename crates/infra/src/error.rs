//! Service-level error model.

use chrono::NaiveDate;
use thiserror::Error;

use pantry_auth::AuthzError;
use pantry_core::{DomainError, OrderId, PantryItemId};
use pantry_orders::OrderStatus;

use crate::store::StoreError;

/// Why a new order request was refused.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RequestRejection {
    #[error("item {0} does not exist")]
    ItemNotFound(PantryItemId),

    #[error("item {item_id} expired on {expiry_date}")]
    ItemExpired {
        item_id: PantryItemId,
        expiry_date: NaiveDate,
    },

    #[error("item {item_id} has {available} on hand, {requested} requested")]
    InsufficientStock {
        item_id: PantryItemId,
        available: i64,
        requested: i64,
    },
}

/// Error returned by the lifecycle manager and the billing aggregator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("invalid request: {0}")]
    InvalidRequest(#[from] RequestRejection),

    #[error("invalid quantity: {0}")]
    InvalidQuantity(i64),

    #[error("cannot {action} order {order_id} in status {status}")]
    InvalidTransition {
        order_id: OrderId,
        status: OrderStatus,
        action: &'static str,
    },

    #[error("insufficient stock for item {item_id} (available: {available}, requested: {requested})")]
    InsufficientStock {
        item_id: PantryItemId,
        available: i64,
        requested: i64,
    },

    #[error("invalid month label: {0:?}")]
    InvalidMonthLabel(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("store failure: {0}")]
    Store(StoreError),
}

impl ServiceError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl From<AuthzError> for ServiceError {
    fn from(value: AuthzError) -> Self {
        match value {
            AuthzError::Forbidden(permission) => ServiceError::Unauthorized(permission),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound { entity, id } => ServiceError::NotFound { entity, id },
            StoreError::InsufficientStock {
                item_id,
                available,
                requested,
            } => ServiceError::InsufficientStock {
                item_id,
                available,
                requested,
            },
            StoreError::Conflict(msg) => ServiceError::Conflict(msg),
            other => ServiceError::Store(other),
        }
    }
}

/// Context-free mapping. Order transitions map `InvalidTransition` and
/// `NotFound` with the order at hand instead (see the lifecycle manager).
impl From<DomainError> for ServiceError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::InvalidQuantity(q) => ServiceError::InvalidQuantity(q),
            DomainError::InvalidMonthLabel(label) => ServiceError::InvalidMonthLabel(label),
            DomainError::NotFound(what) => ServiceError::NotFound {
                entity: "record",
                id: what,
            },
            DomainError::Conflict(msg) | DomainError::InvalidTransition(msg) => {
                ServiceError::Conflict(msg)
            }
            other @ (DomainError::Validation(_)
            | DomainError::InvalidId(_)
            | DomainError::InsufficientStock { .. }) => ServiceError::Validation(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_keep_their_meaning() {
        let item_id = PantryItemId::new();
        assert_eq!(
            ServiceError::from(StoreError::InsufficientStock {
                item_id,
                available: 1,
                requested: 2
            }),
            ServiceError::InsufficientStock {
                item_id,
                available: 1,
                requested: 2
            }
        );
        assert!(matches!(
            ServiceError::from(StoreError::Poisoned),
            ServiceError::Store(StoreError::Poisoned)
        ));
    }

    #[test]
    fn forbidden_becomes_unauthorized() {
        let err = ServiceError::from(AuthzError::Forbidden("billing.delete".to_string()));
        assert_eq!(err, ServiceError::Unauthorized("billing.delete".to_string()));
    }

    #[test]
    fn transition_message_names_action_and_status() {
        let err = ServiceError::InvalidTransition {
            order_id: OrderId::new(),
            status: OrderStatus::Denied,
            action: "issue",
        };
        assert!(err.to_string().contains("cannot issue order"));
        assert!(err.to_string().ends_with("in status denied"));
    }
}
