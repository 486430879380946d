use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use pantry_billing::{Billing, MonthKey};
use pantry_core::{BillingId, ExpectedVersion, OrderId, PantryItemId, UserId};
use pantry_inventory::{ItemFilter, PantryItem};
use pantry_orders::{Order, OrderEvent, OrderStatus};

/// Store operation error.
///
/// These are storage-level failures (missing rows, version conflicts, the
/// conditional decrement refusing) as opposed to domain decisions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("{entity} {id} already exists")]
    Duplicate { entity: &'static str, id: String },

    #[error("insufficient stock for item {item_id} (available: {available}, requested: {requested})")]
    InsufficientStock {
        item_id: PantryItemId,
        available: i64,
        requested: i64,
    },

    #[error("optimistic concurrency check failed: {0}")]
    Conflict(String),

    #[error("invalid store operation: {0}")]
    Invalid(String),

    #[error("store lock poisoned")]
    Poisoned,
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// Stock removed from an item as part of an order commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockDecrement {
    pub item_id: PantryItemId,
    pub amount: i64,
}

/// A decided order transition, ready to commit.
///
/// `order` is the post-transition state; `events` are the events that led
/// from the stored version to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderTransition {
    pub order: Order,
    pub expected_version: ExpectedVersion,
    pub events: Vec<OrderEvent>,
    pub decrement: Option<StockDecrement>,
}

/// Predicate over orders.
///
/// Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderQuery {
    pub user_id: Option<UserId>,
    pub status: Option<OrderStatus>,
    /// Half-open window on the order's effective date.
    pub effective_within: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

impl OrderQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn for_user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn effective_in(mut self, month: MonthKey) -> Self {
        self.effective_within = Some(month.window());
        self
    }

    pub fn matches(&self, order: &Order) -> bool {
        if !order.is_created() {
            return false;
        }
        if self.user_id.is_some_and(|u| u != order.user_id()) {
            return false;
        }
        if self.status.is_some_and(|s| s != order.status()) {
            return false;
        }
        if let Some((start, end)) = self.effective_within {
            let at = order.effective_date();
            if at < start || at >= end {
                return false;
            }
        }
        true
    }
}

/// Catalog items and quantity on hand.
///
/// The store is the sole mutator of quantity; `decrement` is a single
/// check-and-subtract that either applies fully or not at all.
pub trait InventoryStore: Send + Sync {
    /// Add a catalog entry. Duplicate ids are rejected.
    fn insert_item(&self, item: PantryItem) -> Result<(), StoreError>;

    fn get_item(&self, item_id: PantryItemId) -> Result<PantryItem, StoreError>;

    /// Atomically subtract `amount`. Returns the updated item.
    fn decrement(&self, item_id: PantryItemId, amount: i64) -> Result<PantryItem, StoreError>;

    /// Items matching `filter`, ordered by name.
    fn list_items(&self, filter: ItemFilter) -> Result<Vec<PantryItem>, StoreError>;
}

/// Orders and their append-only event history.
pub trait OrderStore: Send + Sync {
    /// Commit a decided transition.
    ///
    /// Implementations must, in one critical section:
    /// - check `expected_version` against the stored order (absent = 0)
    /// - apply `decrement` with the same semantics as [`InventoryStore::decrement`]
    /// - store the new order state and append `events` to its history
    ///
    /// Any failure leaves order, history and stock untouched. Returns the
    /// decremented item when the transition carried a decrement.
    fn commit_transition(&self, transition: OrderTransition) -> Result<Option<PantryItem>, StoreError>;

    fn get_order(&self, order_id: OrderId) -> Result<Order, StoreError>;

    /// Orders matching `query`, newest request first.
    fn query_orders(&self, query: &OrderQuery) -> Result<Vec<Order>, StoreError>;

    /// Every event applied to the order, oldest first.
    fn order_history(&self, order_id: OrderId) -> Result<Vec<OrderEvent>, StoreError>;

    /// Number of transitions committed on the user's orders so far.
    ///
    /// Read before querying the orders a bill is computed from, then passed
    /// to [`BillingStore::upsert_billing`] as the expected revision.
    fn order_revision(&self, user_id: UserId) -> Result<u64, StoreError>;
}

/// Monthly bills, unique per (user, month).
pub trait BillingStore: Send + Sync {
    /// Insert or replace the bill for `(billing.user_id(), billing.month())`.
    ///
    /// A replacement keeps the existing id (see [`Billing::supersede`]).
    /// `computed_at` is the [`OrderStore::order_revision`] of the bill's user
    /// the totals were computed against; if the user's orders moved on since,
    /// the bill is stale and the upsert fails with `Conflict`, leaving the
    /// stored bill untouched. Returns the stored bill.
    fn upsert_billing(&self, billing: Billing, computed_at: ExpectedVersion) -> Result<Billing, StoreError>;

    fn get_billing(&self, billing_id: BillingId) -> Result<Billing, StoreError>;

    /// Bills, most recently generated first; restricted to one user when given.
    fn list_billings(&self, user_id: Option<UserId>) -> Result<Vec<Billing>, StoreError>;

    /// Remove a bill, returning what was removed.
    fn delete_billing(&self, billing_id: BillingId) -> Result<Billing, StoreError>;
}

impl<S> InventoryStore for Arc<S>
where
    S: InventoryStore + ?Sized,
{
    fn insert_item(&self, item: PantryItem) -> Result<(), StoreError> {
        (**self).insert_item(item)
    }

    fn get_item(&self, item_id: PantryItemId) -> Result<PantryItem, StoreError> {
        (**self).get_item(item_id)
    }

    fn decrement(&self, item_id: PantryItemId, amount: i64) -> Result<PantryItem, StoreError> {
        (**self).decrement(item_id, amount)
    }

    fn list_items(&self, filter: ItemFilter) -> Result<Vec<PantryItem>, StoreError> {
        (**self).list_items(filter)
    }
}

impl<S> OrderStore for Arc<S>
where
    S: OrderStore + ?Sized,
{
    fn commit_transition(&self, transition: OrderTransition) -> Result<Option<PantryItem>, StoreError> {
        (**self).commit_transition(transition)
    }

    fn get_order(&self, order_id: OrderId) -> Result<Order, StoreError> {
        (**self).get_order(order_id)
    }

    fn query_orders(&self, query: &OrderQuery) -> Result<Vec<Order>, StoreError> {
        (**self).query_orders(query)
    }

    fn order_history(&self, order_id: OrderId) -> Result<Vec<OrderEvent>, StoreError> {
        (**self).order_history(order_id)
    }

    fn order_revision(&self, user_id: UserId) -> Result<u64, StoreError> {
        (**self).order_revision(user_id)
    }
}

impl<S> BillingStore for Arc<S>
where
    S: BillingStore + ?Sized,
{
    fn upsert_billing(&self, billing: Billing, computed_at: ExpectedVersion) -> Result<Billing, StoreError> {
        (**self).upsert_billing(billing, computed_at)
    }

    fn get_billing(&self, billing_id: BillingId) -> Result<Billing, StoreError> {
        (**self).get_billing(billing_id)
    }

    fn list_billings(&self, user_id: Option<UserId>) -> Result<Vec<Billing>, StoreError> {
        (**self).list_billings(user_id)
    }

    fn delete_billing(&self, billing_id: BillingId) -> Result<Billing, StoreError> {
        (**self).delete_billing(billing_id)
    }
}
