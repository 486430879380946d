use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use pantry_billing::{Billing, MonthKey};
use pantry_core::{AggregateRoot, BillingId, DomainError, ExpectedVersion, OrderId, PantryItemId, UserId};
use pantry_inventory::{ItemFilter, PantryItem};
use pantry_orders::{Order, OrderEvent};

use super::r#trait::{
    BillingStore, InventoryStore, OrderQuery, OrderStore, OrderTransition, StoreError,
};

#[derive(Debug, Default)]
struct PantryState {
    items: HashMap<PantryItemId, PantryItem>,
    orders: HashMap<OrderId, Order>,
    history: HashMap<OrderId, Vec<OrderEvent>>,
    billings: HashMap<BillingId, Billing>,
    billing_index: HashMap<(UserId, MonthKey), BillingId>,
    order_revisions: HashMap<UserId, u64>,
}

impl PantryState {
    fn decrement(&mut self, item_id: PantryItemId, amount: i64) -> Result<PantryItem, StoreError> {
        let item = self
            .items
            .get_mut(&item_id)
            .ok_or_else(|| StoreError::not_found("item", item_id))?;

        item.decrement(amount).map_err(|err| match err {
            DomainError::InsufficientStock {
                available,
                requested,
            } => StoreError::InsufficientStock {
                item_id,
                available,
                requested,
            },
            other => StoreError::Invalid(other.to_string()),
        })?;

        Ok(item.clone())
    }
}

/// In-memory store for inventory, orders and bills.
///
/// Intended for tests/dev. One lock guards all three so that an order commit
/// and its stock decrement happen in the same critical section.
#[derive(Debug, Default)]
pub struct InMemoryPantryStore {
    state: RwLock<PantryState>,
}

impl InMemoryPantryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, PantryState>, StoreError> {
        self.state.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, PantryState>, StoreError> {
        self.state.write().map_err(|_| StoreError::Poisoned)
    }
}

impl InventoryStore for InMemoryPantryStore {
    fn insert_item(&self, item: PantryItem) -> Result<(), StoreError> {
        let mut state = self.write()?;
        if state.items.contains_key(&item.id()) {
            return Err(StoreError::Duplicate {
                entity: "item",
                id: item.id().to_string(),
            });
        }
        state.items.insert(item.id(), item);
        Ok(())
    }

    fn get_item(&self, item_id: PantryItemId) -> Result<PantryItem, StoreError> {
        self.read()?
            .items
            .get(&item_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("item", item_id))
    }

    fn decrement(&self, item_id: PantryItemId, amount: i64) -> Result<PantryItem, StoreError> {
        self.write()?.decrement(item_id, amount)
    }

    fn list_items(&self, filter: ItemFilter) -> Result<Vec<PantryItem>, StoreError> {
        let state = self.read()?;
        let mut items: Vec<PantryItem> = state
            .items
            .values()
            .filter(|item| filter.matches(item))
            .cloned()
            .collect();
        items.sort_by(|a, b| a.name().cmp(b.name()).then_with(|| a.id().cmp(&b.id())));
        Ok(items)
    }
}

impl OrderStore for InMemoryPantryStore {
    fn commit_transition(&self, transition: OrderTransition) -> Result<Option<PantryItem>, StoreError> {
        let OrderTransition {
            order,
            expected_version,
            events,
            decrement,
        } = transition;

        if events.is_empty() {
            return Err(StoreError::Invalid("transition carries no events".to_string()));
        }

        let order_id = order.id_typed();
        let mut state = self.write()?;

        let current = state.orders.get(&order_id).map(|o| o.version()).unwrap_or(0);
        if !expected_version.matches(current) {
            return Err(StoreError::Conflict(format!(
                "order {order_id}: expected {expected_version:?}, found {current}"
            )));
        }

        let base = match expected_version {
            ExpectedVersion::Exact(v) => v,
            ExpectedVersion::Any => current,
        };
        if order.version() != base + events.len() as u64 {
            return Err(StoreError::Invalid(format!(
                "order {order_id} at version {} does not follow {} events from {base}",
                order.version(),
                events.len()
            )));
        }

        // Decrement last among the checks: it is the only step that mutates
        // before the order is written, and it leaves the item untouched on
        // failure.
        let item = match decrement {
            Some(d) => Some(state.decrement(d.item_id, d.amount)?),
            None => None,
        };

        *state.order_revisions.entry(order.user_id()).or_default() += 1;
        state.orders.insert(order_id, order);
        state.history.entry(order_id).or_default().extend(events);

        Ok(item)
    }

    fn get_order(&self, order_id: OrderId) -> Result<Order, StoreError> {
        self.read()?
            .orders
            .get(&order_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("order", order_id))
    }

    fn query_orders(&self, query: &OrderQuery) -> Result<Vec<Order>, StoreError> {
        let state = self.read()?;
        let mut orders: Vec<Order> = state
            .orders
            .values()
            .filter(|o| query.matches(o))
            .cloned()
            .collect();
        orders.sort_by(|a, b| {
            b.requested_at()
                .cmp(&a.requested_at())
                .then_with(|| b.id_typed().cmp(&a.id_typed()))
        });
        Ok(orders)
    }

    fn order_history(&self, order_id: OrderId) -> Result<Vec<OrderEvent>, StoreError> {
        self.read()?
            .history
            .get(&order_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("order", order_id))
    }

    fn order_revision(&self, user_id: UserId) -> Result<u64, StoreError> {
        Ok(self.read()?.order_revisions.get(&user_id).copied().unwrap_or(0))
    }
}

impl BillingStore for InMemoryPantryStore {
    fn upsert_billing(&self, billing: Billing, computed_at: ExpectedVersion) -> Result<Billing, StoreError> {
        let mut state = self.write()?;
        let key = (billing.user_id(), billing.month());

        let current = state.order_revisions.get(&key.0).copied().unwrap_or(0);
        computed_at.check(current).map_err(|err| {
            StoreError::Conflict(format!("billing for {} {}: {err}", key.0, key.1))
        })?;

        let stored = match state
            .billing_index
            .get(&key)
            .and_then(|id| state.billings.get(id))
        {
            Some(previous) => billing.supersede(previous),
            None => billing,
        };

        state.billing_index.insert(key, stored.id());
        state.billings.insert(stored.id(), stored.clone());
        Ok(stored)
    }

    fn get_billing(&self, billing_id: BillingId) -> Result<Billing, StoreError> {
        self.read()?
            .billings
            .get(&billing_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("billing", billing_id))
    }

    fn list_billings(&self, user_id: Option<UserId>) -> Result<Vec<Billing>, StoreError> {
        let state = self.read()?;
        let mut billings: Vec<Billing> = state
            .billings
            .values()
            .filter(|b| user_id.is_none_or(|u| u == b.user_id()))
            .cloned()
            .collect();
        billings.sort_by(|a, b| {
            b.generated_at()
                .cmp(&a.generated_at())
                .then_with(|| b.month().cmp(&a.month()))
                .then_with(|| a.user_id().cmp(&b.user_id()))
        });
        Ok(billings)
    }

    fn delete_billing(&self, billing_id: BillingId) -> Result<Billing, StoreError> {
        let mut state = self.write()?;
        let removed = state
            .billings
            .remove(&billing_id)
            .ok_or_else(|| StoreError::not_found("billing", billing_id))?;
        state
            .billing_index
            .remove(&(removed.user_id(), removed.month()));
        Ok(removed)
    }
}
