//! Order lifecycle orchestration.
//!
//! ```text
//! Command
//!   ↓
//! 1. Authorize the actor
//!   ↓
//! 2. Load the order (or start from an empty one for a request)
//!   ↓
//! 3. Handle the command (pure decision, produces events)
//!   ↓
//! 4. Commit: version check + stock decrement + new state, one critical section
//!   ↓
//! 5. Publish the committed events
//! ```
//!
//! Stock is checked (not reserved) on request and decremented exactly once,
//! on approval. Issuing finalizes an approved order without touching stock.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde_json::Value as JsonValue;

use pantry_auth::{Actor, Permission, authorize, authorize_owner_or};
use pantry_core::{Aggregate, AggregateRoot, DomainError, ExpectedVersion, OrderId, PantryItemId, UserId};
use pantry_events::{EventBus, EventEnvelope};
use pantry_inventory::{ItemFilter, NewPantryItem, PantryItem};
use pantry_orders::{
    ApproveOrder, DenyOrder, IssueOrder, Order, OrderCommand, OrderEvent, OrderStatus, RequestItem,
};

use crate::config::PantryConfig;
use crate::error::{RequestRejection, ServiceError};
use crate::identity::IdentityLookup;
use crate::publish::publish_committed;
use crate::store::{InventoryStore, OrderQuery, OrderStore, OrderTransition, StockDecrement, StoreError};
use crate::views::{OrderWithRequester, StaffOrderView};

/// Aggregate type recorded on published order envelopes.
pub const ORDER_AGGREGATE_TYPE: &str = "orders.order";

/// Owns the order state machine and its coupling to inventory.
#[derive(Debug)]
pub struct OrderLifecycleManager<S, B, I> {
    store: S,
    bus: B,
    identity: I,
    unknown_user_label: String,
}

impl<S, B, I> OrderLifecycleManager<S, B, I> {
    pub fn new(store: S, bus: B, identity: I) -> Self {
        Self {
            store,
            bus,
            identity,
            unknown_user_label: PantryConfig::default().unknown_user_label,
        }
    }

    pub fn with_config(mut self, config: &PantryConfig) -> Self {
        self.unknown_user_label = config.unknown_user_label.clone();
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_parts(self) -> (S, B, I) {
        (self.store, self.bus, self.identity)
    }
}

impl<S, B, I> OrderLifecycleManager<S, B, I>
where
    S: InventoryStore + OrderStore,
    B: EventBus<EventEnvelope<JsonValue>>,
    I: IdentityLookup,
{
    /// Add a catalog entry.
    #[tracing::instrument(skip_all, fields(actor = %actor.user_id, name = %input.name))]
    pub fn add_item(&self, actor: &Actor, input: NewPantryItem) -> Result<PantryItem, ServiceError> {
        authorize(actor, &Permission::ORDERS_MANAGE)?;

        let item = PantryItem::create(PantryItemId::new(), input)?;
        self.store.insert_item(item.clone())?;

        tracing::info!(item_id = %item.id(), quantity = item.quantity(), "catalog item added");
        Ok(item)
    }

    /// Every catalog entry, by name.
    pub fn catalog(&self) -> Result<Vec<PantryItem>, ServiceError> {
        Ok(self.store.list_items(ItemFilter::All)?)
    }

    /// Items a member may request on `today`, by name.
    pub fn orderable_items(&self, today: NaiveDate) -> Result<Vec<PantryItem>, ServiceError> {
        Ok(self.store.list_items(ItemFilter::Orderable { today })?)
    }

    /// Create a Pending order.
    ///
    /// The item must exist, be unexpired on the request date and show enough
    /// stock. Nothing is reserved; approval performs the real check.
    #[tracing::instrument(
        skip_all,
        fields(actor = %actor.user_id, order_id = %cmd.order_id, item_id = %cmd.item_id, quantity = cmd.quantity)
    )]
    pub fn request(&self, actor: &Actor, cmd: RequestItem) -> Result<Order, ServiceError> {
        authorize(actor, &Permission::ORDERS_REQUEST)?;
        authorize_owner_or(actor, cmd.user_id, &Permission::ORDERS_MANAGE)?;

        if cmd.quantity <= 0 {
            tracing::warn!("order request rejected: non-positive quantity");
            return Err(ServiceError::InvalidQuantity(cmd.quantity));
        }

        let item = match self.store.get_item(cmd.item_id) {
            Ok(item) => item,
            Err(StoreError::NotFound { .. }) => {
                return Err(rejected(RequestRejection::ItemNotFound(cmd.item_id)));
            }
            Err(err) => return Err(err.into()),
        };

        if item.is_expired(cmd.occurred_at.date_naive()) {
            return Err(rejected(RequestRejection::ItemExpired {
                item_id: item.id(),
                expiry_date: item.expiry_date(),
            }));
        }
        if !item.can_supply(cmd.quantity) {
            return Err(rejected(RequestRejection::InsufficientStock {
                item_id: item.id(),
                available: item.quantity(),
                requested: cmd.quantity,
            }));
        }

        let order = self.execute(Order::empty(cmd.order_id), OrderCommand::RequestItem(cmd))?;
        tracing::info!(user_id = %order.user_id(), "order requested");
        Ok(order)
    }

    /// Pending → Approved, decrementing stock in the same commit.
    ///
    /// On `InsufficientStock` the order stays Pending and stock is untouched.
    #[tracing::instrument(skip_all, fields(actor = %actor.user_id, order_id = %cmd.order_id))]
    pub fn approve(&self, actor: &Actor, cmd: ApproveOrder) -> Result<Order, ServiceError> {
        authorize(actor, &Permission::ORDERS_MANAGE)?;
        let order = self.store.get_order(cmd.order_id)?;
        let order = self.execute(order, OrderCommand::ApproveOrder(cmd))?;
        tracing::info!(item_id = %order.item_id(), quantity = order.quantity(), "order approved");
        Ok(order)
    }

    /// Pending → Denied. No inventory effect.
    #[tracing::instrument(skip_all, fields(actor = %actor.user_id, order_id = %cmd.order_id))]
    pub fn deny(&self, actor: &Actor, cmd: DenyOrder) -> Result<Order, ServiceError> {
        authorize(actor, &Permission::ORDERS_MANAGE)?;
        let order = self.store.get_order(cmd.order_id)?;
        let order = self.execute(order, OrderCommand::DenyOrder(cmd))?;
        tracing::info!("order denied");
        Ok(order)
    }

    /// Approved → Issued. Stock was already taken at approval.
    #[tracing::instrument(skip_all, fields(actor = %actor.user_id, order_id = %cmd.order_id))]
    pub fn issue(&self, actor: &Actor, cmd: IssueOrder) -> Result<Order, ServiceError> {
        authorize(actor, &Permission::ORDERS_MANAGE)?;
        let order = self.store.get_order(cmd.order_id)?;
        let order = self.execute(order, OrderCommand::IssueOrder(cmd))?;
        tracing::info!("order issued");
        Ok(order)
    }

    pub fn get_order(&self, actor: &Actor, order_id: OrderId) -> Result<Order, ServiceError> {
        let order = self.store.get_order(order_id)?;
        authorize_owner_or(actor, order.user_id(), &Permission::ORDERS_VIEW_ALL)?;
        Ok(order)
    }

    /// All of a user's orders, newest request first.
    pub fn orders_for_user(&self, actor: &Actor, user_id: UserId) -> Result<Vec<Order>, ServiceError> {
        authorize_owner_or(actor, user_id, &Permission::ORDERS_VIEW_ALL)?;
        Ok(self.store.query_orders(&OrderQuery::for_user(user_id))?)
    }

    /// A user's orders waiting to be issued.
    pub fn approved_orders_for_user(&self, actor: &Actor, user_id: UserId) -> Result<Vec<Order>, ServiceError> {
        authorize_owner_or(actor, user_id, &Permission::ORDERS_VIEW_ALL)?;
        Ok(self
            .store
            .query_orders(&OrderQuery::for_user(user_id).with_status(OrderStatus::Approved))?)
    }

    /// Every order with its item name, for the staff queue.
    pub fn orders_for_staff(&self, actor: &Actor) -> Result<Vec<StaffOrderView>, ServiceError> {
        authorize(actor, &Permission::ORDERS_VIEW_ALL)?;

        let names: HashMap<PantryItemId, String> = self
            .store
            .list_items(ItemFilter::All)?
            .into_iter()
            .map(|item| (item.id(), item.name().to_string()))
            .collect();

        Ok(self
            .store
            .query_orders(&OrderQuery::all())?
            .iter()
            .map(|order| StaffOrderView::new(order, names.get(&order.item_id()).cloned()))
            .collect())
    }

    /// Every order with the requester's display name.
    pub fn orders_with_requester(&self, actor: &Actor) -> Result<Vec<OrderWithRequester>, ServiceError> {
        authorize(actor, &Permission::ORDERS_VIEW_ALL)?;

        let mut names: HashMap<UserId, String> = HashMap::new();
        Ok(self
            .store
            .query_orders(&OrderQuery::all())?
            .into_iter()
            .map(|order| {
                let requester_name = names
                    .entry(order.user_id())
                    .or_insert_with(|| {
                        self.identity
                            .display_name_or(order.user_id(), &self.unknown_user_label)
                    })
                    .clone();
                OrderWithRequester {
                    order,
                    requester_name,
                }
            })
            .collect())
    }

    /// Events applied to the order, oldest first.
    pub fn order_history(&self, actor: &Actor, order_id: OrderId) -> Result<Vec<OrderEvent>, ServiceError> {
        self.get_order(actor, order_id)?;
        Ok(self.store.order_history(order_id)?)
    }

    /// Decide, commit and publish one command against `order`.
    fn execute(&self, order: Order, command: OrderCommand) -> Result<Order, ServiceError> {
        let action = command.action();
        let base_version = order.version();

        let events = order
            .handle(&command)
            .map_err(|err| transition_error(&order, action, err))?;

        let mut next = order;
        for event in &events {
            next.apply(event);
        }

        let decrement = events
            .iter()
            .find_map(OrderEvent::stock_effect)
            .map(|(item_id, amount)| StockDecrement { item_id, amount });

        let committed = self.store.commit_transition(OrderTransition {
            order: next.clone(),
            expected_version: ExpectedVersion::Exact(base_version),
            events: events.clone(),
            decrement,
        });

        match committed {
            Ok(Some(item)) => {
                tracing::info!(item_id = %item.id(), remaining = item.quantity(), "stock decremented");
            }
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(action, order_id = %command.order_id(), error = %err, "order transition not committed");
                return Err(err.into());
            }
        }

        publish_committed(
            &self.bus,
            ORDER_AGGREGATE_TYPE,
            *next.id_typed().as_uuid(),
            base_version + 1,
            &events,
        );

        Ok(next)
    }
}

fn rejected(rejection: RequestRejection) -> ServiceError {
    tracing::warn!(reason = %rejection, "order request rejected");
    ServiceError::InvalidRequest(rejection)
}

fn transition_error(order: &Order, action: &'static str, err: DomainError) -> ServiceError {
    match err {
        DomainError::InvalidTransition(_) => {
            tracing::warn!(action, status = %order.status(), "invalid order transition");
            ServiceError::InvalidTransition {
                order_id: order.id_typed(),
                status: order.status(),
                action,
            }
        }
        DomainError::NotFound(_) => ServiceError::not_found("order", order.id_typed()),
        other => other.into(),
    }
}
