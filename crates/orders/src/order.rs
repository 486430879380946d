use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pantry_core::{Aggregate, AggregateRoot, DomainError, OrderId, PantryItemId, UserId};
use pantry_events::Event;

/// Order status lifecycle.
///
/// ```text
/// Pending ──approve──▶ Approved ──issue──▶ Issued
///    └────deny───────▶ Denied
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Approved,
    Denied,
    Issued,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Approved => "approved",
            OrderStatus::Denied => "denied",
            OrderStatus::Issued => "issued",
        }
    }

    /// Denied and Issued accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Denied | OrderStatus::Issued)
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::Approved)
                | (OrderStatus::Pending, OrderStatus::Denied)
                | (OrderStatus::Approved, OrderStatus::Issued)
        )
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate root: Order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    user_id: UserId,
    item_id: PantryItemId,
    quantity: i64,
    status: OrderStatus,
    requested_at: DateTime<Utc>,
    approved_at: Option<DateTime<Utc>>,
    issued_at: Option<DateTime<Utc>>,
    version: u64,
    created: bool,
}

impl Order {
    /// Create an empty, not-yet-requested aggregate instance for rehydration.
    pub fn empty(id: OrderId) -> Self {
        Self {
            id,
            user_id: UserId::from_uuid(Default::default()),
            item_id: PantryItemId::from_uuid(Default::default()),
            quantity: 0,
            status: OrderStatus::Pending,
            requested_at: DateTime::<Utc>::UNIX_EPOCH,
            approved_at: None,
            issued_at: None,
            version: 0,
            created: false,
        }
    }

    /// Rebuild an order from its full event history.
    pub fn from_history<'a>(id: OrderId, history: impl IntoIterator<Item = &'a OrderEvent>) -> Self {
        let mut order = Self::empty(id);
        for event in history {
            order.apply(event);
        }
        order
    }

    pub fn id_typed(&self) -> OrderId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn item_id(&self) -> PantryItemId {
        self.item_id
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn requested_at(&self) -> DateTime<Utc> {
        self.requested_at
    }

    pub fn approved_at(&self) -> Option<DateTime<Utc>> {
        self.approved_at
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        self.issued_at
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    /// Date used to bucket the order into a billing month.
    pub fn effective_date(&self) -> DateTime<Utc> {
        self.issued_at.unwrap_or(self.requested_at)
    }
}

impl AggregateRoot for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: RequestItem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestItem {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub item_id: PantryItemId,
    pub quantity: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ApproveOrder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproveOrder {
    pub order_id: OrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: DenyOrder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenyOrder {
    pub order_id: OrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: IssueOrder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueOrder {
    pub order_id: OrderId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderCommand {
    RequestItem(RequestItem),
    ApproveOrder(ApproveOrder),
    DenyOrder(DenyOrder),
    IssueOrder(IssueOrder),
}

impl OrderCommand {
    pub fn order_id(&self) -> OrderId {
        match self {
            OrderCommand::RequestItem(c) => c.order_id,
            OrderCommand::ApproveOrder(c) => c.order_id,
            OrderCommand::DenyOrder(c) => c.order_id,
            OrderCommand::IssueOrder(c) => c.order_id,
        }
    }

    /// Verb used in logs and error messages.
    pub fn action(&self) -> &'static str {
        match self {
            OrderCommand::RequestItem(_) => "request",
            OrderCommand::ApproveOrder(_) => "approve",
            OrderCommand::DenyOrder(_) => "deny",
            OrderCommand::IssueOrder(_) => "issue",
        }
    }
}

/// Event: OrderRequested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequested {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub item_id: PantryItemId,
    pub quantity: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderApproved.
///
/// Carries the stock decrement the approval implies so the store can apply
/// both in one critical section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderApproved {
    pub order_id: OrderId,
    pub item_id: PantryItemId,
    pub quantity: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderDenied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDenied {
    pub order_id: OrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderIssued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderIssued {
    pub order_id: OrderId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderEvent {
    OrderRequested(OrderRequested),
    OrderApproved(OrderApproved),
    OrderDenied(OrderDenied),
    OrderIssued(OrderIssued),
}

impl OrderEvent {
    /// Stock decrement implied by this event, if any.
    pub fn stock_effect(&self) -> Option<(PantryItemId, i64)> {
        match self {
            OrderEvent::OrderApproved(e) => Some((e.item_id, e.quantity)),
            _ => None,
        }
    }

    /// Status the order is in after this event.
    pub fn resulting_status(&self) -> OrderStatus {
        match self {
            OrderEvent::OrderRequested(_) => OrderStatus::Pending,
            OrderEvent::OrderApproved(_) => OrderStatus::Approved,
            OrderEvent::OrderDenied(_) => OrderStatus::Denied,
            OrderEvent::OrderIssued(_) => OrderStatus::Issued,
        }
    }
}

impl Event for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::OrderRequested(_) => "orders.order.requested",
            OrderEvent::OrderApproved(_) => "orders.order.approved",
            OrderEvent::OrderDenied(_) => "orders.order.denied",
            OrderEvent::OrderIssued(_) => "orders.order.issued",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            OrderEvent::OrderRequested(e) => e.occurred_at,
            OrderEvent::OrderApproved(e) => e.occurred_at,
            OrderEvent::OrderDenied(e) => e.occurred_at,
            OrderEvent::OrderIssued(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Order {
    type Command = OrderCommand;
    type Event = OrderEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            OrderEvent::OrderRequested(e) => {
                self.id = e.order_id;
                self.user_id = e.user_id;
                self.item_id = e.item_id;
                self.quantity = e.quantity;
                self.status = OrderStatus::Pending;
                self.requested_at = e.occurred_at;
                self.created = true;
            }
            OrderEvent::OrderApproved(e) => {
                self.status = OrderStatus::Approved;
                self.approved_at = Some(e.occurred_at);
            }
            OrderEvent::OrderDenied(_) => {
                self.status = OrderStatus::Denied;
            }
            OrderEvent::OrderIssued(e) => {
                self.status = OrderStatus::Issued;
                self.issued_at = Some(e.occurred_at);
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            OrderCommand::RequestItem(cmd) => self.handle_request(cmd),
            OrderCommand::ApproveOrder(cmd) => self.handle_approve(cmd),
            OrderCommand::DenyOrder(cmd) => self.handle_deny(cmd),
            OrderCommand::IssueOrder(cmd) => self.handle_issue(cmd),
        }
    }
}

impl Order {
    fn ensure_order_id(&self, order_id: OrderId) -> Result<(), DomainError> {
        if self.id != order_id {
            return Err(DomainError::invalid_transition("order_id mismatch"));
        }
        Ok(())
    }

    fn ensure_transition(&self, next: OrderStatus, action: &str) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found(format!("order {}", self.id)));
        }
        if !self.status.can_transition_to(next) {
            return Err(DomainError::invalid_transition(format!(
                "cannot {action} order in status {}",
                self.status
            )));
        }
        Ok(())
    }

    fn handle_request(&self, cmd: &RequestItem) -> Result<Vec<OrderEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("order already exists"));
        }
        if cmd.quantity <= 0 {
            return Err(DomainError::InvalidQuantity(cmd.quantity));
        }

        Ok(vec![OrderEvent::OrderRequested(OrderRequested {
            order_id: cmd.order_id,
            user_id: cmd.user_id,
            item_id: cmd.item_id,
            quantity: cmd.quantity,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_approve(&self, cmd: &ApproveOrder) -> Result<Vec<OrderEvent>, DomainError> {
        self.ensure_transition(OrderStatus::Approved, "approve")?;
        self.ensure_order_id(cmd.order_id)?;

        Ok(vec![OrderEvent::OrderApproved(OrderApproved {
            order_id: cmd.order_id,
            item_id: self.item_id,
            quantity: self.quantity,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_deny(&self, cmd: &DenyOrder) -> Result<Vec<OrderEvent>, DomainError> {
        self.ensure_transition(OrderStatus::Denied, "deny")?;
        self.ensure_order_id(cmd.order_id)?;

        Ok(vec![OrderEvent::OrderDenied(OrderDenied {
            order_id: cmd.order_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_issue(&self, cmd: &IssueOrder) -> Result<Vec<OrderEvent>, DomainError> {
        self.ensure_transition(OrderStatus::Issued, "issue")?;
        self.ensure_order_id(cmd.order_id)?;

        Ok(vec![OrderEvent::OrderIssued(OrderIssued {
            order_id: cmd.order_id,
            occurred_at: cmd.occurred_at,
        })])
    }
}
