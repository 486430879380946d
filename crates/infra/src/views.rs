//! Read shapes handed to the presentation layer.

use chrono::{DateTime, Utc};
use serde::Serialize;

use pantry_billing::Billing;
use pantry_core::{OrderId, UserId};
use pantry_orders::{Order, OrderStatus};

/// Order as listed for staff. Carries no price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaffOrderView {
    pub order_id: OrderId,
    pub user_id: UserId,
    /// `None` when the item has left the catalog.
    pub item_name: Option<String>,
    pub quantity: i64,
    pub status: OrderStatus,
    pub requested_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub issued_at: Option<DateTime<Utc>>,
}

impl StaffOrderView {
    pub fn new(order: &Order, item_name: Option<String>) -> Self {
        Self {
            order_id: order.id_typed(),
            user_id: order.user_id(),
            item_name,
            quantity: order.quantity(),
            status: order.status(),
            requested_at: order.requested_at(),
            approved_at: order.approved_at(),
            issued_at: order.issued_at(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderWithRequester {
    pub order: Order,
    pub requester_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BillingView {
    pub billing: Billing,
    pub user_display_name: String,
}
