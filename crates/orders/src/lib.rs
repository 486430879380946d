//! Pantry orders domain module.
//!
//! The order fulfillment state machine (request → approve/deny → issue),
//! implemented purely as deterministic domain logic (no IO, no storage).
//! Stock availability is checked by the caller; the aggregate only records
//! which decrement an approval implies.

pub mod order;

pub use order::{
    ApproveOrder, DenyOrder, IssueOrder, Order, OrderApproved, OrderCommand, OrderDenied,
    OrderEvent, OrderIssued, OrderRequested, OrderStatus, RequestItem,
};
