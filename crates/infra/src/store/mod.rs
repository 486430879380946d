//! Storage boundary for inventory, orders and bills.
//!
//! The traits make no storage assumptions beyond the three atomic primitives
//! the services rely on: conditional stock decrement, versioned order commit
//! (optionally coupled with a decrement) and keyed bill upsert.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryPantryStore;
pub use r#trait::{
    BillingStore, InventoryStore, OrderQuery, OrderStore, OrderTransition, StockDecrement,
    StoreError,
};
