//! Infrastructure layer: stores, orchestration services, configuration.
//!
//! Domain crates decide; this crate loads state, commits decisions atomically
//! through the store traits and publishes the resulting events.

pub mod billing_aggregator;
pub mod config;
pub mod error;
pub mod identity;
pub mod lifecycle;
pub mod store;
pub mod views;

mod publish;


pub use billing_aggregator::BillingAggregator;
pub use config::{BillingFallback, PantryConfig};
pub use error::{RequestRejection, ServiceError};
pub use identity::{IdentityLookup, InMemoryDirectory};
pub use lifecycle::OrderLifecycleManager;
pub use store::{
    BillingStore, InMemoryPantryStore, InventoryStore, OrderQuery, OrderStore, OrderTransition,
    StockDecrement, StoreError,
};
pub use views::{BillingView, OrderWithRequester, StaffOrderView};
