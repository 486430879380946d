//! Domain events and the mechanics to distribute them.
//!
//! Events are facts about committed state changes (an order was approved, a
//! bill was generated). They are published after the store commit succeeds,
//! so subscribers never observe a change that was rolled back.

pub mod bus;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
