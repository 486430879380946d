//! Pantry inventory domain module.
//!
//! Catalog items and the one rule that matters for fulfillment: quantity on
//! hand never goes negative. Pure domain logic (no IO, no storage).

pub mod category;
pub mod item;

pub use category::PantryCategory;
pub use item::{ItemFilter, NewPantryItem, PantryItem};
