//! Billing domain module.
//!
//! Monthly consumption bills derived from issued orders: calendar month keys
//! (label normalization and UTC windows), bill lines and totals, and the
//! events emitted when bills are generated or removed. Pure domain logic; the
//! scan over orders lives in the infra crate.

pub mod billing;
pub mod month;

pub use billing::{
    Billing, BillingDeleted, BillingEvent, BillingGenerated, BillingLine, DeleteBilling,
    GenerateBilling,
};
pub use month::MonthKey;
