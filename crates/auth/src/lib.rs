//! `pantry-auth`: capability checks at the core boundary.
//!
//! Authentication happens elsewhere. This crate only answers whether an
//! already-authenticated actor holds the capability an operation needs.

pub mod authorize;
pub mod permissions;
pub mod principal;
pub mod roles;

pub use authorize::{AuthzError, authorize, authorize_owner_or};
pub use permissions::Permission;
pub use principal::Actor;
pub use roles::Role;
