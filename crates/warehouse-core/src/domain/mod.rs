//! Domain layer
//!
//! Contains the core business entities, repository traits and the
//! unit-of-work contract.

pub mod customers;
pub mod identity;
pub mod unit_of_work;
pub mod warehouse;

pub use identity::Identity;
