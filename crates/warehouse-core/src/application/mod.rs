//! Application service layer
//!
//! Orchestrates customer-facing operations across the customer, order and
//! product repositories and builds the read projections the CLI prints.

pub mod customer_service;

pub use customer_service::{CustomerInfo, CustomerService, OrderInfo, OrderItemInfo};
