//! Warehouse Core Library
//!
//! This crate provides the core functionality for Warehouse, including:
//! - Domain entities (products, orders, customers) and repository traits
//! - Domain and application services
//! - SQLite repository implementations sharing one session
//! - Unit of work (commit on success, rollback on failure)
//! - Storage bootstrap (connection pool + migrations)
//! - Layered configuration

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod storage;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::application::CustomerService;
    pub use crate::config::Settings;
    pub use crate::domain::customers::Customer;
    pub use crate::domain::unit_of_work::{UnitOfWork, run_in_transaction};
    pub use crate::domain::warehouse::{Order, Product, WarehouseService};
    pub use crate::domain::Identity;
    pub use crate::error::{Error, Result};
}
