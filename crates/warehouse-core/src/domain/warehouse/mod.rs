//! Warehouse domain module
//!
//! Products, orders, their repository traits and the warehouse service.
//!
//! # Example
//!
//! ```ignore
//! use warehouse_core::domain::warehouse::WarehouseService;
//!
//! let service = WarehouseService::new(products, orders);
//! let laptop = service.create_product("Laptop", 10, 999.99).await?;
//! let order = service.create_order(vec![laptop]).await?;
//! ```

pub mod entity;
pub mod repository;
pub mod service;
pub mod validation;

pub use entity::{Order, Product};
pub use repository::{OrderRepository, ProductRepository};
pub use service::WarehouseService;
pub use validation::ProductValidator;
