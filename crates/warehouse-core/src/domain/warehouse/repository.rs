//! Repository traits for products and orders
//!
//! The traits abstract over storage backends; services only see these.

use async_trait::async_trait;

use crate::error::Result;

use super::entity::{Order, Product};

/// Product persistence
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Persist a new product and back-fill its generated identity
    async fn add(&self, product: &mut Product) -> Result<()>;

    /// Get a product by ID
    ///
    /// Fails with `InvalidArgument` for a negative id and `NotFound` when
    /// no row matches.
    async fn get(&self, product_id: i64) -> Result<Product>;

    /// List all products, ordered by ID
    async fn list(&self) -> Result<Vec<Product>>;
}

/// Order persistence
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Persist a new order and its product links, back-filling the identity
    ///
    /// Every product must already be persisted.
    async fn add(&self, order: &mut Order) -> Result<()>;

    /// Get an order by ID, including its products in the order they were added
    async fn get(&self, order_id: i64) -> Result<Order>;

    /// List all orders, ordered by ID
    async fn list(&self) -> Result<Vec<Order>>;
}
