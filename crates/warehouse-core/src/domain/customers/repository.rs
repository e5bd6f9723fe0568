//! Repository trait for customer persistence

use async_trait::async_trait;

use crate::error::Result;

use super::entity::Customer;

/// Customer persistence
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    /// Persist a new customer and back-fill its generated identity
    async fn add(&self, customer: &mut Customer) -> Result<()>;

    /// Get a customer with all their orders and each order's products
    async fn get(&self, customer_id: i64) -> Result<Customer>;

    /// List all customers, ordered by ID
    async fn list(&self) -> Result<Vec<Customer>>;
}
