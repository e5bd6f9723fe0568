//! Product and order entities

use serde::{Deserialize, Serialize};

use crate::domain::Identity;

/// A stocked product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Identity,
    pub name: String,
    pub quantity: i64,
    pub price: f64,
}

impl Product {
    /// Create an unpersisted product
    pub fn new(name: impl Into<String>, quantity: i64, price: f64) -> Self {
        Self {
            id: Identity::Unassigned,
            name: name.into(),
            quantity,
            price,
        }
    }

    /// Price of the whole stocked quantity
    pub fn total_price(&self) -> f64 {
        self.price * self.quantity as f64
    }
}

/// An order over existing products
///
/// Products keep the order they were added in. A single-item order is just
/// a one-element product list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: Identity,
    pub customer_id: Option<i64>,
    pub products: Vec<Product>,
}

impl Order {
    pub fn new(products: Vec<Product>) -> Self {
        Self {
            id: Identity::Unassigned,
            customer_id: None,
            products,
        }
    }

    /// Create an unpersisted order placed by a customer
    pub fn for_customer(customer_id: i64, products: Vec<Product>) -> Self {
        Self {
            customer_id: Some(customer_id),
            ..Self::new(products)
        }
    }

    pub fn add_product(&mut self, product: Product) {
        self.products.push(product);
    }

    /// Sum of price × quantity over every product line
    pub fn total_price(&self) -> f64 {
        self.products.iter().map(Product::total_price).sum()
    }
}
