//! Input validation for products and orders

use std::collections::HashSet;

use crate::error::{Error, Result};

use super::entity::Product;

/// Validator for product and order inputs
pub struct ProductValidator;

impl ProductValidator {
    /// Validate a product name
    ///
    /// Rules:
    /// - Must not be empty or whitespace only
    pub fn validate_name(name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(Error::InvalidArgument(
                "Product name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn validate_quantity(quantity: i64) -> Result<()> {
        if quantity < 0 {
            return Err(Error::InvalidArgument(format!(
                "Quantity must be non-negative, got {}",
                quantity
            )));
        }
        Ok(())
    }

    /// Validate a unit price
    ///
    /// Rules:
    /// - Must be a finite number
    /// - Must be non-negative
    pub fn validate_price(price: f64) -> Result<()> {
        if !price.is_finite() {
            return Err(Error::InvalidArgument(format!(
                "Price must be a finite number, got {}",
                price
            )));
        }
        if price < 0.0 {
            return Err(Error::InvalidArgument(format!(
                "Price must be non-negative, got {}",
                price
            )));
        }
        Ok(())
    }

    /// Validate all fields of a new product line
    pub fn validate(name: &str, quantity: i64, price: f64) -> Result<()> {
        Self::validate_name(name)?;
        Self::validate_quantity(quantity)?;
        Self::validate_price(price)
    }

    /// Validate the products referenced by a new order
    ///
    /// Rules:
    /// - At least one product
    /// - Every product already persisted
    /// - No product referenced twice
    pub fn validate_order_products(products: &[Product]) -> Result<()> {
        if products.is_empty() {
            return Err(Error::InvalidArgument(
                "An order needs at least one product".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for product in products {
            let id = product.id.require(&format!("Product '{}'", product.name))?;
            if !seen.insert(id) {
                return Err(Error::InvalidArgument(format!(
                    "Product {} is referenced more than once",
                    id
                )));
            }
        }

        Ok(())
    }
}
