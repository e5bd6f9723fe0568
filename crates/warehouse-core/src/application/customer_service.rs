//! Customer service
//!
//! Registers customers, places single-line orders on their behalf and
//! projects a customer with their orders into [`CustomerInfo`].

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use serde::Serialize;
use tracing::info;

use crate::domain::Identity;
use crate::domain::customers::{Customer, CustomerRepository};
use crate::domain::warehouse::{Order, OrderRepository, Product, ProductRepository, ProductValidator};
use crate::error::{Error, Result};

/// One line of an order as shown to a customer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderItemInfo {
    pub product: String,
    pub quantity: i64,
    pub price: f64,
    pub total_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderInfo {
    pub id: i64,
    pub items: Vec<OrderItemInfo>,
    pub total_price: f64,
}

/// A customer together with every order they placed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerInfo {
    pub id: i64,
    pub name: String,
    pub age: u32,
    pub orders: Vec<OrderInfo>,
}

impl CustomerInfo {
    /// Project a persisted customer, computing the age as of `today`
    pub fn from_customer(customer: &Customer, today: NaiveDate) -> Result<Self> {
        let orders = customer
            .orders
            .iter()
            .map(|order| {
                Ok(OrderInfo {
                    id: order.id.require("Order")?,
                    items: order
                        .products
                        .iter()
                        .map(|p| OrderItemInfo {
                            product: p.name.clone(),
                            quantity: p.quantity,
                            price: p.price,
                            total_price: p.total_price(),
                        })
                        .collect(),
                    total_price: order.total_price(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            id: customer.id.require("Customer")?,
            name: customer.name.clone(),
            age: customer.age_on(today),
            orders,
        })
    }
}

/// Customer registration and customer orders
#[derive(Clone)]
pub struct CustomerService {
    customers: Arc<dyn CustomerRepository>,
    orders: Arc<dyn OrderRepository>,
    products: Arc<dyn ProductRepository>,
}

impl CustomerService {
    pub fn new(
        customers: Arc<dyn CustomerRepository>,
        orders: Arc<dyn OrderRepository>,
        products: Arc<dyn ProductRepository>,
    ) -> Self {
        Self {
            customers,
            orders,
            products,
        }
    }

    /// Register a new customer
    pub async fn register_customer(&self, name: &str, birth_date: NaiveDate) -> Result<Customer> {
        if name.trim().is_empty() {
            return Err(Error::InvalidArgument(
                "Customer name cannot be empty".to_string(),
            ));
        }
        let today = Local::now().date_naive();
        if birth_date > today {
            return Err(Error::InvalidArgument(format!(
                "Birth date {} is in the future",
                birth_date
            )));
        }

        let mut customer = Customer::new(name, birth_date);
        self.customers.add(&mut customer).await?;

        info!(customer_id = %customer.id, name = %customer.name, "Registered customer");
        Ok(customer)
    }

    /// Place a single-line order for an existing customer
    ///
    /// Arguments are checked before the store is touched. The product line is
    /// persisted first, then the order referencing it.
    /// `order_id` requests a specific order identity; a taken id fails with
    /// `ConstraintViolation`.
    pub async fn create_order_for_customer(
        &self,
        customer_id: i64,
        order_id: Option<i64>,
        product: &str,
        quantity: i64,
        price: f64,
    ) -> Result<Order> {
        ProductValidator::validate(product, quantity, price)?;
        if let Some(requested) = order_id.filter(|id| *id < 0) {
            return Err(Error::InvalidArgument(format!(
                "Order ID must be a non-negative integer, got {}",
                requested
            )));
        }
        let mut customer = self.existing_customer(customer_id).await?;

        let mut line = Product::new(product, quantity, price);
        self.products.add(&mut line).await?;

        let mut order = Order::for_customer(customer_id, vec![line]);
        if let Some(requested) = order_id {
            order.id = Identity::Assigned(requested);
        }
        self.orders.add(&mut order).await?;
        customer.place_order(order.clone());

        info!(
            customer_id,
            order_id = %order.id,
            orders = customer.orders.len(),
            "Created order for customer"
        );
        Ok(order)
    }

    /// Customer details with their orders, age as of today
    pub async fn get_customer_info(&self, customer_id: i64) -> Result<CustomerInfo> {
        let customer = self.existing_customer(customer_id).await?;
        CustomerInfo::from_customer(&customer, Local::now().date_naive())
    }

    pub async fn list_customers(&self) -> Result<Vec<Customer>> {
        self.customers.list().await
    }

    async fn existing_customer(&self, customer_id: i64) -> Result<Customer> {
        match self.customers.get(customer_id).await {
            Err(Error::NotFound { .. }) => Err(Error::DomainRuleViolation(format!(
                "Customer {} does not exist",
                customer_id
            ))),
            other => other,
        }
    }
}
