//! SQLite repository implementations
//!
//! Map products, orders and customers to rows and back. Every repository
//! works inside the transaction of the [`Session`] it was built from.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::SqliteConnection;
use tracing::debug;

use crate::domain::Identity;
use crate::domain::customers::{Customer, CustomerRepository};
use crate::domain::warehouse::{Order, OrderRepository, Product, ProductRepository};
use crate::error::{Error, Result};

use super::session::Session;

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    quantity: i64,
    price: f64,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: Identity::Assigned(row.id),
            name: row.name,
            quantity: row.quantity,
            price: row.price,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderProductRow {
    order_id: i64,
    #[sqlx(flatten)]
    product: ProductRow,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i64,
    customer_id: Option<i64>,
}

impl OrderRow {
    fn into_order(self, products: &mut HashMap<i64, Vec<Product>>) -> Order {
        Order {
            id: Identity::Assigned(self.id),
            customer_id: self.customer_id,
            products: products.remove(&self.id).unwrap_or_default(),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    id: i64,
    name: String,
    birth_date: NaiveDate,
}

/// Reject negative ids before any query is issued
fn validate_id(entity: &str, id: i64) -> Result<()> {
    if id < 0 {
        return Err(Error::InvalidArgument(format!(
            "{} ID must be a non-negative integer, got {}",
            entity, id
        )));
    }
    Ok(())
}

const ORDER_PRODUCTS_SELECT: &str = r#"
    SELECT a.order_id, p.id, p.name, p.quantity, p.price
    FROM order_product_associations a
    JOIN products p ON p.id = a.product_id
"#;

/// Products of the selected orders, keyed by order id, in their stored position
async fn order_products(
    conn: &mut SqliteConnection,
    filter: &str,
    bind: Option<i64>,
) -> Result<HashMap<i64, Vec<Product>>> {
    let sql = format!(
        "{} {} ORDER BY a.order_id, a.position",
        ORDER_PRODUCTS_SELECT, filter
    );
    let mut query = sqlx::query_as::<_, OrderProductRow>(&sql);
    if let Some(value) = bind {
        query = query.bind(value);
    }
    let rows = query.fetch_all(&mut *conn).await?;

    let mut products: HashMap<i64, Vec<Product>> = HashMap::new();
    for row in rows {
        products
            .entry(row.order_id)
            .or_default()
            .push(row.product.into());
    }
    Ok(products)
}

/// Product repository for database operations
#[derive(Debug, Clone)]
pub struct SqliteProductRepository {
    session: Session,
}

impl SqliteProductRepository {
    pub fn new(session: Session) -> Self {
        Self { session }
    }
}

#[async_trait]
impl ProductRepository for SqliteProductRepository {
    async fn add(&self, product: &mut Product) -> Result<()> {
        let mut conn = self.session.connection().await?;

        let result = sqlx::query("INSERT INTO products (name, quantity, price) VALUES (?, ?, ?)")
            .bind(&product.name)
            .bind(product.quantity)
            .bind(product.price)
            .execute(&mut *conn)
            .await?;

        product.id = Identity::Assigned(result.last_insert_rowid());
        debug!(product_id = %product.id, name = %product.name, "Inserted product");
        Ok(())
    }

    async fn get(&self, product_id: i64) -> Result<Product> {
        validate_id("Product", product_id)?;
        let mut conn = self.session.connection().await?;

        let row: Option<ProductRow> =
            sqlx::query_as("SELECT id, name, quantity, price FROM products WHERE id = ?")
                .bind(product_id)
                .fetch_optional(&mut *conn)
                .await?;

        row.map(Product::from)
            .ok_or(Error::not_found("Product", product_id))
    }

    async fn list(&self) -> Result<Vec<Product>> {
        let mut conn = self.session.connection().await?;

        let rows: Vec<ProductRow> =
            sqlx::query_as("SELECT id, name, quantity, price FROM products ORDER BY id")
                .fetch_all(&mut *conn)
                .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }
}

/// Order repository for database operations
#[derive(Debug, Clone)]
pub struct SqliteOrderRepository {
    session: Session,
}

impl SqliteOrderRepository {
    pub fn new(session: Session) -> Self {
        Self { session }
    }
}

#[async_trait]
impl OrderRepository for SqliteOrderRepository {
    async fn add(&self, order: &mut Order) -> Result<()> {
        let product_ids = order
            .products
            .iter()
            .map(|p| p.id.require(&format!("Product '{}'", p.name)))
            .collect::<Result<Vec<_>>>()?;
        if let Identity::Assigned(requested) = order.id {
            validate_id("Order", requested)?;
        }

        let mut conn = self.session.connection().await?;

        for &product_id in &product_ids {
            let exists: Option<(i64,)> = sqlx::query_as("SELECT id FROM products WHERE id = ?")
                .bind(product_id)
                .fetch_optional(&mut *conn)
                .await?;
            if exists.is_none() {
                return Err(Error::not_found("Product", product_id));
            }
        }

        if let Some(customer_id) = order.customer_id {
            let exists: Option<(i64,)> = sqlx::query_as("SELECT id FROM customers WHERE id = ?")
                .bind(customer_id)
                .fetch_optional(&mut *conn)
                .await?;
            if exists.is_none() {
                return Err(Error::not_found("Customer", customer_id));
            }
        }

        let result = match order.id {
            Identity::Assigned(requested) => {
                sqlx::query("INSERT INTO orders (id, customer_id) VALUES (?, ?)")
                    .bind(requested)
                    .bind(order.customer_id)
                    .execute(&mut *conn)
                    .await?
            }
            Identity::Unassigned => {
                sqlx::query("INSERT INTO orders (customer_id) VALUES (?)")
                    .bind(order.customer_id)
                    .execute(&mut *conn)
                    .await?
            }
        };
        let order_id = result.last_insert_rowid();

        for (position, &product_id) in product_ids.iter().enumerate() {
            sqlx::query(
                "INSERT INTO order_product_associations (order_id, product_id, position) VALUES (?, ?, ?)",
            )
            .bind(order_id)
            .bind(product_id)
            .bind(position as i64)
            .execute(&mut *conn)
            .await?;
        }

        order.id = Identity::Assigned(order_id);
        debug!(
            order_id,
            customer_id = ?order.customer_id,
            products = product_ids.len(),
            "Inserted order"
        );
        Ok(())
    }

    async fn get(&self, order_id: i64) -> Result<Order> {
        validate_id("Order", order_id)?;
        let mut conn = self.session.connection().await?;

        let row: Option<OrderRow> = sqlx::query_as("SELECT id, customer_id FROM orders WHERE id = ?")
            .bind(order_id)
            .fetch_optional(&mut *conn)
            .await?;
        let row = row.ok_or(Error::not_found("Order", order_id))?;

        let mut products = order_products(&mut conn, "WHERE a.order_id = ?", Some(order_id)).await?;
        Ok(row.into_order(&mut products))
    }

    async fn list(&self) -> Result<Vec<Order>> {
        let mut conn = self.session.connection().await?;

        let rows: Vec<OrderRow> = sqlx::query_as("SELECT id, customer_id FROM orders ORDER BY id")
            .fetch_all(&mut *conn)
            .await?;
        let mut products = order_products(&mut conn, "", None).await?;

        Ok(rows
            .into_iter()
            .map(|row| row.into_order(&mut products))
            .collect())
    }
}

/// Customer repository for database operations
#[derive(Debug, Clone)]
pub struct SqliteCustomerRepository {
    session: Session,
}

impl SqliteCustomerRepository {
    pub fn new(session: Session) -> Self {
        Self { session }
    }
}

#[async_trait]
impl CustomerRepository for SqliteCustomerRepository {
    /// Persists the customer row only; orders go through the order repository
    async fn add(&self, customer: &mut Customer) -> Result<()> {
        let mut conn = self.session.connection().await?;

        let result = sqlx::query("INSERT INTO customers (name, birth_date) VALUES (?, ?)")
            .bind(&customer.name)
            .bind(customer.birth_date)
            .execute(&mut *conn)
            .await?;

        customer.id = Identity::Assigned(result.last_insert_rowid());
        debug!(customer_id = %customer.id, name = %customer.name, "Inserted customer");
        Ok(())
    }

    async fn get(&self, customer_id: i64) -> Result<Customer> {
        validate_id("Customer", customer_id)?;
        let mut conn = self.session.connection().await?;

        let row: Option<CustomerRow> =
            sqlx::query_as("SELECT id, name, birth_date FROM customers WHERE id = ?")
                .bind(customer_id)
                .fetch_optional(&mut *conn)
                .await?;
        let row = row.ok_or(Error::not_found("Customer", customer_id))?;

        let order_rows: Vec<OrderRow> = sqlx::query_as(
            "SELECT id, customer_id FROM orders WHERE customer_id = ? ORDER BY id",
        )
        .bind(customer_id)
        .fetch_all(&mut *conn)
        .await?;
        let mut products = order_products(
            &mut conn,
            "JOIN orders o ON o.id = a.order_id WHERE o.customer_id = ?",
            Some(customer_id),
        )
        .await?;

        Ok(Customer {
            id: Identity::Assigned(row.id),
            name: row.name,
            birth_date: row.birth_date,
            orders: order_rows
                .into_iter()
                .map(|o| o.into_order(&mut products))
                .collect(),
        })
    }

    async fn list(&self) -> Result<Vec<Customer>> {
        let mut conn = self.session.connection().await?;

        let rows: Vec<CustomerRow> =
            sqlx::query_as("SELECT id, name, birth_date FROM customers ORDER BY id")
                .fetch_all(&mut *conn)
                .await?;
        let order_rows: Vec<OrderRow> = sqlx::query_as(
            "SELECT id, customer_id FROM orders WHERE customer_id IS NOT NULL ORDER BY id",
        )
        .fetch_all(&mut *conn)
        .await?;
        let mut products = order_products(
            &mut conn,
            "JOIN orders o ON o.id = a.order_id WHERE o.customer_id IS NOT NULL",
            None,
        )
        .await?;

        let mut orders_by_customer: HashMap<i64, Vec<Order>> = HashMap::new();
        for order_row in order_rows {
            if let Some(owner) = order_row.customer_id {
                let order = order_row.into_order(&mut products);
                orders_by_customer.entry(owner).or_default().push(order);
            }
        }

        Ok(rows
            .into_iter()
            .map(|row| Customer {
                id: Identity::Assigned(row.id),
                orders: orders_by_customer.remove(&row.id).unwrap_or_default(),
                name: row.name,
                birth_date: row.birth_date,
            })
            .collect())
    }
}
