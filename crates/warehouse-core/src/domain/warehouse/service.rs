//! Warehouse service
//!
//! Validated creation of products and orders on top of the repositories.

use std::sync::Arc;

use tracing::info;

use crate::error::Result;

use super::entity::{Order, Product};
use super::repository::{OrderRepository, ProductRepository};
use super::validation::ProductValidator;

/// Manages products and orders
#[derive(Clone)]
pub struct WarehouseService {
    products: Arc<dyn ProductRepository>,
    orders: Arc<dyn OrderRepository>,
}

impl WarehouseService {
    pub fn new(products: Arc<dyn ProductRepository>, orders: Arc<dyn OrderRepository>) -> Self {
        Self { products, orders }
    }

    /// Create a product and persist it
    ///
    /// Inputs are validated before the repository is touched, so an invalid
    /// product never reaches the store.
    pub async fn create_product(&self, name: &str, quantity: i64, price: f64) -> Result<Product> {
        ProductValidator::validate(name, quantity, price)?;

        let mut product = Product::new(name, quantity, price);
        self.products.add(&mut product).await?;

        info!(product_id = %product.id, name = %product.name, "Created product");
        Ok(product)
    }

    /// Create an order over already-persisted products
    pub async fn create_order(&self, products: Vec<Product>) -> Result<Order> {
        ProductValidator::validate_order_products(&products)?;

        let mut order = Order::new(products);
        self.orders.add(&mut order).await?;

        info!(
            order_id = %order.id,
            products = order.products.len(),
            "Created order"
        );
        Ok(order)
    }

    pub async fn get_product(&self, product_id: i64) -> Result<Product> {
        self.products.get(product_id).await
    }

    pub async fn list_products(&self) -> Result<Vec<Product>> {
        self.products.list().await
    }

    pub async fn get_order(&self, order_id: i64) -> Result<Order> {
        self.orders.get(order_id).await
    }

    pub async fn list_orders(&self) -> Result<Vec<Order>> {
        self.orders.list().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Identity;
    use crate::error::Error;
    use async_trait::async_trait;
    use std::sync::Mutex;

    // Mock ProductRepository for testing
    #[derive(Default)]
    struct MockProductRepository {
        products: Mutex<Vec<Product>>,
        add_calls: Mutex<usize>,
    }

    impl MockProductRepository {
        fn add_calls(&self) -> usize {
            *self.add_calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl ProductRepository for MockProductRepository {
        async fn add(&self, product: &mut Product) -> Result<()> {
            *self.add_calls.lock().unwrap() += 1;
            let mut products = self.products.lock().unwrap();
            product.id = Identity::Assigned(products.len() as i64 + 1);
            products.push(product.clone());
            Ok(())
        }

        async fn get(&self, product_id: i64) -> Result<Product> {
            self.products
                .lock()
                .unwrap()
                .iter()
                .find(|p| p.id == Identity::Assigned(product_id))
                .cloned()
                .ok_or(Error::not_found("Product", product_id))
        }

        async fn list(&self) -> Result<Vec<Product>> {
            Ok(self.products.lock().unwrap().clone())
        }
    }

    // Mock OrderRepository for testing
    #[derive(Default)]
    struct MockOrderRepository {
        orders: Mutex<Vec<Order>>,
    }

    #[async_trait]
    impl OrderRepository for MockOrderRepository {
        async fn add(&self, order: &mut Order) -> Result<()> {
            let mut orders = self.orders.lock().unwrap();
            order.id = Identity::Assigned(orders.len() as i64 + 1);
            orders.push(order.clone());
            Ok(())
        }

        async fn get(&self, order_id: i64) -> Result<Order> {
            self.orders
                .lock()
                .unwrap()
                .iter()
                .find(|o| o.id == Identity::Assigned(order_id))
                .cloned()
                .ok_or(Error::not_found("Order", order_id))
        }

        async fn list(&self) -> Result<Vec<Order>> {
            Ok(self.orders.lock().unwrap().clone())
        }
    }

    fn service() -> (WarehouseService, Arc<MockProductRepository>, Arc<MockOrderRepository>) {
        let products = Arc::new(MockProductRepository::default());
        let orders = Arc::new(MockOrderRepository::default());
        let service = WarehouseService::new(products.clone(), orders.clone());
        (service, products, orders)
    }

    #[tokio::test]
    async fn test_create_product_success() {
        let cases = [("Laptop", 10, 999.99), ("Smartphone", 5, 499.50), ("Monitor", 3, 199.99)];

        for (name, quantity, price) in cases {
            let (service, products, _) = service();

            let product = service.create_product(name, quantity, price).await.unwrap();

            assert_eq!(product.name, name);
            assert_eq!(product.quantity, quantity);
            assert_eq!(product.price, price);
            assert!(product.id.is_assigned());
            assert_eq!(products.add_calls(), 1);
        }
    }

    #[tokio::test]
    async fn test_create_product_invalid_input() {
        let cases = [("", 10, 999.99), ("Laptop", -1, 999.99), ("Laptop", 10, -100.00)];

        for (name, quantity, price) in cases {
            let (service, products, _) = service();

            let err = service.create_product(name, quantity, price).await.unwrap_err();

            assert!(matches!(err, Error::InvalidArgument(_)), "got {:?}", err);
            assert_eq!(products.add_calls(), 0);
        }
    }

    #[tokio::test]
    async fn test_create_order_keeps_product_order() {
        let (service, _, orders) = service();
        let first = service.create_product("Product 1", 5, 99.99).await.unwrap();
        let second = service.create_product("Product 2", 3, 49.99).await.unwrap();

        let order = service.create_order(vec![first, second]).await.unwrap();

        assert_eq!(order.id, Identity::Assigned(1));
        assert_eq!(order.products.len(), 2);
        assert_eq!(order.products[0].name, "Product 1");
        assert_eq!(order.products[1].name, "Product 2");
        assert_eq!(orders.orders.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_order_rejects_unpersisted_products() {
        let (service, _, orders) = service();

        let err = service
            .create_order(vec![Product::new("Loose", 1, 1.0)])
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(orders.orders.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_missing_product() {
        let (service, _, _) = service();
        let err = service.get_product(42).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { entity: "Product", id: 42 }));
    }
}
