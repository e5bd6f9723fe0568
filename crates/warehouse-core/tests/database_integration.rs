//! End-to-end tests: services and unit of work over real SQLite databases

use std::sync::Arc;

use chrono::NaiveDate;
use tempfile::TempDir;
use warehouse_core::application::CustomerService;
use warehouse_core::domain::unit_of_work::{UnitOfWork, UnitOfWorkState, run_in_transaction};
use warehouse_core::domain::warehouse::WarehouseService;
use warehouse_core::infrastructure::{
    Session, SqliteCustomerRepository, SqliteOrderRepository, SqliteProductRepository,
    SqliteUnitOfWork,
};
use warehouse_core::storage::{Database, DatabaseConfig};
use warehouse_core::{Error, Result};

struct App {
    session: Session,
    warehouse: WarehouseService,
    customers: CustomerService,
}

fn wire(db: &Database) -> App {
    let session = Session::new(db);
    let products = Arc::new(SqliteProductRepository::new(session.clone()));
    let orders = Arc::new(SqliteOrderRepository::new(session.clone()));
    let customers = Arc::new(SqliteCustomerRepository::new(session.clone()));

    App {
        warehouse: WarehouseService::new(products.clone(), orders.clone()),
        customers: CustomerService::new(customers, orders, products),
        session,
    }
}

fn birth_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1985, 11, 2).unwrap()
}

#[tokio::test]
async fn test_products_and_order_committed_together() {
    let db = Database::in_memory().await.unwrap();
    let app = wire(&db);
    let mut uow = SqliteUnitOfWork::new(app.session.clone());

    let order = run_in_transaction(&mut uow, || async {
        let laptop = app.warehouse.create_product("Laptop", 2, 1200.0).await?;
        let mouse = app.warehouse.create_product("Mouse", 4, 25.0).await?;
        app.warehouse.create_order(vec![laptop, mouse]).await
    })
    .await
    .unwrap();

    assert_eq!(uow.state(), UnitOfWorkState::Closed);

    let reader = wire(&db);
    let stored = reader.warehouse.get_order(order.id.value().unwrap()).await.unwrap();
    assert_eq!(stored.products.len(), 2);
    assert_eq!(stored.products[0].name, "Laptop");
    assert!((stored.total_price() - 2500.0).abs() < 1e-9);
    assert_eq!(reader.warehouse.list_products().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_failed_work_leaves_nothing_behind() {
    let db = Database::in_memory().await.unwrap();
    let app = wire(&db);
    let mut uow = SqliteUnitOfWork::new(app.session.clone());

    let result = run_in_transaction(&mut uow, || async {
        app.warehouse.create_product("Keyboard", 1, 45.0).await?;
        app.warehouse.create_product("", 1, 1.0).await
    })
    .await;

    assert!(matches!(result, Err(Error::InvalidArgument(_))));

    let reader = wire(&db);
    assert!(reader.warehouse.list_products().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_customer_order_flow() {
    let db = Database::in_memory().await.unwrap();
    let app = wire(&db);

    let mut uow = SqliteUnitOfWork::new(app.session.clone());
    let customer = run_in_transaction(&mut uow, || async {
        let customer = app.customers.register_customer("Maria", birth_date()).await?;
        let id = customer.id.require("Customer")?;
        app.customers
            .create_order_for_customer(id, None, "Chair", 4, 80.0)
            .await?;
        app.customers
            .create_order_for_customer(id, Some(500), "Table", 1, 300.0)
            .await?;
        Ok(customer)
    })
    .await
    .unwrap();

    let reader = wire(&db);
    let info = reader
        .customers
        .get_customer_info(customer.id.value().unwrap())
        .await
        .unwrap();

    assert_eq!(info.name, "Maria");
    assert_eq!(info.age, customer.age());
    assert_eq!(info.orders.len(), 2);
    assert_eq!(info.orders[0].total_price, 320.0);
    assert_eq!(info.orders[1].id, 500);
    assert_eq!(info.orders[1].items[0].product, "Table");
}

#[tokio::test]
async fn test_order_for_unknown_customer_rolls_back() {
    let db = Database::in_memory().await.unwrap();
    let app = wire(&db);
    let mut uow = SqliteUnitOfWork::new(app.session.clone());

    let result = run_in_transaction(&mut uow, || async {
        app.customers
            .create_order_for_customer(77, None, "Lamp", 1, 10.0)
            .await
    })
    .await;

    assert!(matches!(result, Err(Error::DomainRuleViolation(_))));
    assert!(wire(&db).warehouse.list_orders().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_duplicate_order_id_rolls_back_product_line() {
    let db = Database::in_memory().await.unwrap();
    let app = wire(&db);

    let mut uow = SqliteUnitOfWork::new(app.session.clone());
    let customer_id = run_in_transaction(&mut uow, || async {
        let customer = app.customers.register_customer("Ivan", birth_date()).await?;
        let id = customer.id.require("Customer")?;
        app.customers
            .create_order_for_customer(id, Some(1), "Pen", 1, 1.0)
            .await?;
        Ok(id)
    })
    .await
    .unwrap();

    let app = wire(&db);
    let mut uow = SqliteUnitOfWork::new(app.session.clone());
    let result = run_in_transaction(&mut uow, || async {
        app.customers
            .create_order_for_customer(customer_id, Some(1), "Pencil", 1, 0.5)
            .await
    })
    .await;

    assert!(matches!(result, Err(Error::ConstraintViolation(_))));
    let products = wire(&db).warehouse.list_products().await.unwrap();
    assert_eq!(products.len(), 1, "product line of the failed order must roll back");
}

#[tokio::test]
async fn test_committed_data_survives_reconnect() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("warehouse.db");

    {
        let db = Database::new(DatabaseConfig::with_path(&path)).await.unwrap();
        let app = wire(&db);
        let mut uow = SqliteUnitOfWork::new(app.session.clone());
        run_in_transaction(&mut uow, || async {
            app.warehouse.create_product("Monitor", 3, 199.0).await
        })
        .await
        .unwrap();
        db.close().await;
    }

    let db = Database::new(DatabaseConfig::with_path(&path)).await.unwrap();
    let products = wire(&db).warehouse.list_products().await.unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].name, "Monitor");

    let status = db.migration_status().await.unwrap();
    assert!(!status.needs_migration);
}

#[tokio::test]
async fn test_uncommitted_work_is_invisible_to_other_sessions() -> Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let db = Database::new(DatabaseConfig::with_path(temp_dir.path().join("w.db")))
        .await
        .map_err(|e| Error::Config(e.to_string()))?;

    let writer = wire(&db);
    let mut uow = SqliteUnitOfWork::new(writer.session.clone());
    uow.begin().await?;
    writer.warehouse.create_product("Pending", 1, 1.0).await?;

    let reader = wire(&db);
    assert!(reader.warehouse.list_products().await?.is_empty());
    reader.session.rollback().await?;

    uow.rollback().await?;
    assert!(reader.warehouse.list_products().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_invalid_order_id_writes_nothing_even_if_session_commits() {
    let db = Database::in_memory().await.unwrap();
    let app = wire(&db);

    let mut uow = SqliteUnitOfWork::new(app.session.clone());
    let customer_id = run_in_transaction(&mut uow, || async {
        let customer = app.customers.register_customer("Olga", birth_date()).await?;
        customer.id.require("Customer")
    })
    .await
    .unwrap();

    let err = app
        .customers
        .create_order_for_customer(customer_id, Some(-5), "Pen", 1, 1.0)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)), "got {:?}", err);
    assert!(!app.session.in_transaction().await);

    app.session.commit().await.unwrap();

    assert!(app.warehouse.list_products().await.unwrap().is_empty());
    assert!(app.warehouse.list_orders().await.unwrap().is_empty());
}
