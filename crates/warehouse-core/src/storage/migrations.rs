//! Database migrations
//!
//! This module manages SQLite schema migrations for the warehouse store.
//! Migrations are versioned and applied automatically on database connection.

use sqlx::SqlitePool;

use crate::error::{Error, Result};

/// Current schema version
pub const CURRENT_VERSION: i32 = 2;

/// SQL for creating the migrations tracking table
const CREATE_MIGRATIONS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS _migrations (
        version INTEGER PRIMARY KEY NOT NULL,
        applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    );
"#;

/// Migration 1: Products and orders
const MIGRATION_V1: &str = r#"
    -- Products table
    CREATE TABLE IF NOT EXISTS products (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        quantity INTEGER NOT NULL CHECK (quantity >= 0),
        price REAL NOT NULL CHECK (price >= 0)
    );

    CREATE INDEX IF NOT EXISTS idx_products_name ON products(name);

    -- Orders table
    CREATE TABLE IF NOT EXISTS orders (
        id INTEGER PRIMARY KEY AUTOINCREMENT
    );

    -- Order <-> product links, position keeps the order products were added in
    CREATE TABLE IF NOT EXISTS order_product_associations (
        order_id INTEGER NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
        product_id INTEGER NOT NULL REFERENCES products(id),
        position INTEGER NOT NULL DEFAULT 0,
        PRIMARY KEY (order_id, product_id)
    );

    CREATE INDEX IF NOT EXISTS idx_order_product_associations_product_id
        ON order_product_associations(product_id);
"#;

/// Migration 2: Customers owning orders
const MIGRATION_V2: &str = r#"
    CREATE TABLE IF NOT EXISTS customers (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        birth_date DATE NOT NULL
    );

    ALTER TABLE orders ADD COLUMN customer_id INTEGER REFERENCES customers(id) ON DELETE CASCADE;

    CREATE INDEX IF NOT EXISTS idx_orders_customer_id ON orders(customer_id);
"#;

/// Get the current schema version from the database
async fn get_current_version(pool: &SqlitePool) -> Result<i32> {
    sqlx::raw_sql(CREATE_MIGRATIONS_TABLE).execute(pool).await?;

    let (version,): (i32,) = sqlx::query_as("SELECT COALESCE(MAX(version), 0) FROM _migrations")
        .fetch_one(pool)
        .await?;

    Ok(version)
}

/// Record that a migration has been applied
async fn record_migration(pool: &SqlitePool, version: i32) -> Result<()> {
    sqlx::query("INSERT INTO _migrations (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;
    Ok(())
}

/// Apply one migration script and record it
async fn apply_migration(pool: &SqlitePool, version: i32, name: &str, sql: &str) -> Result<()> {
    tracing::info!("Applying migration v{}: {}", version, name);
    sqlx::raw_sql(sql)
        .execute(pool)
        .await
        .map_err(|e| Error::Migration(format!("v{} ({}): {}", version, name, e)))?;
    record_migration(pool, version).await
}

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let current_version = get_current_version(pool).await?;

    tracing::debug!(
        current_version,
        target_version = CURRENT_VERSION,
        "Checking database migrations"
    );

    if current_version < 1 {
        apply_migration(pool, 1, "Products and orders", MIGRATION_V1).await?;
    }

    if current_version < 2 {
        apply_migration(pool, 2, "Customers owning orders", MIGRATION_V2).await?;
    }

    tracing::info!("Database migrations completed");
    Ok(())
}

/// Get migration status information
pub async fn migration_status(pool: &SqlitePool) -> Result<MigrationStatus> {
    let current_version = get_current_version(pool).await?;
    Ok(MigrationStatus {
        current_version,
        target_version: CURRENT_VERSION,
        needs_migration: current_version < CURRENT_VERSION,
    })
}

/// Migration status information
#[derive(Debug, Clone)]
pub struct MigrationStatus {
    /// Current schema version in the database
    pub current_version: i32,
    /// Target schema version (latest)
    pub target_version: i32,
    /// Whether migrations need to be run
    pub needs_migration: bool,
}
