//! Storage layer - SQLite
//!
//! Provides database management and migrations.
//!
//! # Architecture
//!
//! - `database`: Connection pool management and initialization
//! - `migrations`: Schema versioning and automatic migration
//!
//! # Usage
//!
//! ```ignore
//! use warehouse_core::storage::{Database, DatabaseConfig};
//!
//! // Create an in-memory database for testing
//! let db = Database::in_memory().await?;
//!
//! // Or a file-backed one
//! let db = Database::new(DatabaseConfig::with_url("sqlite://warehouse.db")).await?;
//! ```

pub mod database;
pub mod migrations;

// Re-export commonly used types
pub use database::{DEFAULT_DATABASE_URL, DEFAULT_MAX_CONNECTIONS, Database, DatabaseConfig};
pub use migrations::{CURRENT_VERSION, MigrationStatus, migration_status, run_migrations};
