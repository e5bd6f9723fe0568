//! Infrastructure layer
//!
//! SQLite adapters for the domain repository traits plus the session and
//! unit of work they share.
//!
//! ```ignore
//! let db = Database::in_memory().await?;
//! let session = Session::new(&db);
//! let products = SqliteProductRepository::new(session.clone());
//! let mut uow = SqliteUnitOfWork::new(session);
//! ```

pub mod repositories;
pub mod session;
pub mod unit_of_work;

pub use repositories::{SqliteCustomerRepository, SqliteOrderRepository, SqliteProductRepository};
pub use session::{Session, SessionConnection};
pub use unit_of_work::SqliteUnitOfWork;
