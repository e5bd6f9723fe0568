//! Customer domain module

pub mod entity;
pub mod repository;

pub use entity::Customer;
pub use repository::CustomerRepository;
