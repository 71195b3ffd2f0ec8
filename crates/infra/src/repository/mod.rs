//! Car persistence boundary.
//!
//! Defines the storage-agnostic `CarRepository` plus an in-memory backend
//! (tests/dev) and a Postgres backend (production).

pub mod in_memory;
pub mod postgres;
pub mod query;
pub mod r#trait;

pub use in_memory::InMemoryCarRepository;
pub use postgres::PostgresCarRepository;
pub use query::{Direction, Order, Page, Pageable};
pub use r#trait::{CarRepository, RepositoryError};
