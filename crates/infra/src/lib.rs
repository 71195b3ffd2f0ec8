//! Infrastructure layer: persistence, database bootstrap, configuration.

pub mod config;
pub mod db;
pub mod repository;

pub use config::{AppConfig, ConfigError, DatabaseConfig, StoreConfig};
pub use repository::{CarRepository, InMemoryCarRepository, PostgresCarRepository, RepositoryError};
