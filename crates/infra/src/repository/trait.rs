use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use carhub_cars::{Car, CarId};

use super::query::Pageable;

/// Repository operation error.
///
/// These are **infrastructure errors** (storage, connectivity, row decoding) as
/// opposed to domain errors (validation, missing identifiers).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(String),

    #[error("connection pool closed")]
    PoolClosed,

    #[error("failed to decode row: {0}")]
    Decode(String),
}

/// Persistence boundary for [`Car`] records.
///
/// ## Save Semantics
///
/// `save()`:
/// - a record without an identifier is inserted and receives a fresh one
/// - a record with an identifier overwrites the stored row (last write wins)
/// - the stored record is returned, with the age normalized
///
/// No operation checks for concurrent writers; callers that need an
/// existence check call `exists_by_id()` first.
#[async_trait]
pub trait CarRepository: Send + Sync {
    async fn save(&self, car: Car) -> Result<Car, RepositoryError>;

    async fn find_by_id(&self, id: CarId) -> Result<Option<Car>, RepositoryError>;

    async fn exists_by_id(&self, id: CarId) -> Result<bool, RepositoryError>;

    /// Remove a record. Deleting a missing identifier is not an error.
    async fn delete_by_id(&self, id: CarId) -> Result<(), RepositoryError>;

    /// Size of the whole collection.
    async fn count(&self) -> Result<u64, RepositoryError>;

    /// One page of records, ordered by `pageable.sort` (then by id).
    async fn find_all(&self, pageable: &Pageable) -> Result<Vec<Car>, RepositoryError>;
}

#[async_trait]
impl<S> CarRepository for Arc<S>
where
    S: CarRepository + ?Sized,
{
    async fn save(&self, car: Car) -> Result<Car, RepositoryError> {
        (**self).save(car).await
    }

    async fn find_by_id(&self, id: CarId) -> Result<Option<Car>, RepositoryError> {
        (**self).find_by_id(id).await
    }

    async fn exists_by_id(&self, id: CarId) -> Result<bool, RepositoryError> {
        (**self).exists_by_id(id).await
    }

    async fn delete_by_id(&self, id: CarId) -> Result<(), RepositoryError> {
        (**self).delete_by_id(id).await
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        (**self).count().await
    }

    async fn find_all(&self, pageable: &Pageable) -> Result<Vec<Car>, RepositoryError> {
        (**self).find_all(pageable).await
    }
}
