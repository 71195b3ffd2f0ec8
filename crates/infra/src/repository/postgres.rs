//! Postgres-backed car repository.
//!
//! ## Error Mapping
//!
//! SQLx errors are mapped to `RepositoryError` as follows:
//!
//! | SQLx Error | RepositoryError |
//! |------------|-----------------|
//! | Database (any code) | `Database` |
//! | PoolClosed | `PoolClosed` |
//! | ColumnDecode / Decode | `Decode` |
//! | Other | `Database` |
//!
//! ## Thread Safety
//!
//! `PostgresCarRepository` is `Send + Sync`; the SQLx pool manages connections.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;

use carhub_cars::{Car, CarId};

use super::query::{Order, Pageable};
use super::r#trait::{CarRepository, RepositoryError};

/// Postgres-backed store for the `car` table.
#[derive(Debug, Clone)]
pub struct PostgresCarRepository {
    pool: Arc<PgPool>,
}

impl PostgresCarRepository {
    /// Create a new PostgresCarRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    async fn insert(&self, car: &Car) -> Result<Car, RepositoryError> {
        let row = sqlx::query(
            r#"
            INSERT INTO car (name, age, is_broken)
            VALUES ($1, $2, $3)
            RETURNING id, name, age, is_broken
            "#,
        )
        .bind(car.name())
        .bind(car.age())
        .bind(car.is_broken())
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert", e))?;

        car_from_row(&row)
    }

    async fn upsert(&self, id: CarId, car: &Car) -> Result<Car, RepositoryError> {
        let row = sqlx::query(
            r#"
            INSERT INTO car (id, name, age, is_broken)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id)
            DO UPDATE SET
                name = EXCLUDED.name,
                age = EXCLUDED.age,
                is_broken = EXCLUDED.is_broken
            RETURNING id, name, age, is_broken
            "#,
        )
        .bind(id.get())
        .bind(car.name())
        .bind(car.age())
        .bind(car.is_broken())
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("upsert", e))?;

        car_from_row(&row)
    }
}

#[async_trait]
impl CarRepository for PostgresCarRepository {
    #[instrument(skip(self, car), fields(car_id = ?car.id()), err)]
    async fn save(&self, car: Car) -> Result<Car, RepositoryError> {
        match car.id() {
            Some(id) => self.upsert(id, &car).await,
            None => self.insert(&car).await,
        }
    }

    #[instrument(skip(self), fields(car_id = %id), err)]
    async fn find_by_id(&self, id: CarId) -> Result<Option<Car>, RepositoryError> {
        let row = sqlx::query("SELECT id, name, age, is_broken FROM car WHERE id = $1")
            .bind(id.get())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_by_id", e))?;

        row.as_ref().map(car_from_row).transpose()
    }

    #[instrument(skip(self), fields(car_id = %id), err)]
    async fn exists_by_id(&self, id: CarId) -> Result<bool, RepositoryError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM car WHERE id = $1)")
            .bind(id.get())
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("exists_by_id", e))
    }

    #[instrument(skip(self), fields(car_id = %id), err)]
    async fn delete_by_id(&self, id: CarId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM car WHERE id = $1")
            .bind(id.get())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_by_id", e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn count(&self) -> Result<u64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM car")
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("count", e))?;
        Ok(count.max(0) as u64)
    }

    #[instrument(skip(self), fields(page = pageable.page, size = pageable.size), err)]
    async fn find_all(&self, pageable: &Pageable) -> Result<Vec<Car>, RepositoryError> {
        let sql = format!(
            "SELECT id, name, age, is_broken FROM car ORDER BY {} LIMIT $1 OFFSET $2",
            order_by_clause(&pageable.sort)
        );

        let rows = sqlx::query(&sql)
            .bind(i64::from(pageable.size))
            .bind(i64::try_from(pageable.offset()).unwrap_or(i64::MAX))
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_all", e))?;

        rows.iter().map(car_from_row).collect()
    }
}

/// Map a JSON property to its column. Only whitelisted names reach the SQL text.
fn column_for(property: &str) -> Option<&'static str> {
    match property {
        "id" => Some("id"),
        "name" => Some("name"),
        "age" => Some("age"),
        "isBroken" => Some("is_broken"),
        _ => None,
    }
}

fn order_by_clause(sort: &[Order]) -> String {
    let mut terms: Vec<String> = sort
        .iter()
        .filter_map(|o| column_for(&o.property).map(|c| format!("{c} {}", o.direction.as_sql())))
        .collect();
    terms.push("id ASC".to_string());
    terms.join(", ")
}

fn car_from_row(row: &PgRow) -> Result<Car, RepositoryError> {
    let decode = |e: sqlx::Error| RepositoryError::Decode(e.to_string());

    let id: i64 = row.try_get("id").map_err(decode)?;
    let name: Option<String> = row.try_get("name").map_err(decode)?;
    let age: Option<Decimal> = row.try_get("age").map_err(decode)?;
    let is_broken: Option<bool> = row.try_get("is_broken").map_err(decode)?;

    let mut car = Car::new().with_id(CarId::new(id));
    car.set_name(name);
    car.set_age(age);
    car.set_is_broken(is_broken);
    Ok(car)
}

/// Map SQLx errors to RepositoryError.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> RepositoryError {
    match err {
        sqlx::Error::Database(db_err) => RepositoryError::Database(format!(
            "database error in {}: {}",
            operation,
            db_err.message()
        )),
        sqlx::Error::PoolClosed => RepositoryError::PoolClosed,
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            RepositoryError::Decode(format!("{operation}: {err}"))
        }
        _ => RepositoryError::Database(format!("sqlx error in {}: {}", operation, err)),
    }
}
