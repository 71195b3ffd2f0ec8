//! Infrastructure wiring: picks the repository backend from configuration.

use std::sync::Arc;

use carhub_infra::{
    AppConfig, CarRepository, InMemoryCarRepository, PostgresCarRepository, StoreConfig,
    db::{self, DbError},
};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppServices {
    cars: Arc<dyn CarRepository>,
    application_name: String,
}

impl AppServices {
    pub fn new(cars: Arc<dyn CarRepository>, application_name: impl Into<String>) -> Self {
        Self {
            cars,
            application_name: application_name.into(),
        }
    }

    /// In-memory services (tests/dev).
    pub fn in_memory(application_name: impl Into<String>) -> Self {
        Self::new(Arc::new(InMemoryCarRepository::new()), application_name)
    }

    pub fn cars(&self) -> &dyn CarRepository {
        self.cars.as_ref()
    }

    /// Prefix of the `X-{app}-*` alert headers.
    pub fn application_name(&self) -> &str {
        &self.application_name
    }
}

impl std::fmt::Debug for AppServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppServices")
            .field("application_name", &self.application_name)
            .finish_non_exhaustive()
    }
}

pub async fn build_services(config: &AppConfig) -> Result<AppServices, DbError> {
    match &config.store {
        StoreConfig::InMemory => {
            tracing::info!("using in-memory car repository");
            Ok(AppServices::in_memory(config.application_name.clone()))
        }
        StoreConfig::Postgres(db_config) => {
            tracing::info!("using postgres car repository");
            let pool = db::connect(db_config).await?;
            Ok(AppServices::new(
                Arc::new(PostgresCarRepository::new(pool)),
                config.application_name.clone(),
            ))
        }
    }
}
