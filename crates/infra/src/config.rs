//! Configuration loading and representation.
//!
//! All settings come from the process environment:
//!
//! | Variable | Default | Meaning |
//! |---|---|---|
//! | `BIND_ADDR` | `0.0.0.0:8080` | HTTP listen address |
//! | `APP_NAME` | `carApp` | prefix of the `X-{app}-*` alert headers |
//! | `USE_PERSISTENT_STORES` | `false` | `true` selects Postgres, otherwise in-memory |
//! | `DATABASE_URL` | — | required when persistent |
//! | `DATABASE_MAX_CONNECTIONS` | `5` | pool size |

use std::net::SocketAddr;

use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_APP_NAME: &str = "carApp";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },

    #[error("{0} must be set when USE_PERSISTENT_STORES=true")]
    Missing(&'static str),
}

/// Postgres connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Which repository backend to wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    InMemory,
    Postgres(DatabaseConfig),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub application_name: String,
    pub store: StoreConfig,
}

impl AppConfig {
    /// In-memory configuration bound to an ephemeral local port (tests/dev).
    pub fn in_memory() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            application_name: DEFAULT_APP_NAME.to_string(),
            store: StoreConfig::InMemory,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                var: "BIND_ADDR",
                reason: e.to_string(),
            })?;

        let application_name = lookup("APP_NAME")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_APP_NAME.to_string());

        let use_persistent = lookup("USE_PERSISTENT_STORES")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let store = if use_persistent {
            let url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
            let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
                Some(raw) => raw.parse::<u32>().map_err(|e| ConfigError::Invalid {
                    var: "DATABASE_MAX_CONNECTIONS",
                    reason: e.to_string(),
                })?,
                None => DEFAULT_MAX_CONNECTIONS,
            };
            StoreConfig::Postgres(DatabaseConfig {
                url,
                max_connections,
            })
        } else {
            StoreConfig::InMemory
        };

        Ok(Self {
            bind_addr,
            application_name,
            store,
        })
    }
}
