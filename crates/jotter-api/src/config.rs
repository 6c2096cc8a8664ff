//! Server configuration from environment variables.
//!
//! | Variable | Default |
//! |---|---|
//! | `HOST` | `0.0.0.0` |
//! | `PORT` | `8080` |
//! | `DATABASE_URL` | `postgres://localhost/jotter` |
//! | `STORAGE` | `postgres` (`memory` for an in-process store) |
//! | `JWT_SECRET` | required when `ENVIRONMENT=production` |
//! | `TOKEN_TTL_HOURS` | `24` |
//! | `ENVIRONMENT` | `development` |
//! | `WS_QUEUE_CAPACITY` | `256` |
//! | `WS_PING_INTERVAL_SECS` | `30` (`0` disables) |
//! | `DB_MAX_CONNECTIONS` | `10` |
//! | `DB_ACQUIRE_TIMEOUT_SECS` | `30` |
//! | `ALLOWED_ORIGINS` | `http://localhost:3000` (comma-separated) |

use std::time::Duration;

use axum::http::HeaderValue;
use tracing::warn;

use jotter_core::defaults::{
    DB_ACQUIRE_TIMEOUT_SECS, DB_MAX_CONNECTIONS, OUTBOUND_QUEUE_CAPACITY, SERVER_HOST,
    SERVER_PORT, TOKEN_TTL_HOURS, WS_PING_INTERVAL_SECS,
};
use jotter_core::{Error, Result};
use jotter_db::PoolConfig;

use crate::hub::SessionSettings;
use crate::parse_allowed_origins;

const DEV_JWT_SECRET: &str = "jotter-dev-secret";

/// Backing store selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Postgres,
    Memory,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub storage: StorageKind,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub environment: String,
    pub ws_queue_capacity: usize,
    pub ws_ping_interval_secs: u64,
    pub db_max_connections: u32,
    pub db_acquire_timeout_secs: u64,
    /// CORS origins; invalid entries are dropped with a warning.
    pub allowed_origins: Vec<HeaderValue>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = get("ENVIRONMENT").unwrap_or_else(|| "development".to_string());
        let jwt_secret = match get("JWT_SECRET") {
            Some(secret) => secret,
            None if environment == "production" => {
                return Err(Error::Config(
                    "JWT_SECRET must be set in production".to_string(),
                ))
            }
            None => {
                warn!("JWT_SECRET not set, using development secret");
                DEV_JWT_SECRET.to_string()
            }
        };

        let storage = match get("STORAGE").as_deref() {
            None | Some("postgres") => StorageKind::Postgres,
            Some("memory") => StorageKind::Memory,
            Some(other) => {
                return Err(Error::Config(format!(
                    "STORAGE must be 'postgres' or 'memory', got '{}'",
                    other
                )))
            }
        };

        let ws_queue_capacity = parse(&get, "WS_QUEUE_CAPACITY", OUTBOUND_QUEUE_CAPACITY)?;
        if ws_queue_capacity == 0 {
            return Err(Error::Config(
                "WS_QUEUE_CAPACITY must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| SERVER_HOST.to_string()),
            port: parse(&get, "PORT", SERVER_PORT)?,
            database_url: get("DATABASE_URL")
                .unwrap_or_else(|| "postgres://localhost/jotter".to_string()),
            storage,
            jwt_secret,
            token_ttl_hours: parse(&get, "TOKEN_TTL_HOURS", TOKEN_TTL_HOURS)?,
            environment,
            ws_queue_capacity,
            ws_ping_interval_secs: parse(&get, "WS_PING_INTERVAL_SECS", WS_PING_INTERVAL_SECS)?,
            db_max_connections: parse(&get, "DB_MAX_CONNECTIONS", DB_MAX_CONNECTIONS)?,
            db_acquire_timeout_secs: parse(
                &get,
                "DB_ACQUIRE_TIMEOUT_SECS",
                DB_ACQUIRE_TIMEOUT_SECS,
            )?,
            allowed_origins: parse_allowed_origins(get("ALLOWED_ORIGINS").as_deref()),
        })
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            queue_capacity: self.ws_queue_capacity,
            ping_interval: (self.ws_ping_interval_secs > 0)
                .then(|| Duration::from_secs(self.ws_ping_interval_secs)),
        }
    }

    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig::new()
            .max_connections(self.db_max_connections)
            .acquire_timeout(Duration::from_secs(self.db_acquire_timeout_secs))
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(v) => parse_value(key, &v),
        None => Ok(default),
    }
}

fn parse_value<T>(key: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| Error::Config(format!("invalid {} '{}': {}", key, value, e)))
}
