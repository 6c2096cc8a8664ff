//! PostgreSQL connection pool.
//!
//! Live WebSocket sessions never hold a connection; only the mutation
//! pipeline and reads do, so the pool is sized for concurrent requests.

use std::time::{Duration, Instant};

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{debug, info, warn};

use jotter_core::defaults::{DB_ACQUIRE_TIMEOUT_SECS, DB_MAX_CONNECTIONS};
use jotter_core::{Error, Result};

/// Pool sizing, usually built from `DB_MAX_CONNECTIONS` and
/// `DB_ACQUIRE_TIMEOUT_SECS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    pub max_connections: u32,
    /// How long a request waits for a free connection before failing.
    pub acquire_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DB_MAX_CONNECTIONS,
            acquire_timeout: Duration::from_secs(DB_ACQUIRE_TIMEOUT_SECS),
        }
    }
}

impl PoolConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_connections(mut self, n: u32) -> Self {
        self.max_connections = n;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    fn options(&self) -> Result<PgPoolOptions> {
        if self.max_connections == 0 {
            return Err(Error::Config(
                "database pool needs at least one connection".to_string(),
            ));
        }
        if self.acquire_timeout.is_zero() {
            return Err(Error::Config(
                "database acquire timeout must be positive".to_string(),
            ));
        }
        Ok(PgPoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(self.acquire_timeout))
    }
}

/// Open a pool against `database_url`.
pub async fn connect_pool(database_url: &str, config: PoolConfig) -> Result<PgPool> {
    let options = config.options()?;
    let start = Instant::now();
    let pool = options.connect(database_url).await?;

    info!(
        subsystem = "db",
        component = "pool",
        op = "connect",
        max_connections = config.max_connections,
        acquire_timeout_secs = config.acquire_timeout.as_secs(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Database pool ready"
    );
    Ok(pool)
}

/// Point-in-time view of pool usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    pub size: u32,
    pub idle: usize,
}

impl PoolStatus {
    pub fn of(pool: &PgPool) -> Self {
        Self {
            size: pool.size(),
            idle: pool.num_idle(),
        }
    }

    /// Every open connection is checked out.
    pub fn is_saturated(&self) -> bool {
        self.size > 0 && self.idle == 0
    }

    pub fn log(&self) {
        if self.is_saturated() {
            warn!(
                subsystem = "db",
                component = "pool",
                pool_size = self.size,
                "No idle database connections; requests will queue"
            );
        } else {
            debug!(
                subsystem = "db",
                component = "pool",
                pool_size = self.size,
                pool_idle = self.idle,
                "Database pool status"
            );
        }
    }
}
