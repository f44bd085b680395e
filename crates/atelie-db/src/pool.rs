//! # Database Handle
//!
//! Opens the workshop's SQLite file and hands out repositories.
//!
//! ```text
//! ConfigState (pool_size, connect_timeout_secs, database_path)
//!      │
//!      ▼
//! DbConfig ──► Database::new ──► SqlitePool (WAL, foreign keys on)
//!                   │
//!                   ├── pending migrations applied
//!                   ▼
//!              ping() + migration_status()   startup checks
//!                   │
//!                   ▼
//!              stock() / orders() / sales() / materials() / pricing()
//! ```
//!
//! The stock sale and quote conversion each hold one pooled connection
//! for the length of their transaction; everything else borrows one per
//! statement.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations::{self, MigrationStatus};
use crate::repository::material::MaterialRepository;
use crate::repository::order::OrderRepository;
use crate::repository::pricing::PricingRepository;
use crate::repository::sale::SaleRepository;
use crate::repository::stock::StockRepository;

/// Connections kept open while idle.
const MIN_CONNECTIONS: u32 = 1;

/// Where and how to open the database.
///
/// ```rust,ignore
/// let config = DbConfig::new("/srv/atelie/atelie.db")
///     .max_connections(4)
///     .connect_timeout(Duration::from_secs(10));
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub database_path: PathBuf,
    /// Upper bound on pooled connections. Default: 5
    pub max_connections: u32,
    /// How long a command waits for a free connection. Default: 30s
    pub connect_timeout: Duration,
    pub idle_timeout: Duration,
}

impl DbConfig {
    /// A file-backed database; the file is created on first open.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
        }
    }

    /// Values below one are raised to one.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max.max(MIN_CONNECTIONS);
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// A private in-memory database for tests. SQLite gives every
    /// connection its own memory database, so the pool is pinned to one.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(":memory:"),
            max_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
        }
    }
}

/// Pool handle. Cloning shares the pool.
///
/// Repositories borrow a clone of the pool; each of their methods takes
/// the acting account explicitly.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the pool and applies pending migrations.
    ///
    /// SQLite runs in WAL mode with `synchronous = NORMAL` and foreign
    /// keys enforced.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            max_connections = config.max_connections,
            timeout_secs = config.connect_timeout.as_secs(),
            "Opening database"
        );

        let connect_url = format!("sqlite://{}?mode=rwc", config.database_path.display());
        let connect_options = SqliteConnectOptions::from_str(&connect_url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(MIN_CONNECTIONS.min(config.max_connections))
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;
        debug!("Pool created");

        migrations::run_migrations(&pool).await?;
        Ok(Database { pool })
    }

    /// Round-trips a trivial query.
    pub async fn ping(&self) -> DbResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn migration_status(&self) -> DbResult<MigrationStatus> {
        migrations::migration_status(&self.pool).await
    }

    /// Raw pool, for queries no repository covers.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn stock(&self) -> StockRepository {
        StockRepository::new(self.pool.clone())
    }

    /// Quotes and orders.
    pub fn orders(&self) -> OrderRepository {
        OrderRepository::new(self.pool.clone())
    }

    /// The atomic stock-to-order sale.
    pub fn sales(&self) -> SaleRepository {
        SaleRepository::new(self.pool.clone())
    }

    pub fn materials(&self) -> MaterialRepository {
        MaterialRepository::new(self.pool.clone())
    }

    pub fn pricing(&self) -> PricingRepository {
        PricingRepository::new(self.pool.clone())
    }

    /// Waits for in-flight statements, then closes every connection.
    /// Repository calls fail afterwards.
    pub async fn close(&self) {
        info!("Closing database");
        self.pool.close().await;
    }
}
