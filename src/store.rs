//! Connection pool construction, scoped sessions and shutdown.

use crate::error::AppError;
use crate::sql::Dialect;
use sqlx::any::{Any, AnyPoolOptions};
use sqlx::pool::PoolConnection;
use sqlx::{AnyConnection, AnyPool, Connection, Transaction};
use std::ops::{Deref, DerefMut};

/// Shared handle on the pool. Cheap to clone.
#[derive(Clone, Debug)]
pub struct Database {
    pool: AnyPool,
    dialect: Dialect,
}

impl Database {
    /// Build the pool for a normalised URL.
    ///
    /// In-memory SQLite keeps a single connection alive for the life of the pool, since every
    /// new connection would open an empty database.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, AppError> {
        let dialect = Dialect::from_url(url)?;
        sqlx::any::install_default_drivers();

        let options = if dialect == Dialect::Sqlite && url.contains(":memory:") {
            AnyPoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            AnyPoolOptions::new().max_connections(max_connections)
        };
        let pool = options.connect(url).await?;
        tracing::info!(dialect = ?dialect, "database pool ready");
        Ok(Database { pool, dialect })
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// Acquire one pooled connection for one unit of work.
    pub async fn session(&self) -> Result<Session, AppError> {
        let conn = self.pool.acquire().await?;
        Ok(Session {
            conn,
            dialect: self.dialect,
        })
    }

    /// Round-trip `SELECT 1`.
    pub async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Wait for checked-out connections and close the pool.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("database pool closed");
    }
}

/// A pooled connection bound to one request. Returned to the pool on drop.
pub struct Session {
    conn: PoolConnection<Any>,
    dialect: Dialect,
}

impl Session {
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub async fn begin(&mut self) -> Result<Transaction<'_, Any>, AppError> {
        Ok(self.conn.begin().await?)
    }
}

impl Deref for Session {
    type Target = AnyConnection;

    fn deref(&self) -> &AnyConnection {
        &self.conn
    }
}

impl DerefMut for Session {
    fn deref_mut(&mut self) -> &mut AnyConnection {
        &mut self.conn
    }
}
