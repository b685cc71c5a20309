//! PostgreSQL, MySQL and SQLite backends built on sqlx.
//!
//! Each database keeps its own pool type (no AnyPool) so every native type
//! decodes. The submodules are deliberately parallel.

use crate::config::{DatabaseSettings, DriverKind};
use crate::db::backend::QueryBackend;
use crate::db::types::RowToCells;
use crate::error::{DbError, DbResult};
use crate::models::{EffectResult, TabularResult};
use sqlx::{MySqlPool, PgPool, SqlitePool};
use tracing::{debug, info};

/// Database-specific sqlx pool.
#[derive(Debug, Clone)]
pub enum SqlxPool {
    MySql(MySqlPool),
    Postgres(PgPool),
    SQLite(SqlitePool),
}

/// sqlx-backed implementation of [`QueryBackend`].
#[derive(Debug, Clone)]
pub struct SqlxBackend {
    pool: SqlxPool,
}

impl SqlxBackend {
    /// Wrap an existing pool.
    pub fn new(pool: SqlxPool) -> Self {
        Self { pool }
    }

    /// Build a lazily-connecting pool for the configured driver.
    pub fn connect_lazy(settings: &DatabaseSettings) -> DbResult<Self> {
        let pool = match settings.driver {
            DriverKind::Postgres => SqlxPool::Postgres(postgres::connect_lazy(settings)?),
            DriverKind::MySql => SqlxPool::MySql(mysql::connect_lazy(settings)?),
            DriverKind::Sqlite => SqlxPool::SQLite(sqlite::connect_lazy(settings)),
            DriverKind::SqlServer => {
                return Err(DbError::configuration(
                    "sqlserver is not served by the sqlx backend",
                ));
            }
        };

        info!(
            driver = %settings.driver,
            max_open = settings.pool.max_open,
            "Created connection pool"
        );
        Ok(Self { pool })
    }

    pub async fn close(&self) {
        match &self.pool {
            SqlxPool::MySql(p) => p.close().await,
            SqlxPool::Postgres(p) => p.close().await,
            SqlxPool::SQLite(p) => p.close().await,
        }
    }
}

impl QueryBackend for SqlxBackend {
    async fn fetch(&self, sql: &str) -> DbResult<TabularResult> {
        use sqlx::Executor;

        match &self.pool {
            SqlxPool::MySql(p) => process_rows(p.fetch_all(sql).await?),
            SqlxPool::Postgres(p) => process_rows(p.fetch_all(sql).await?),
            SqlxPool::SQLite(p) => process_rows(p.fetch_all(sql).await?),
        }
    }

    async fn execute(&self, sql: &str) -> DbResult<EffectResult> {
        use sqlx::Executor;

        let rows_affected = match &self.pool {
            SqlxPool::MySql(p) => p.execute(sql).await?.rows_affected(),
            SqlxPool::Postgres(p) => p.execute(sql).await?.rows_affected(),
            SqlxPool::SQLite(p) => p.execute(sql).await?.rows_affected(),
        };
        Ok(EffectResult { rows_affected })
    }

    fn list_tables_sql(&self) -> &'static str {
        match &self.pool {
            SqlxPool::MySql(_) => mysql::LIST_TABLES_SQL,
            SqlxPool::Postgres(_) => postgres::LIST_TABLES_SQL,
            SqlxPool::SQLite(_) => sqlite::LIST_TABLES_SQL,
        }
    }

    fn name(&self) -> &'static str {
        match &self.pool {
            SqlxPool::MySql(_) => "mysql",
            SqlxPool::Postgres(_) => "postgres",
            SqlxPool::SQLite(_) => "sqlite",
        }
    }
}

/// Decode fetched rows; column names come from the first row, so an empty
/// result has no columns.
fn process_rows<R: RowToCells>(rows: Vec<R>) -> DbResult<TabularResult> {
    let columns = rows
        .first()
        .map(RowToCells::column_names)
        .unwrap_or_default();
    let rows = rows
        .iter()
        .map(RowToCells::to_cells)
        .collect::<DbResult<Vec<_>>>()?;

    debug!(columns = columns.len(), rows = rows.len(), "Fetched rows");
    Ok(TabularResult::new(columns, rows))
}

// =============================================================================
// Database-Specific Connection Setup
// =============================================================================

mod postgres {
    use super::*;
    use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

    pub const LIST_TABLES_SQL: &str = "SELECT table_name::text AS \"TABLE_NAME\" FROM information_schema.tables WHERE table_type = 'BASE TABLE' AND table_schema NOT IN ('pg_catalog', 'information_schema')";

    pub fn connect_lazy(settings: &DatabaseSettings) -> DbResult<PgPool> {
        let host = settings.host_spec()?;
        let mut options = PgConnectOptions::new()
            .host(&host.host)
            .username(&settings.user)
            .password(&settings.password)
            .database(&settings.database);
        if let Some(port) = host.port {
            options = options.port(port);
        }

        Ok(PgPoolOptions::new()
            .max_connections(settings.pool.max_open)
            .max_lifetime(settings.pool.max_lifetime_limit())
            .idle_timeout(settings.pool.idle_timeout_limit())
            .acquire_timeout(settings.query_timeout)
            .connect_lazy_with(options))
    }
}

mod mysql {
    use super::*;
    use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};

    pub const LIST_TABLES_SQL: &str = "SELECT TABLE_NAME FROM INFORMATION_SCHEMA.TABLES WHERE TABLE_TYPE = 'BASE TABLE' AND TABLE_SCHEMA = DATABASE()";

    pub fn connect_lazy(settings: &DatabaseSettings) -> DbResult<MySqlPool> {
        let host = settings.host_spec()?;
        let mut options = MySqlConnectOptions::new()
            .host(&host.host)
            .username(&settings.user)
            .password(&settings.password)
            .database(&settings.database);
        if let Some(port) = host.port {
            options = options.port(port);
        }

        Ok(MySqlPoolOptions::new()
            .max_connections(settings.pool.max_open)
            .max_lifetime(settings.pool.max_lifetime_limit())
            .idle_timeout(settings.pool.idle_timeout_limit())
            .acquire_timeout(settings.query_timeout)
            .connect_lazy_with(options))
    }
}

mod sqlite {
    use super::*;
    use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

    pub const LIST_TABLES_SQL: &str = "SELECT name AS TABLE_NAME FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name";

    /// The database setting is the file path; host and credentials are unused.
    pub fn connect_lazy(settings: &DatabaseSettings) -> SqlitePool {
        let options = SqliteConnectOptions::new().filename(&settings.database);

        SqlitePoolOptions::new()
            .max_connections(settings.pool.max_open)
            .max_lifetime(settings.pool.max_lifetime_limit())
            .idle_timeout(settings.pool.idle_timeout_limit())
            .acquire_timeout(settings.query_timeout)
            .connect_lazy_with(options)
    }
}
