//! Connection pool selection.
//!
//! `DbPool` is the backend the server runs with: the SQL Server pool by
//! default, or one of the sqlx pools when `MSSQL_DRIVER` names another engine.

use crate::config::{DatabaseSettings, DriverKind};
use crate::db::backend::QueryBackend;
use crate::db::mssql::MssqlBackend;
use crate::db::sqlx_backend::SqlxBackend;
use crate::error::DbResult;
use crate::models::{EffectResult, TabularResult};
use tracing::info;

#[derive(Debug, Clone)]
pub enum DbPool {
    SqlServer(MssqlBackend),
    Sqlx(SqlxBackend),
}

impl DbPool {
    /// Create the pool for the configured driver. No connection is opened
    /// until the first query.
    pub fn connect_lazy(settings: &DatabaseSettings) -> DbResult<Self> {
        settings.validate()?;
        match settings.driver {
            DriverKind::SqlServer => MssqlBackend::connect_lazy(settings).map(Self::SqlServer),
            _ => SqlxBackend::connect_lazy(settings).map(Self::Sqlx),
        }
    }

    /// Close the connection pool.
    ///
    /// bb8 has no close operation; SQL Server connections are released when
    /// the last handle to the pool is dropped at process exit.
    pub async fn close(&self) {
        match self {
            DbPool::SqlServer(backend) => {
                info!(
                    backend = self.name(),
                    open_connections = backend.connection_count(),
                    "Connection pool released on exit"
                );
            }
            DbPool::Sqlx(backend) => {
                backend.close().await;
                info!(backend = self.name(), "Connection pool closed");
            }
        }
    }
}

impl QueryBackend for DbPool {
    async fn fetch(&self, sql: &str) -> DbResult<TabularResult> {
        match self {
            DbPool::SqlServer(b) => b.fetch(sql).await,
            DbPool::Sqlx(b) => b.fetch(sql).await,
        }
    }

    async fn execute(&self, sql: &str) -> DbResult<EffectResult> {
        match self {
            DbPool::SqlServer(b) => b.execute(sql).await,
            DbPool::Sqlx(b) => b.execute(sql).await,
        }
    }

    fn list_tables_sql(&self) -> &'static str {
        match self {
            DbPool::SqlServer(b) => b.list_tables_sql(),
            DbPool::Sqlx(b) => b.list_tables_sql(),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            DbPool::SqlServer(b) => b.name(),
            DbPool::Sqlx(b) => b.name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::backend::LIST_TABLES_SQL;

    #[tokio::test]
    async fn test_sqlserver_pool_is_lazy() {
        // Nothing listens here; creation must still succeed.
        let mut settings = DatabaseSettings::new(DriverKind::SqlServer, "sa", "pw", "master");
        settings.host = "127.0.0.1,1".to_string();
        let pool = DbPool::connect_lazy(&settings).unwrap();
        assert_eq!(pool.name(), "sqlserver");
        assert_eq!(pool.list_tables_sql(), LIST_TABLES_SQL);
        match &pool {
            DbPool::SqlServer(backend) => assert_eq!(backend.connection_count(), 0),
            other => panic!("expected sqlserver pool, got {other:?}"),
        }
        pool.close().await;
    }

    #[tokio::test]
    async fn test_zero_query_timeout_is_configuration_error() {
        let mut settings = DatabaseSettings::new(DriverKind::SqlServer, "sa", "pw", "master");
        settings.query_timeout = std::time::Duration::ZERO;
        let err = DbPool::connect_lazy(&settings).unwrap_err();
        assert!(matches!(err, crate::error::DbError::Configuration { .. }));
    }

    #[tokio::test]
    async fn test_zero_pool_durations_do_not_panic() {
        let mut settings = DatabaseSettings::new(DriverKind::SqlServer, "sa", "pw", "master");
        settings.host = "127.0.0.1,1".to_string();
        settings.pool.max_lifetime = std::time::Duration::ZERO;
        settings.pool.idle_timeout = std::time::Duration::ZERO;
        let pool = DbPool::connect_lazy(&settings).unwrap();
        assert_eq!(pool.name(), "sqlserver");
        pool.close().await;

        settings.driver = DriverKind::Sqlite;
        settings.database = "unused.db".to_string();
        let pool = DbPool::connect_lazy(&settings).unwrap();
        assert_eq!(pool.name(), "sqlite");
        pool.close().await;
    }

    #[tokio::test]
    async fn test_sqlite_driver_selects_sqlx() {
        let settings = DatabaseSettings::new(DriverKind::Sqlite, "", "", "unused.db");
        let pool = DbPool::connect_lazy(&settings).unwrap();
        assert!(matches!(pool, DbPool::Sqlx(_)));
        pool.close().await;
    }
}
