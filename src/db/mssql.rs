//! SQL Server backend built on tiberius with a bb8 connection pool.
//!
//! The pool is created lazily: the server starts even when the database is
//! unreachable, and connection failures surface per request.

use crate::config::DatabaseSettings;
use crate::db::backend::QueryBackend;
use crate::db::types::decode_mssql_row;
use crate::error::{DbError, DbResult};
use crate::models::{EffectResult, TabularResult};
use bb8_tiberius::ConnectionManager;
use futures_util::TryStreamExt;
use tiberius::QueryItem;
use tracing::{debug, info};

pub type MssqlPool = bb8::Pool<ConnectionManager>;

/// SQL Server backend.
#[derive(Clone)]
pub struct MssqlBackend {
    pool: MssqlPool,
}

impl std::fmt::Debug for MssqlBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.pool.state();
        f.debug_struct("MssqlBackend")
            .field("connections", &state.connections)
            .field("idle_connections", &state.idle_connections)
            .finish()
    }
}

impl MssqlBackend {
    /// Build the pool from validated settings without opening a connection.
    ///
    /// Connection acquisition is bounded by the query timeout, matching the
    /// deadline the executor applies around it.
    pub fn connect_lazy(settings: &DatabaseSettings) -> DbResult<Self> {
        let config = tiberius::Config::from_ado_string(&settings.ado_connection_string())
            .map_err(|e| DbError::configuration(format!("invalid connection settings: {}", e)))?;
        let manager = ConnectionManager::new(config);

        let pool = bb8::Pool::builder()
            .max_size(settings.pool.max_open)
            .max_lifetime(settings.pool.max_lifetime_limit())
            .idle_timeout(settings.pool.idle_timeout_limit())
            .connection_timeout(settings.query_timeout)
            .build_unchecked(manager);

        info!(
            max_open = settings.pool.max_open,
            "Created SQL Server connection pool"
        );
        Ok(Self { pool })
    }

    /// Connections currently held by the pool, idle or in use.
    pub fn connection_count(&self) -> u32 {
        self.pool.state().connections
    }
}

impl QueryBackend for MssqlBackend {
    async fn fetch(&self, sql: &str) -> DbResult<TabularResult> {
        let mut conn = self.pool.get().await?;
        let mut stream = conn.simple_query(sql).await?;

        let mut columns: Option<Vec<String>> = None;
        let mut rows = Vec::new();

        // Only the first result set is returned; later ones are drained so
        // the connection goes back to the pool clean.
        while let Some(item) = stream.try_next().await? {
            match item {
                QueryItem::Metadata(meta) if meta.result_index() == 0 => {
                    columns = Some(meta.columns().iter().map(|c| c.name().to_string()).collect());
                }
                QueryItem::Row(row) if row.result_index() == 0 => {
                    let width = columns.as_ref().map_or(row.len(), Vec::len);
                    rows.push(decode_mssql_row(row, width)?);
                }
                _ => {}
            }
        }

        let columns = columns.unwrap_or_default();
        debug!(columns = columns.len(), rows = rows.len(), "Fetched rows");
        Ok(TabularResult::new(columns, rows))
    }

    async fn execute(&self, sql: &str) -> DbResult<EffectResult> {
        let mut conn = self.pool.get().await?;
        let result = conn.execute(sql, &[]).await?;
        Ok(EffectResult {
            rows_affected: result.total(),
        })
    }

    fn name(&self) -> &'static str {
        "sqlserver"
    }
}
