//! Query execution engine.
//!
//! The executor applies the query deadline around a [`QueryBackend`] call and
//! dispatches on [`ExecutionMode`]. The deadline covers connection
//! acquisition and execution; when it elapses the backend future is dropped,
//! which cancels the in-flight statement and releases the pooled connection.

use crate::db::backend::QueryBackend;
use crate::error::{DbError, DbResult};
use crate::models::{DEFAULT_QUERY_TIMEOUT_SECS, ExecutionMode, QueryOutcome};
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Query executor that handles database query execution.
#[derive(Debug, Clone, Copy)]
pub struct QueryExecutor {
    default_timeout: Duration,
}

impl QueryExecutor {
    /// Create a new query executor with the default timeout.
    pub fn new() -> Self {
        Self {
            default_timeout: Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS),
        }
    }

    /// Create a new query executor with a custom timeout.
    pub fn with_timeout(default_timeout: Duration) -> Self {
        Self { default_timeout }
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Execute a statement with the configured timeout.
    pub async fn execute<B: QueryBackend>(
        &self,
        backend: &B,
        sql: &str,
        mode: ExecutionMode,
    ) -> DbResult<QueryOutcome> {
        self.execute_with_timeout(backend, sql, mode, self.default_timeout)
            .await
    }

    /// Execute a statement under an explicit deadline.
    pub async fn execute_with_timeout<B: QueryBackend>(
        &self,
        backend: &B,
        sql: &str,
        mode: ExecutionMode,
        query_timeout: Duration,
    ) -> DbResult<QueryOutcome> {
        let start = Instant::now();

        debug!(
            sql = %sql,
            mode = %mode,
            backend = backend.name(),
            timeout_secs = query_timeout.as_secs(),
            "Executing query"
        );

        let result = match mode {
            ExecutionMode::ReadFetch => timeout(query_timeout, backend.fetch(sql))
                .await
                .map(|r| r.map(QueryOutcome::from)),
            ExecutionMode::EffectOnly => timeout(query_timeout, backend.execute(sql))
                .await
                .map(|r| r.map(QueryOutcome::from)),
        };

        let execution_time_ms = start.elapsed().as_millis() as u64;
        match result {
            Ok(Ok(outcome)) => {
                match &outcome {
                    QueryOutcome::Table(t) => {
                        info!(rows = t.row_count(), execution_time_ms, "Query completed")
                    }
                    QueryOutcome::Effect(e) => info!(
                        rows_affected = e.rows_affected,
                        execution_time_ms, "Statement completed"
                    ),
                }
                Ok(outcome)
            }
            Ok(Err(e)) => Err(e),
            Err(_) => {
                warn!(
                    timeout_secs = query_timeout.as_secs(),
                    "Query execution timed out"
                );
                Err(DbError::timeout(query_timeout.as_secs()))
            }
        }
    }
}

impl Default for QueryExecutor {
    fn default() -> Self {
        Self::new()
    }
}
