//! Driver seam used by the executor.
//!
//! A backend owns its connection pool and knows how to run one statement in
//! each execution mode. Timeouts are applied by the caller; a backend future
//! dropped mid-flight must give its connection back (or discard it).

use crate::error::DbResult;
use crate::models::{EffectResult, TabularResult};
use std::future::Future;

/// Table listing used for `SHOW TABLES` on SQL Server and most other engines.
pub const LIST_TABLES_SQL: &str =
    "SELECT TABLE_NAME FROM INFORMATION_SCHEMA.TABLES WHERE TABLE_TYPE = 'BASE TABLE'";

pub trait QueryBackend: Send + Sync {
    /// Run a row-returning statement and decode every row of its first
    /// result set. Any decode or stream error fails the whole call.
    fn fetch(&self, sql: &str) -> impl Future<Output = DbResult<TabularResult>> + Send;

    /// Run a statement for its side effect and report affected rows.
    fn execute(&self, sql: &str) -> impl Future<Output = DbResult<EffectResult>> + Send;

    /// Statement producing a `TABLE_NAME` column of base tables.
    fn list_tables_sql(&self) -> &'static str {
        LIST_TABLES_SQL
    }

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}
