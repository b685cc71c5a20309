//! Database abstraction layer.
//!
//! This module provides database access functionality:
//! - The `QueryBackend` driver seam
//! - SQL Server (tiberius + bb8) and sqlx-backed pools
//! - Query execution with deadlines
//! - Driver value decoding

pub mod backend;
pub mod executor;
pub mod mssql;
pub mod pool;
pub mod sqlx_backend;
pub mod types;

pub use backend::{LIST_TABLES_SQL, QueryBackend};
pub use executor::QueryExecutor;
pub use mssql::MssqlBackend;
pub use pool::DbPool;
pub use sqlx_backend::{SqlxBackend, SqlxPool};
