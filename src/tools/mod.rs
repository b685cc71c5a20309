//! MCP tool implementations.
//!
//! This module contains the `execute_sql` tool and its building blocks:
//! - `classifier`: lexical read-only check and `SHOW TABLES` detection
//! - `format`: text rendering of query outcomes
//! - `sql`: the invocation handler tying classification, execution and
//!   formatting together

pub mod classifier;
pub mod format;
pub mod sql;

pub use classifier::{is_allowed, is_write_operation, validate_readonly};
pub use sql::{ExecuteSqlInput, SqlToolHandler, ToolResponse};
