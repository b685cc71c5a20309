//! Data models for the MSSQL MCP Server.
//!
//! This module re-exports all model types used throughout the application.

pub mod query;

pub use query::{
    CellValue, DEFAULT_QUERY_TIMEOUT_SECS, EffectResult, ExecutionMode, Number, QueryOutcome, Row,
    TabularResult,
};
