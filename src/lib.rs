//! MSSQL MCP Server Library
//!
//! This library provides an MCP (Model Context Protocol) tool that lets AI
//! assistants run read-only SQL against a Microsoft SQL Server database.

pub mod config;
pub mod db;
pub mod error;
pub mod mcp;
pub mod models;
pub mod tools;
pub mod transport;

pub use config::Config;
pub use error::DbError;
pub use mcp::SqlService;
