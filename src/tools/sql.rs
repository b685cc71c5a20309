//! SQL execution tool.
//!
//! This module implements the `execute_sql` MCP tool. Each invocation is
//! classified, optionally rewritten (`SHOW TABLES`), executed, and formatted.
//! Every failure is turned into an error-flagged text response; nothing is
//! propagated to the transport.

use crate::db::{QueryBackend, QueryExecutor};
use crate::error::{DbError, DbResult};
use crate::models::{ExecutionMode, QueryOutcome, TabularResult};
use crate::tools::classifier::{is_show_tables, validate_readonly};
use crate::tools::format::{format_outcome, format_table_list};
use rmcp::model::{CallToolResult, Content};
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Longest query prefix written to logs for denied statements.
const LOG_QUERY_MAX_LEN: usize = 100;

/// Input for the execute_sql tool.
///
/// The schema advertises `query` as a required string, but any JSON value is
/// accepted so a missing or mistyped argument is answered by the tool itself.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct ExecuteSqlInput {
    /// The SQL query to execute (read-only operations only)
    #[schemars(with = "String")]
    pub query: Option<serde_json::Value>,
}

impl ExecuteSqlInput {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: Some(serde_json::Value::String(query.into())),
        }
    }

    /// The query text; empty when the argument is missing or not a string.
    pub fn query_text(&self) -> &str {
        match &self.query {
            Some(serde_json::Value::String(s)) => s,
            _ => "",
        }
    }
}

/// Text response with a success/failure flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResponse {
    pub text: String,
    pub is_error: bool,
}

impl ToolResponse {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }
}

impl From<ToolResponse> for CallToolResult {
    fn from(response: ToolResponse) -> Self {
        let content = vec![Content::text(response.text)];
        if response.is_error {
            CallToolResult::error(content)
        } else {
            CallToolResult::success(content)
        }
    }
}

/// Outcome of one invocation before it is rendered.
enum Invocation {
    ShowTables(TabularResult),
    Query(QueryOutcome),
}

/// Handler for the execute_sql tool.
pub struct SqlToolHandler<B> {
    backend: Arc<B>,
    executor: QueryExecutor,
    /// Database name used in the `Tables_in_{database}` header
    database: String,
}

impl<B: QueryBackend> SqlToolHandler<B> {
    pub fn new(backend: Arc<B>, executor: QueryExecutor, database: impl Into<String>) -> Self {
        Self {
            backend,
            executor,
            database: database.into(),
        }
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    /// Run one tool invocation to completion.
    pub async fn execute_sql(&self, query: &str) -> ToolResponse {
        if query.is_empty() {
            return ToolResponse::error("Query is required");
        }

        info!(query = %query, "Executing SQL query");

        match self.invoke(query).await {
            Ok(Invocation::ShowTables(result)) => {
                match format_table_list(&self.database, &result) {
                    Ok(text) => ToolResponse::success(text),
                    Err(e) => ToolResponse::error(format!("Error formatting results: {}", e)),
                }
            }
            Ok(Invocation::Query(outcome)) => match format_outcome(&outcome) {
                Ok(text) => ToolResponse::success(text),
                Err(e) => ToolResponse::error(format!("Error formatting results: {}", e)),
            },
            Err(e @ DbError::PolicyDenied) => {
                warn!(
                    query = %truncate_query(query, LOG_QUERY_MAX_LEN),
                    "Attempted write operation denied"
                );
                ToolResponse::error(e.to_string())
            }
            Err(e) => {
                error!(query = %query, error = %e, "Error executing SQL");
                ToolResponse::error(format!("Error executing query: {}", e))
            }
        }
    }

    /// Classify and execute, without rendering.
    async fn invoke(&self, query: &str) -> DbResult<Invocation> {
        validate_readonly(query)?;

        if is_show_tables(query) {
            let sql = self.backend.list_tables_sql();
            return match self
                .executor
                .execute(self.backend.as_ref(), sql, ExecutionMode::ReadFetch)
                .await?
            {
                QueryOutcome::Table(result) => Ok(Invocation::ShowTables(result)),
                QueryOutcome::Effect(_) => Err(DbError::format("unknown result format")),
            };
        }

        let outcome = self
            .executor
            .execute(self.backend.as_ref(), query, ExecutionMode::ReadFetch)
            .await?;
        Ok(Invocation::Query(outcome))
    }
}

/// Truncate on a character boundary, marking the cut with `...`.
fn truncate_query(query: &str, max_len: usize) -> String {
    match query.char_indices().nth(max_len) {
        Some((idx, _)) => format!("{}...", &query[..idx]),
        None => query.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_argument_is_lenient() {
        let parse = |v: serde_json::Value| serde_json::from_value::<ExecuteSqlInput>(v).unwrap();

        assert_eq!(parse(serde_json::json!({"query": "SELECT 1"})).query_text(), "SELECT 1");
        assert_eq!(parse(serde_json::json!({})).query_text(), "");
        assert_eq!(parse(serde_json::json!({"query": 42})).query_text(), "");
        assert_eq!(parse(serde_json::json!({"query": null})).query_text(), "");
        assert_eq!(ExecuteSqlInput::new("SHOW TABLES").query_text(), "SHOW TABLES");
    }

    #[test]
    fn test_truncate_query() {
        assert_eq!(truncate_query("short", 100), "short");
        assert_eq!(truncate_query("abcdef", 3), "abc...");
        assert_eq!(truncate_query("ééééé", 2), "éé...");
    }

    #[test]
    fn test_tool_response_into_call_tool_result() {
        let ok: CallToolResult = ToolResponse::success("a,b\n").into();
        assert_eq!(ok.is_error, Some(false));

        let err: CallToolResult = ToolResponse::error("nope").into();
        assert_eq!(err.is_error, Some(true));
    }
}
