//! MCP service implementation using rmcp.
//!
//! This module defines the SqlService struct exposing the `execute_sql`
//! tool via the MCP protocol using the rmcp framework's macros.

use crate::db::DbPool;
use crate::tools::sql::{ExecuteSqlInput, SqlToolHandler};
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{CallToolResult, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};
use std::sync::Arc;

/// Handler shared by every session.
pub type SharedHandler = Arc<SqlToolHandler<DbPool>>;

#[derive(Clone)]
pub struct SqlService {
    /// Shared tool handler owning the connection pool
    handler: SharedHandler,
    tool_router: ToolRouter<Self>,
}

impl SqlService {
    /// Create a new SqlService instance.
    pub fn new(handler: SharedHandler) -> Self {
        Self {
            handler,
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_router]
impl SqlService {
    #[tool(
        description = "Execute a read-only SQL query on the MSSQL server. Write operations (CREATE, ALTER, DROP, INSERT, UPDATE, DELETE, etc.) are not permitted."
    )]
    async fn execute_sql(
        &self,
        Parameters(input): Parameters<ExecuteSqlInput>,
    ) -> Result<CallToolResult, McpError> {
        Ok(self.handler.execute_sql(input.query_text()).await.into())
    }
}

#[tool_handler]
impl ServerHandler for SqlService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "mssql-mcp-server".to_owned(),
                title: Some("MSSQL MCP Server".to_owned()),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Read-only SQL access to a single database.\n\
                \n\
                Use `execute_sql` with a `query` argument. Results come back as comma-separated \
                lines: a header of column names, then one line per row (NULL is empty).\n\
                `SHOW TABLES` lists the base tables of the database.\n\
                Statements containing CREATE, ALTER, DROP, INSERT, UPDATE, DELETE, TRUNCATE, \
                MERGE, UPSERT, GRANT, REVOKE, EXEC or EXECUTE are rejected."
                    .to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DatabaseSettings, DriverKind};
    use crate::db::QueryExecutor;

    fn create_test_service() -> SqlService {
        let settings = DatabaseSettings::new(DriverKind::Sqlite, "", "", "unused.db");
        let pool = DbPool::connect_lazy(&settings).unwrap();
        let handler = SqlToolHandler::new(Arc::new(pool), QueryExecutor::new(), "unused");
        SqlService::new(Arc::new(handler))
    }

    #[tokio::test]
    async fn test_server_info() {
        let service = create_test_service();
        let info = service.get_info();
        assert_eq!(info.server_info.name, "mssql-mcp-server");
        assert!(info.capabilities.tools.is_some());
    }

    #[tokio::test]
    async fn test_single_tool_registered() {
        let service = create_test_service();
        let tools = service.tool_router.list_all();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "execute_sql");
    }

    #[tokio::test]
    async fn test_missing_or_mistyped_query_is_tool_error() {
        let service = create_test_service();
        for arguments in [serde_json::json!({}), serde_json::json!({"query": 7})] {
            let input: ExecuteSqlInput = serde_json::from_value(arguments).unwrap();
            let result = service.execute_sql(Parameters(input)).await.unwrap();
            assert_eq!(result.is_error, Some(true));
            let text = result.content[0].as_text().unwrap().text.clone();
            assert_eq!(text, "Query is required");
        }
    }

    #[tokio::test]
    async fn test_query_argument_is_required_string() {
        let service = create_test_service();
        let tools = service.tool_router.list_all();
        let schema = serde_json::Value::Object((*tools[0].input_schema).clone());
        assert_eq!(schema["properties"]["query"]["type"], "string");
        assert_eq!(schema["required"][0], "query");
    }
}
