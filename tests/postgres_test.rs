//! Integration tests for PostgreSQL value decoding.
//!
//! Requires a running PostgreSQL server. Set TEST_POSTGRES_URL to run them.

use mssql_mcp_server::db::{QueryExecutor, SqlxBackend, SqlxPool};
use mssql_mcp_server::tools::SqlToolHandler;
use sqlx::PgPool;
use std::sync::Arc;

async fn setup_handler() -> Option<SqlToolHandler<SqlxBackend>> {
    let url = match std::env::var("TEST_POSTGRES_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping test: TEST_POSTGRES_URL not set");
            return None;
        }
    };
    let pool = PgPool::connect(&url).await.unwrap();
    Some(SqlToolHandler::new(
        Arc::new(SqlxBackend::new(SqlxPool::Postgres(pool))),
        QueryExecutor::new(),
        "test",
    ))
}

#[tokio::test]
async fn test_postgres_numeric_uuid_and_json() {
    let Some(handler) = setup_handler().await else {
        return;
    };

    let response = handler
        .execute_sql(
            "SELECT 1.50::numeric AS amount, \
             '6f9619ff-8b86-d011-b42d-00c04fc964ff'::uuid AS id, \
             '{\"a\": 1}'::jsonb AS doc",
        )
        .await;
    assert!(!response.is_error, "{}", response.text);
    assert_eq!(
        response.text,
        "amount,id,doc\n1.50,6f9619ff-8b86-d011-b42d-00c04fc964ff,{\"a\":1}\n"
    );
}

#[tokio::test]
async fn test_postgres_aggregate_average() {
    let Some(handler) = setup_handler().await else {
        return;
    };

    let response = handler
        .execute_sql("SELECT avg(x) AS mean FROM (VALUES (1), (2)) AS t(x)")
        .await;
    assert!(!response.is_error, "{}", response.text);
    assert!(response.text.starts_with("mean\n1.5"), "{}", response.text);
}
