//! End-to-end tests against a temporary SQLite database.
//!
//! SQLite is reached through the same pool, executor, and tool handler the
//! server uses for SQL Server, selected with `MSSQL_DRIVER=sqlite`.

use mssql_mcp_server::config::{DatabaseSettings, DriverKind};
use mssql_mcp_server::db::{DbPool, QueryBackend, QueryExecutor};
use mssql_mcp_server::error::WRITE_DENIED_MESSAGE;
use mssql_mcp_server::models::{CellValue, ExecutionMode, QueryOutcome};
use mssql_mcp_server::tools::SqlToolHandler;
use mssql_mcp_server::tools::format::format_outcome;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use std::sync::Arc;
use tempfile::TempDir;

/// Create a database file with fixture tables and return pool settings for it.
async fn setup_db(dir: &TempDir) -> DatabaseSettings {
    let path = dir.path().join("shop.db");
    let options = SqliteConnectOptions::new()
        .filename(&path)
        .create_if_missing(true);
    let pool = SqlitePool::connect_with(options).await.unwrap();

    for sql in [
        "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL, email TEXT)",
        "CREATE TABLE items (id INTEGER PRIMARY KEY, price REAL, payload BLOB)",
        "CREATE VIEW user_names AS SELECT name FROM users",
        "INSERT INTO users (id, name, email) VALUES (1, 'Alice', 'alice@example.com')",
        "INSERT INTO users (id, name, email) VALUES (2, 'Bob', NULL)",
        "INSERT INTO items (id, price, payload) VALUES (1, 2.5, X'68656C6C6F')",
        "INSERT INTO items (id, price, payload) VALUES (2, NULL, X'636166E9')",
    ] {
        sqlx::query(sql).execute(&pool).await.unwrap();
    }
    pool.close().await;

    DatabaseSettings::new(
        DriverKind::Sqlite,
        "",
        "",
        path.to_string_lossy().into_owned(),
    )
}

async fn setup_handler(dir: &TempDir) -> SqlToolHandler<DbPool> {
    let settings = setup_db(dir).await;
    let pool = DbPool::connect_lazy(&settings).unwrap();
    SqlToolHandler::new(Arc::new(pool), QueryExecutor::new(), "shop")
}

#[tokio::test]
async fn test_select_with_null() {
    let dir = TempDir::new().unwrap();
    let handler = setup_handler(&dir).await;

    let response = handler
        .execute_sql("SELECT id, name, email FROM users ORDER BY id")
        .await;
    assert!(!response.is_error, "{}", response.text);
    assert_eq!(
        response.text,
        "id,name,email\n1,Alice,alice@example.com\n2,Bob,\n"
    );
}

#[tokio::test]
async fn test_binary_and_float_values() {
    let dir = TempDir::new().unwrap();
    let handler = setup_handler(&dir).await;

    let response = handler
        .execute_sql("SELECT id, price, payload FROM items ORDER BY id")
        .await;
    assert!(!response.is_error, "{}", response.text);
    assert_eq!(response.text, "id,price,payload\n1,2.5,hello\n2,,caf\u{FFFD}\n");
}

#[tokio::test]
async fn test_empty_result() {
    let dir = TempDir::new().unwrap();
    let handler = setup_handler(&dir).await;

    let response = handler
        .execute_sql("SELECT * FROM users WHERE id = 42")
        .await;
    assert!(!response.is_error);
    assert_eq!(response.text, "No results found");
}

#[tokio::test]
async fn test_show_tables_lists_base_tables_only() {
    let dir = TempDir::new().unwrap();
    let handler = setup_handler(&dir).await;

    let response = handler.execute_sql("SHOW TABLES").await;
    assert!(!response.is_error, "{}", response.text);
    assert_eq!(response.text, "Tables_in_shop\nitems\nusers\n");
}

#[tokio::test]
async fn test_write_is_denied_and_not_applied() {
    let dir = TempDir::new().unwrap();
    let handler = setup_handler(&dir).await;

    let response = handler
        .execute_sql("INSERT INTO users (id, name) VALUES (3, 'Eve')")
        .await;
    assert!(response.is_error);
    assert_eq!(response.text, WRITE_DENIED_MESSAGE);

    let response = handler.execute_sql("SELECT COUNT(*) AS n FROM users").await;
    assert_eq!(response.text, "n\n2\n");
}

#[tokio::test]
async fn test_database_error_is_reported_verbatim() {
    let dir = TempDir::new().unwrap();
    let handler = setup_handler(&dir).await;

    let response = handler.execute_sql("SELECT * FROM missing").await;
    assert!(response.is_error);
    assert_eq!(
        response.text,
        "Error executing query: no such table: missing"
    );
}

#[tokio::test]
async fn test_missing_database_file_is_error_not_panic() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.db");
    let settings = DatabaseSettings::new(
        DriverKind::Sqlite,
        "",
        "",
        path.to_string_lossy().into_owned(),
    );
    let pool = DbPool::connect_lazy(&settings).unwrap();
    let handler = SqlToolHandler::new(Arc::new(pool), QueryExecutor::new(), "absent");

    let response = handler.execute_sql("SELECT 1").await;
    assert!(response.is_error);
    assert!(response.text.starts_with("Error executing query: "));
    assert!(!path.exists());
}

#[tokio::test]
async fn test_effect_only_reports_rows_affected() {
    let dir = TempDir::new().unwrap();
    let settings = setup_db(&dir).await;
    let pool = DbPool::connect_lazy(&settings).unwrap();
    let executor = QueryExecutor::new();

    let outcome = executor
        .execute(
            &pool,
            "UPDATE users SET email = 'x@example.com'",
            ExecutionMode::EffectOnly,
        )
        .await
        .unwrap();
    assert_eq!(
        format_outcome(&outcome).unwrap(),
        "Query executed successfully. Rows affected: 2"
    );

    let outcome = executor
        .execute(&pool, "SELECT email FROM users WHERE id = 2", ExecutionMode::ReadFetch)
        .await
        .unwrap();
    match outcome {
        QueryOutcome::Table(result) => {
            assert_eq!(
                result.value(0, "EMAIL"),
                Some(&CellValue::text("x@example.com"))
            );
        }
        other => panic!("expected table, got {other:?}"),
    }

    assert_eq!(pool.name(), "sqlite");
    pool.close().await;
}
