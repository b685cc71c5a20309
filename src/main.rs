//! MSSQL MCP Server - Main entry point.
//!
//! This server exposes a single `execute_sql` MCP tool that runs read-only
//! queries against Microsoft SQL Server.

use clap::Parser;
use mssql_mcp_server::config::{Config, TransportMode};
use mssql_mcp_server::db::{DbPool, QueryExecutor};
use mssql_mcp_server::tools::SqlToolHandler;
use mssql_mcp_server::transport::{HttpTransport, StdioTransport, Transport};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr; stdout carries the MCP protocol under stdio transport.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse configuration from command line and environment
    let config = Config::parse();

    init_tracing(&config);

    let settings = match config.database_settings() {
        Ok(settings) => settings,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            eprintln!("Error: {}", e);
            eprintln!();
            eprintln!("Required environment variables: MSSQL_USER, MSSQL_PASSWORD, MSSQL_DATABASE");
            eprintln!("Optional: MSSQL_HOST (default: localhost), MSSQL_QUERY_TIMEOUT (seconds)");
            std::process::exit(1);
        }
    };

    info!(
        transport = %config.transport,
        driver = %settings.driver,
        "Starting MSSQL MCP Server v{}",
        env!("CARGO_PKG_VERSION")
    );
    info!(
        database = %settings.summary(),
        timeout_secs = settings.query_timeout.as_secs(),
        "Database configuration"
    );

    // Connections are opened on first use
    let pool = DbPool::connect_lazy(&settings)?;
    let handler = Arc::new(SqlToolHandler::new(
        Arc::new(pool),
        QueryExecutor::with_timeout(settings.query_timeout),
        settings.database.clone(),
    ));

    let result = match config.transport {
        TransportMode::Stdio => {
            info!("Using stdio transport");
            StdioTransport::new(handler).run().await
        }
        TransportMode::Http => {
            info!(
                host = %config.http_host,
                port = config.http_port,
                endpoint = %config.mcp_endpoint,
                "Using HTTP transport"
            );
            HttpTransport::new(
                handler,
                &config.http_host,
                config.http_port,
                &config.mcp_endpoint,
            )
            .run()
            .await
        }
    };

    if let Err(e) = result {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    info!("Server shutdown complete");
    Ok(())
}
