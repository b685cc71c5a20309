//! Configuration handling for the MSSQL MCP Server.
//!
//! Configuration comes from CLI arguments and environment variables. It is
//! parsed once in `main`, validated into [`DatabaseSettings`], and passed to
//! every component from there; nothing else reads the environment.

use crate::error::{DbError, DbResult};
use crate::models::DEFAULT_QUERY_TIMEOUT_SECS;
use clap::{Parser, ValueEnum};
use std::fmt;
use std::time::Duration;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_HTTP_HOST: &str = "127.0.0.1";
pub const DEFAULT_HTTP_PORT: u16 = 8080;
pub const DEFAULT_MCP_ENDPOINT: &str = "/";

// Pool configuration defaults
pub const DEFAULT_MAX_OPEN_CONNS: u32 = 10;
pub const DEFAULT_CONN_MAX_LIFETIME_SECS: u64 = 180;
pub const DEFAULT_CONN_MAX_IDLE_SECS: u64 = 60;

const MISSING_CREDENTIALS: &str =
    "missing required database configuration (MSSQL_USER, MSSQL_PASSWORD, MSSQL_DATABASE)";

/// Database driver backing the tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum DriverKind {
    /// Microsoft SQL Server over TDS
    #[default]
    #[value(name = "sqlserver", alias = "mssql")]
    SqlServer,
    /// PostgreSQL
    #[value(name = "postgres", alias = "postgresql")]
    Postgres,
    /// MySQL / MariaDB
    #[value(name = "mysql")]
    MySql,
    /// SQLite; the database setting is the file path
    #[value(name = "sqlite")]
    Sqlite,
}

impl fmt::Display for DriverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SqlServer => write!(f, "sqlserver"),
            Self::Postgres => write!(f, "postgres"),
            Self::MySql => write!(f, "mysql"),
            Self::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// Transport mode for the MCP server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TransportMode {
    /// Standard input/output (for CLI integration)
    #[default]
    Stdio,
    /// Streamable HTTP (for web clients)
    Http,
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdio => write!(f, "stdio"),
            Self::Http => write!(f, "http"),
        }
    }
}

/// Accepts any integer; unparsable values fall back to the default timeout.
fn parse_timeout_secs(value: &str) -> Result<u64, String> {
    Ok(value
        .trim()
        .parse::<u64>()
        .unwrap_or(DEFAULT_QUERY_TIMEOUT_SECS))
}

/// Configuration for the MSSQL MCP Server.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "mssql-mcp-server",
    about = "MCP server exposing a read-only SQL tool for Microsoft SQL Server",
    version
)]
pub struct Config {
    /// Database driver
    #[arg(long, value_enum, default_value = "sqlserver", env = "MSSQL_DRIVER")]
    pub driver: DriverKind,

    /// Database server host. SQL Server also accepts "host,port" and "host\instance".
    #[arg(long, default_value = DEFAULT_HOST, env = "MSSQL_HOST")]
    pub host: String,

    /// Login name (required)
    #[arg(long, env = "MSSQL_USER")]
    pub user: Option<String>,

    /// Login password (required)
    #[arg(long, env = "MSSQL_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Database name, or file path for sqlite (required)
    #[arg(long, env = "MSSQL_DATABASE")]
    pub database: Option<String>,

    /// Query timeout in seconds
    #[arg(
        long,
        default_value_t = DEFAULT_QUERY_TIMEOUT_SECS,
        env = "MSSQL_QUERY_TIMEOUT",
        value_parser = parse_timeout_secs
    )]
    pub query_timeout: u64,

    /// Maximum open connections in the pool
    #[arg(long, default_value_t = DEFAULT_MAX_OPEN_CONNS, env = "MSSQL_MAX_OPEN_CONNS")]
    pub max_open_conns: u32,

    /// Maximum lifetime of a pooled connection in seconds
    #[arg(
        long,
        default_value_t = DEFAULT_CONN_MAX_LIFETIME_SECS,
        env = "MSSQL_CONN_MAX_LIFETIME"
    )]
    pub conn_max_lifetime: u64,

    /// Idle time in seconds after which a pooled connection is closed
    #[arg(
        long,
        default_value_t = DEFAULT_CONN_MAX_IDLE_SECS,
        env = "MSSQL_CONN_MAX_IDLE_TIME"
    )]
    pub conn_max_idle_time: u64,

    /// Transport mode (stdio or http)
    #[arg(
        short,
        long,
        value_enum,
        default_value = "stdio",
        env = "MCP_TRANSPORT"
    )]
    pub transport: TransportMode,

    /// HTTP host to bind to (only used with http transport)
    #[arg(long, default_value = DEFAULT_HTTP_HOST, env = "MCP_HTTP_HOST")]
    pub http_host: String,

    /// HTTP port to bind to (only used with http transport)
    #[arg(long, default_value_t = DEFAULT_HTTP_PORT, env = "MCP_HTTP_PORT")]
    pub http_port: u16,

    /// MCP endpoint path (only used with http transport)
    #[arg(long, default_value = DEFAULT_MCP_ENDPOINT, env = "MCP_ENDPOINT")]
    pub mcp_endpoint: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "MCP_LOG_LEVEL")]
    pub log_level: String,

    /// Enable JSON logging format
    #[arg(long, env = "MCP_JSON_LOGS")]
    pub json_logs: bool,
}

impl Config {
    /// Validate the database part of the configuration.
    ///
    /// Empty strings count as missing, matching how unset variables behave.
    pub fn database_settings(&self) -> DbResult<DatabaseSettings> {
        let required = |v: &Option<String>| v.as_deref().filter(|s| !s.is_empty()).map(String::from);

        let (Some(user), Some(password), Some(database)) = (
            required(&self.user),
            required(&self.password),
            required(&self.database),
        ) else {
            return Err(DbError::configuration(MISSING_CREDENTIALS));
        };

        let pool = PoolSettings {
            max_open: self.max_open_conns,
            max_lifetime: Duration::from_secs(self.conn_max_lifetime),
            idle_timeout: Duration::from_secs(self.conn_max_idle_time),
        };
        let settings = DatabaseSettings {
            driver: self.driver,
            host: self.host.clone(),
            user,
            password,
            database,
            query_timeout: Duration::from_secs(self.query_timeout),
            pool,
        };
        settings.validate()?;
        Ok(settings)
    }
}

/// Connection pool limits.
///
/// A zero lifetime or idle timeout means connections are never retired for
/// that reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSettings {
    pub max_open: u32,
    pub max_lifetime: Duration,
    pub idle_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_open: DEFAULT_MAX_OPEN_CONNS,
            max_lifetime: Duration::from_secs(DEFAULT_CONN_MAX_LIFETIME_SECS),
            idle_timeout: Duration::from_secs(DEFAULT_CONN_MAX_IDLE_SECS),
        }
    }
}

impl PoolSettings {
    pub fn validate(&self) -> DbResult<()> {
        if self.max_open == 0 {
            return Err(DbError::configuration(
                "max open connections must be greater than 0",
            ));
        }
        Ok(())
    }

    /// Lifetime limit for pool builders; `None` when disabled.
    pub fn max_lifetime_limit(&self) -> Option<Duration> {
        non_zero(self.max_lifetime)
    }

    /// Idle limit for pool builders; `None` when disabled.
    pub fn idle_timeout_limit(&self) -> Option<Duration> {
        non_zero(self.idle_timeout)
    }
}

fn non_zero(d: Duration) -> Option<Duration> {
    (!d.is_zero()).then_some(d)
}

/// `MSSQL_HOST` split into host and optional port, for the sqlx-backed drivers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostSpec {
    pub host: String,
    pub port: Option<u16>,
}

impl HostSpec {
    pub fn parse(value: &str) -> DbResult<Self> {
        let value = value.trim();
        match value.rsplit_once([',', ':']) {
            Some((host, port)) => {
                let port = port.trim().parse::<u16>().map_err(|_| {
                    DbError::configuration(format!("invalid port in MSSQL_HOST: {}", value))
                })?;
                Ok(Self {
                    host: host.trim().to_string(),
                    port: Some(port),
                })
            }
            None => Ok(Self {
                host: value.to_string(),
                port: None,
            }),
        }
    }
}

/// Validated database configuration, created once at startup.
#[derive(Clone)]
pub struct DatabaseSettings {
    pub driver: DriverKind,
    pub host: String,
    pub user: String,
    pub password: String,
    pub database: String,
    pub query_timeout: Duration,
    pub pool: PoolSettings,
}

impl DatabaseSettings {
    /// Settings with default host, timeout and pool limits.
    pub fn new(
        driver: DriverKind,
        user: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            driver,
            host: DEFAULT_HOST.to_string(),
            user: user.into(),
            password: password.into(),
            database: database.into(),
            query_timeout: Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS),
            pool: PoolSettings::default(),
        }
    }

    /// Reject values the pool builders cannot accept.
    pub fn validate(&self) -> DbResult<()> {
        if self.query_timeout.is_zero() {
            return Err(DbError::configuration(
                "query timeout must be greater than 0 seconds",
            ));
        }
        self.pool.validate()
    }

    pub fn host_spec(&self) -> DbResult<HostSpec> {
        HostSpec::parse(&self.host)
    }

    /// ADO.NET style connection string for SQL Server.
    ///
    /// Values containing separators or quotes are double-quoted.
    pub fn ado_connection_string(&self) -> String {
        format!(
            "server={};user id={};password={};database={};encrypt=true;trustservercertificate=true",
            ado_quote(&self.host),
            ado_quote(&self.user),
            ado_quote(&self.password),
            ado_quote(&self.database),
        )
    }

    /// Loggable description without secrets.
    pub fn summary(&self) -> String {
        format!("{}/{} as {}", self.host, self.database, self.user)
    }
}

impl fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("driver", &self.driver)
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("query_timeout", &self.query_timeout)
            .field("pool", &self.pool)
            .finish()
    }
}

fn ado_quote(value: &str) -> String {
    if value.contains([';', '\'', '"']) || value.trim() != value {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
