//! Error types for the MSSQL MCP Server.
//!
//! Every failure the tool can hit is one of the variants below. Per-request
//! variants are rendered as text by the invocation handler; only
//! `Configuration` (at startup) and `Internal` (transport) end the process.

use thiserror::Error;

/// Fixed message returned when the statement classifier rejects a query.
pub const WRITE_DENIED_MESSAGE: &str = "Write operations (CREATE, ALTER, DROP, INSERT, UPDATE, DELETE, etc.) are not permitted for security reasons.";

/// SQL Server error number for a failed login.
const MSSQL_LOGIN_FAILED: u32 = 18456;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("database connection error: {message}")]
    Connection { message: String },

    /// The database rejected the statement or the deadline elapsed.
    /// The driver message is kept verbatim.
    #[error("{message}")]
    Query {
        message: String,
        /// SQLSTATE or server error number, when the driver reports one
        code: Option<String>,
    },

    #[error("{}", WRITE_DENIED_MESSAGE)]
    PolicyDenied,

    #[error("{message}")]
    Format { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DbError {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a query error with an optional driver error code.
    pub fn query(message: impl Into<String>, code: Option<String>) -> Self {
        Self::Query {
            message: message.into(),
            code,
        }
    }

    /// Create the query error reported when the deadline elapses.
    pub fn timeout(elapsed_secs: u64) -> Self {
        Self::query(format!("query exceeded {}s timeout", elapsed_secs), None)
    }

    /// Create a format error.
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Driver error code, if the database supplied one.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Query { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// True for errors that are fatal to the process rather than to one request.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration { .. } | Self::Internal { .. })
    }
}

/// Convert tiberius (SQL Server) errors to DbError.
impl From<tiberius::error::Error> for DbError {
    fn from(err: tiberius::error::Error) -> Self {
        use tiberius::error::Error as TdsError;

        match err {
            TdsError::Server(token) if token.code() == MSSQL_LOGIN_FAILED => {
                DbError::connection(token.message())
            }
            TdsError::Server(token) => {
                DbError::query(token.message(), Some(token.code().to_string()))
            }
            TdsError::Io { .. } | TdsError::Tls(_) | TdsError::Routing { .. } => {
                DbError::connection(err.to_string())
            }
            _ => DbError::query(err.to_string(), None),
        }
    }
}

/// Pool acquisition failures are always connection problems.
impl<E: std::fmt::Display> From<bb8::RunError<E>> for DbError {
    fn from(err: bb8::RunError<E>) -> Self {
        match err {
            bb8::RunError::User(e) => DbError::connection(e.to_string()),
            bb8::RunError::TimedOut => {
                DbError::connection("timed out waiting for a pooled connection")
            }
        }
    }
}

/// Convert sqlx errors to DbError.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string());
                // SQLSTATE class 28: invalid authorization specification
                if code.as_deref().is_some_and(|c| c.starts_with("28")) {
                    DbError::connection(db_err.message())
                } else {
                    DbError::query(db_err.message(), code)
                }
            }
            sqlx::Error::Configuration(msg) => DbError::connection(msg.to_string()),
            sqlx::Error::Io(io_err) => DbError::connection(format!("I/O error: {}", io_err)),
            sqlx::Error::Tls(tls_err) => DbError::connection(format!("TLS error: {}", tls_err)),
            sqlx::Error::Protocol(msg) => DbError::connection(format!("Protocol error: {}", msg)),
            sqlx::Error::PoolTimedOut => {
                DbError::connection("timed out waiting for a pooled connection")
            }
            sqlx::Error::PoolClosed => DbError::connection("connection pool is closed"),
            _ => DbError::query(err.to_string(), None),
        }
    }
}

/// Result type alias for database operations.
pub type DbResult<T> = Result<T, DbError>;
