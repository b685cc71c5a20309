//! Read-only statement classifier for the `execute_sql` tool.
//!
//! Classification is lexical: the text is trimmed and upper-cased, then
//! checked against a fixed list of mutating verbs. A statement is denied when
//! it starts with a verb, or when a verb appears surrounded by single spaces.
//!
//! This is a heuristic, not a security boundary. Known gaps:
//! - a verb separated by tabs, newlines, or punctuation (`x;DROP TABLE t`)
//!   is not caught by the "surrounded by spaces" rule;
//! - comments and string literals are not understood, so `'a DELETE b'`
//!   inside a literal is denied;
//! - the prefix rule is a plain prefix test, so `EXECUTIVES` at the start
//!   of the text is denied while ` UPDATES ` in the middle is allowed.
//!
//! Accept/reject decisions are externally observable; changing the rule
//! changes behavior for existing clients.

use crate::error::{DbError, DbResult};
use tracing::debug;

/// SQL verbs that modify data, schema, or permissions, or run procedures.
pub const WRITE_OPERATIONS: [&str; 13] = [
    "CREATE", "ALTER", "DROP", "INSERT", "UPDATE", "DELETE", "TRUNCATE", "MERGE", "UPSERT",
    "GRANT", "REVOKE", "EXEC", "EXECUTE",
];

/// Returns the first mutating verb the rule matches, if any.
pub fn matched_write_operation(sql: &str) -> Option<&'static str> {
    let normalized = sql.trim().to_uppercase();

    WRITE_OPERATIONS.iter().copied().find(|op| {
        normalized.starts_with(op) || normalized.contains(&format!(" {} ", op))
    })
}

/// True when the statement is classified as mutating.
///
/// # Examples
///
/// ```
/// use mssql_mcp_server::tools::classifier::is_write_operation;
///
/// assert!(is_write_operation("DROP TABLE t"));
/// assert!(is_write_operation("update set x=1"));
/// assert!(!is_write_operation("select * from t"));
/// assert!(!is_write_operation("SELECT * FROM UPDATES"));
/// ```
pub fn is_write_operation(sql: &str) -> bool {
    matched_write_operation(sql).is_some()
}

/// True when the statement may be executed.
pub fn is_allowed(sql: &str) -> bool {
    !is_write_operation(sql)
}

/// Reject mutating statements with [`DbError::PolicyDenied`].
pub fn validate_readonly(sql: &str) -> DbResult<()> {
    match matched_write_operation(sql) {
        Some(op) => {
            debug!(operation = op, "Statement classified as write operation");
            Err(DbError::PolicyDenied)
        }
        None => Ok(()),
    }
}

/// True when the text is `SHOW TABLES`, ignoring case and surrounding or
/// separating whitespace.
pub fn is_show_tables(sql: &str) -> bool {
    let mut words = sql.split_whitespace();
    matches!(
        (words.next(), words.next(), words.next()),
        (Some(show), Some(tables), None)
            if show.eq_ignore_ascii_case("SHOW") && tables.eq_ignore_ascii_case("TABLES")
    )
}
