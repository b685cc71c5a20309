//! Output formatting for the `execute_sql` tool.
//!
//! Tables render as comma-delimited lines: a header of column names followed
//! by one line per row. Values are written as-is; embedded commas and
//! newlines are not quoted, so the output is not CSV-compliant.

use crate::error::{DbError, DbResult};
use crate::models::{EffectResult, QueryOutcome, TabularResult};

pub const NO_RESULTS: &str = "No results found";

/// Column read by [`format_table_list`].
pub const TABLE_NAME_COLUMN: &str = "TABLE_NAME";

/// Render any query outcome as text.
pub fn format_outcome(outcome: &QueryOutcome) -> DbResult<String> {
    match outcome {
        QueryOutcome::Table(result) => format_table(result),
        QueryOutcome::Effect(result) => Ok(format_effect(result)),
    }
}

pub fn format_effect(result: &EffectResult) -> String {
    format!(
        "Query executed successfully. Rows affected: {}",
        result.rows_affected
    )
}

/// Render rows as a header line plus one comma-joined line per row.
///
/// Fails if a row's width differs from the header.
pub fn format_table(result: &TabularResult) -> DbResult<String> {
    if result.rows.is_empty() {
        return Ok(NO_RESULTS.to_string());
    }

    let mut output = result.columns.join(",");
    output.push('\n');

    for (idx, row) in result.rows.iter().enumerate() {
        if row.len() != result.columns.len() {
            return Err(DbError::format(format!(
                "row {} has {} values but the result has {} columns",
                idx,
                row.len(),
                result.columns.len()
            )));
        }
        let line = row
            .values()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        output.push_str(&line);
        output.push('\n');
    }

    Ok(output)
}

/// Render a table-name listing as `Tables_in_{database}` followed by one
/// name per line.
///
/// The `TABLE_NAME` column is matched case-insensitively; a single-column
/// result is accepted under any name.
pub fn format_table_list(database: &str, result: &TabularResult) -> DbResult<String> {
    let mut output = format!("Tables_in_{}\n", database);
    if result.rows.is_empty() {
        return Ok(output);
    }

    let idx = result
        .column_index(TABLE_NAME_COLUMN)
        .or_else(|| (result.columns.len() == 1).then_some(0))
        .ok_or_else(|| DbError::format("unknown result format: no TABLE_NAME column"))?;

    for row in &result.rows {
        let name = row
            .get(idx)
            .ok_or_else(|| DbError::format("unknown result format: short row"))?;
        output.push_str(&name.to_string());
        output.push('\n');
    }

    Ok(output)
}
