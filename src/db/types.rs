//! Driver value decoding.
//!
//! Every driver value is turned into a [`CellValue`] here, so nothing
//! loosely typed leaves the `db` module:
//! - NULL stays `Null`
//! - integers, floats and decimals become `Number`
//! - bit/boolean becomes `Boolean`
//! - byte sequences are decoded as UTF-8 text, invalid sequences replaced
//!   with U+FFFD
//! - dates, times, GUIDs, XML and strings become `Text`

use crate::error::{DbError, DbResult};
use crate::models::{CellValue, Number, Row as ResultRow};
use sqlx::{Column, ColumnIndex, Decode, Row, Type, TypeInfo, ValueRef};
use tiberius::{ColumnData, FromSql};

// =============================================================================
// Binary Encoding
// =============================================================================

/// Decode binary data to text.
///
/// Invalid UTF-8 sequences become U+FFFD.
pub fn decode_binary_value(bytes: &[u8]) -> CellValue {
    CellValue::Text(String::from_utf8_lossy(bytes).into_owned())
}

// =============================================================================
// SQL Server (tiberius)
// =============================================================================

/// Decode one SQL Server value.
pub fn decode_mssql_value(data: ColumnData<'static>) -> DbResult<CellValue> {
    let value = match data {
        ColumnData::U8(Some(v)) => CellValue::integer(v),
        ColumnData::I16(Some(v)) => CellValue::integer(v),
        ColumnData::I32(Some(v)) => CellValue::integer(v),
        ColumnData::I64(Some(v)) => CellValue::integer(v),
        ColumnData::F32(Some(v)) => CellValue::float(v),
        ColumnData::F64(Some(v)) => CellValue::float(v),
        ColumnData::Bit(Some(v)) => CellValue::Boolean(v),
        ColumnData::String(Some(v)) => CellValue::Text(v.into_owned()),
        ColumnData::Guid(Some(v)) => CellValue::Text(v.to_string()),
        ColumnData::Binary(Some(v)) => decode_binary_value(&v),
        ColumnData::Numeric(Some(v)) => CellValue::Number(Number::Decimal(v.to_string())),
        ColumnData::Xml(Some(v)) => CellValue::Text(v.into_owned().into_string()),
        ColumnData::DateTime(Some(_))
        | ColumnData::SmallDateTime(Some(_))
        | ColumnData::DateTime2(Some(_)) => {
            temporal_text(chrono::NaiveDateTime::from_sql(&data)?)
        }
        ColumnData::Date(Some(_)) => temporal_text(chrono::NaiveDate::from_sql(&data)?),
        ColumnData::Time(Some(_)) => temporal_text(chrono::NaiveTime::from_sql(&data)?),
        ColumnData::DateTimeOffset(Some(_)) => {
            temporal_text(chrono::DateTime::<chrono::FixedOffset>::from_sql(&data)?)
        }
        ColumnData::U8(None)
        | ColumnData::I16(None)
        | ColumnData::I32(None)
        | ColumnData::I64(None)
        | ColumnData::F32(None)
        | ColumnData::F64(None)
        | ColumnData::Bit(None)
        | ColumnData::String(None)
        | ColumnData::Guid(None)
        | ColumnData::Binary(None)
        | ColumnData::Numeric(None)
        | ColumnData::Xml(None)
        | ColumnData::DateTime(None)
        | ColumnData::SmallDateTime(None)
        | ColumnData::DateTime2(None)
        | ColumnData::Date(None)
        | ColumnData::Time(None)
        | ColumnData::DateTimeOffset(None) => CellValue::Null,
    };
    Ok(value)
}

fn temporal_text<T: ToString>(value: Option<T>) -> CellValue {
    value
        .map(|v| CellValue::Text(v.to_string()))
        .unwrap_or(CellValue::Null)
}

/// Decode a full SQL Server row, checking it matches the column count.
pub fn decode_mssql_row(row: tiberius::Row, width: usize) -> DbResult<ResultRow> {
    let values = row
        .into_iter()
        .map(decode_mssql_value)
        .collect::<DbResult<Vec<_>>>()?;

    if values.len() != width {
        return Err(DbError::query(
            format!(
                "row has {} values but the result has {} columns",
                values.len(),
                width
            ),
            None,
        ));
    }
    Ok(ResultRow::new(values))
}

// =============================================================================
// sqlx (PostgreSQL, MySQL, SQLite)
// =============================================================================

fn try_decode<'r, R, T>(row: &'r R, idx: usize) -> Option<T>
where
    R: Row,
    usize: ColumnIndex<R>,
    T: Decode<'r, R::Database> + Type<R::Database>,
{
    row.try_get::<T, _>(idx).ok()
}

/// Driver-specific types outside the set every sqlx driver shares.
pub trait DecodeExtra: Row {
    fn decode_extra(&self, _idx: usize) -> Option<CellValue> {
        None
    }
}

impl DecodeExtra for sqlx::postgres::PgRow {
    fn decode_extra(&self, idx: usize) -> Option<CellValue> {
        if let Some(v) = try_decode::<_, sqlx::types::Decimal>(self, idx) {
            return Some(CellValue::Number(Number::Decimal(v.to_string())));
        }
        if let Some(v) = try_decode::<_, uuid::Uuid>(self, idx) {
            return Some(CellValue::Text(v.to_string()));
        }
        if let Some(v) = try_decode::<_, serde_json::Value>(self, idx) {
            return Some(CellValue::Text(v.to_string()));
        }
        None
    }
}

impl DecodeExtra for sqlx::mysql::MySqlRow {
    fn decode_extra(&self, idx: usize) -> Option<CellValue> {
        if let Some(v) = try_decode::<_, sqlx::types::Decimal>(self, idx) {
            return Some(CellValue::Number(Number::Decimal(v.to_string())));
        }
        if let Some(v) = try_decode::<_, serde_json::Value>(self, idx) {
            return Some(CellValue::Text(v.to_string()));
        }
        None
    }
}

impl DecodeExtra for sqlx::sqlite::SqliteRow {}

/// Decode one sqlx cell by trying the scalar types every supported driver
/// understands, narrowest first, then the driver's own extras.
pub fn decode_sqlx_value<R>(row: &R, idx: usize) -> DbResult<CellValue>
where
    R: DecodeExtra,
    usize: ColumnIndex<R>,
    for<'r> i64: Decode<'r, R::Database> + Type<R::Database>,
    for<'r> i32: Decode<'r, R::Database> + Type<R::Database>,
    for<'r> i16: Decode<'r, R::Database> + Type<R::Database>,
    for<'r> f64: Decode<'r, R::Database> + Type<R::Database>,
    for<'r> f32: Decode<'r, R::Database> + Type<R::Database>,
    for<'r> bool: Decode<'r, R::Database> + Type<R::Database>,
    for<'r> String: Decode<'r, R::Database> + Type<R::Database>,
    for<'r> Vec<u8>: Decode<'r, R::Database> + Type<R::Database>,
    for<'r> chrono::NaiveDateTime: Decode<'r, R::Database> + Type<R::Database>,
    for<'r> chrono::DateTime<chrono::Utc>: Decode<'r, R::Database> + Type<R::Database>,
    for<'r> chrono::NaiveDate: Decode<'r, R::Database> + Type<R::Database>,
    for<'r> chrono::NaiveTime: Decode<'r, R::Database> + Type<R::Database>,
{
    if row.try_get_raw(idx)?.is_null() {
        return Ok(CellValue::Null);
    }

    if let Some(v) = try_decode::<R, i64>(row, idx) {
        return Ok(CellValue::integer(v));
    }
    if let Some(v) = try_decode::<R, i32>(row, idx) {
        return Ok(CellValue::integer(v));
    }
    if let Some(v) = try_decode::<R, i16>(row, idx) {
        return Ok(CellValue::integer(v));
    }
    if let Some(v) = try_decode::<R, f64>(row, idx) {
        return Ok(CellValue::float(v));
    }
    if let Some(v) = try_decode::<R, f32>(row, idx) {
        return Ok(CellValue::float(v));
    }
    if let Some(v) = try_decode::<R, bool>(row, idx) {
        return Ok(CellValue::Boolean(v));
    }
    if let Some(v) = try_decode::<R, String>(row, idx) {
        return Ok(CellValue::Text(v));
    }
    if let Some(v) = try_decode::<R, Vec<u8>>(row, idx) {
        return Ok(decode_binary_value(&v));
    }
    if let Some(v) = try_decode::<R, chrono::NaiveDateTime>(row, idx) {
        return Ok(CellValue::Text(v.to_string()));
    }
    if let Some(v) = try_decode::<R, chrono::DateTime<chrono::Utc>>(row, idx) {
        return Ok(CellValue::Text(v.to_string()));
    }
    if let Some(v) = try_decode::<R, chrono::NaiveDate>(row, idx) {
        return Ok(CellValue::Text(v.to_string()));
    }
    if let Some(v) = try_decode::<R, chrono::NaiveTime>(row, idx) {
        return Ok(CellValue::Text(v.to_string()));
    }
    if let Some(v) = row.decode_extra(idx) {
        return Ok(v);
    }

    let column = &row.columns()[idx];
    Err(DbError::query(
        format!(
            "unsupported column type {} for column '{}'",
            column.type_info().name(),
            column.name()
        ),
        None,
    ))
}

// =============================================================================
// Row Conversion Trait
// =============================================================================

/// Trait for converting sqlx rows to result rows.
pub trait RowToCells {
    fn column_names(&self) -> Vec<String>;
    fn to_cells(&self) -> DbResult<ResultRow>;
}

macro_rules! impl_row_to_cells {
    ($($row:ty),+ $(,)?) => {
        $(
            impl RowToCells for $row {
                fn column_names(&self) -> Vec<String> {
                    self.columns().iter().map(|c| c.name().to_string()).collect()
                }

                fn to_cells(&self) -> DbResult<ResultRow> {
                    (0..self.len())
                        .map(|idx| decode_sqlx_value(self, idx))
                        .collect::<DbResult<Vec<_>>>()
                        .map(ResultRow::new)
                }
            }
        )+
    };
}

impl_row_to_cells!(
    sqlx::postgres::PgRow,
    sqlx::mysql::MySqlRow,
    sqlx::sqlite::SqliteRow,
);
