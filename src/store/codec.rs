// Copyright (c) 2025 - Cowboy AI, Inc.
//! Column encodings shared by the event logs and snapshot tables
//!
//! SQLite has no decimal or timestamp type. Money is kept as decimal text so
//! it round-trips exactly; timestamps as fixed-width RFC 3339 UTC text so
//! lexical order is time order; exchange dates as `YYYYMMDD` so a month is a
//! string prefix.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::str::FromStr;

use crate::errors::{LedgerError, LedgerResult};

const DATE_FORMAT: &str = "%Y%m%d";

pub fn encode_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_timestamp(column: &'static str, raw: &str) -> LedgerResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| LedgerError::SnapshotDecode {
            column,
            reason: format!("{raw:?}: {e}"),
        })
}

pub fn encode_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn decode_date(column: &'static str, raw: &str) -> LedgerResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|e| LedgerError::SnapshotDecode {
        column,
        reason: format!("{raw:?}: {e}"),
    })
}

pub fn decode_decimal(column: &'static str, raw: &str) -> LedgerResult<Decimal> {
    Decimal::from_str(raw).map_err(|e| LedgerError::SnapshotDecode {
        column,
        reason: format!("{raw:?}: {e}"),
    })
}

/// Read a column, mapping driver errors to [`LedgerError::SnapshotDecode`]
pub fn column<'r, T>(row: &'r SqliteRow, column: &'static str) -> LedgerResult<T>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(column).map_err(|e| LedgerError::SnapshotDecode {
        column,
        reason: e.to_string(),
    })
}

pub fn decimal_column(row: &SqliteRow, name: &'static str) -> LedgerResult<Decimal> {
    let raw: String = column(row, name)?;
    decode_decimal(name, &raw)
}

pub fn timestamp_column(row: &SqliteRow, name: &'static str) -> LedgerResult<DateTime<Utc>> {
    let raw: String = column(row, name)?;
    decode_timestamp(name, &raw)
}

pub fn optional_date_column(row: &SqliteRow, name: &'static str) -> LedgerResult<Option<NaiveDate>> {
    let raw: Option<String> = column(row, name)?;
    raw.map(|raw| decode_date(name, &raw)).transpose()
}

/// Versions and quantities are unsigned in the domain, INTEGER in SQLite
pub fn encode_unsigned(column: &'static str, value: u64) -> LedgerResult<i64> {
    i64::try_from(value).map_err(|_| LedgerError::ValueOutOfRange { column, value })
}

pub fn unsigned_column(row: &SqliteRow, name: &'static str) -> LedgerResult<u64> {
    let raw: i64 = column(row, name)?;
    u64::try_from(raw).map_err(|_| LedgerError::SnapshotDecode {
        column: name,
        reason: format!("negative value {raw}"),
    })
}
