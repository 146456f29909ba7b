//! Row-to-entity parsing helpers.
//!
//! Every repo converts `libsql::Row` (column-indexed) into typed entity
//! structs. These helpers isolate the parsing logic and handle the dual
//! datetime format (`SQLite`'s `datetime('now')` vs Rust's `to_rfc3339()`).

use chrono::{DateTime, Utc};

use crate::error::DatabaseError;

/// Parse a required TEXT column as `DateTime<Utc>`.
///
/// Handles both RFC 3339 (`"2026-02-09T14:30:00+00:00"`) and `SQLite`'s default
/// format (`"2026-02-09 14:30:00"`).
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the string cannot be parsed as either format.
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| DatabaseError::Query(format!("Failed to parse datetime '{s}': {e}")))
}

/// Parse a TEXT column into a serde-deserializable enum.
///
/// Works with all sesg-core enums that use `#[serde(rename_all = "snake_case")]`.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the string does not match any enum variant.
pub fn parse_enum<T: serde::de::DeserializeOwned>(s: &str) -> Result<T, DatabaseError> {
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .map_err(|e| DatabaseError::Query(format!("Failed to parse enum from '{s}': {e}")))
}

/// Read a nullable TEXT column. Returns `None` for both SQL NULL and empty string.
///
/// `row.get::<String>(idx)` on a NULL column returns an error, not `""`.
///
/// # Errors
///
/// Returns `DatabaseError` if the column read fails.
pub fn get_opt_string(row: &libsql::Row, idx: i32) -> Result<Option<String>, DatabaseError> {
    match row.get::<Option<String>>(idx)? {
        Some(s) if s.is_empty() => Ok(None),
        other => Ok(other),
    }
}

/// Read an INTEGER column as `u32`.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the stored value is negative or too large.
pub fn get_u32(row: &libsql::Row, idx: i32) -> Result<u32, DatabaseError> {
    let value = row.get::<i64>(idx)?;
    u32::try_from(value)
        .map_err(|_| DatabaseError::Query(format!("column {idx}: {value} does not fit in u32")))
}

/// Read a nullable INTEGER column as `Option<u32>`.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if a stored value is negative or too large.
pub fn get_opt_u32(row: &libsql::Row, idx: i32) -> Result<Option<u32>, DatabaseError> {
    row.get::<Option<i64>>(idx)?
        .map(|value| {
            u32::try_from(value).map_err(|_| {
                DatabaseError::Query(format!("column {idx}: {value} does not fit in u32"))
            })
        })
        .transpose()
}

/// Read an INTEGER column as `u64`.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the stored value is negative.
pub fn get_u64(row: &libsql::Row, idx: i32) -> Result<u64, DatabaseError> {
    let value = row.get::<i64>(idx)?;
    u64::try_from(value)
        .map_err(|_| DatabaseError::Query(format!("column {idx}: {value} is negative")))
}

/// Convert a count into the `i64` SQLite stores.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the value exceeds `i64::MAX`.
pub fn to_sql_int<T>(value: T) -> Result<i64, DatabaseError>
where
    T: TryInto<i64> + Copy + std::fmt::Display,
{
    value
        .try_into()
        .map_err(|_| DatabaseError::Query(format!("{value} does not fit in INTEGER")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sesg_core::enums::{SearchStringStatus, TopicFamily};

    #[test]
    fn parses_both_datetime_formats() {
        let rfc = parse_datetime("2026-02-09T14:30:00+00:00").unwrap();
        let sqlite = parse_datetime("2026-02-09 14:30:00").unwrap();
        assert_eq!(rfc, sqlite);
        assert!(parse_datetime("yesterday").is_err());
    }

    #[test]
    fn parses_snake_case_enums() {
        let status: SearchStringStatus = parse_enum("skipped").unwrap();
        assert_eq!(status, SearchStringStatus::Skipped);
        let family: TopicFamily = parse_enum("bertopic").unwrap();
        assert_eq!(family, TopicFamily::Bertopic);
        assert!(parse_enum::<TopicFamily>("nmf").is_err());
    }

    #[test]
    fn sql_int_conversion_bounds() {
        assert_eq!(to_sql_int(7_u32).unwrap(), 7);
        assert!(to_sql_int(u64::MAX).is_err());
    }
}
