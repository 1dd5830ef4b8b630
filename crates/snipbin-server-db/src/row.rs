// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Dialect-tolerant row decoding.
//!
//! Fetched rows are captured into [`SqlRow`], a column-name-to-[`SqlValue`]
//! mapping, and every scalar is decoded through the functions in this module.
//! Each logical type tolerates the two physical encodings found in the
//! supported storage dialects:
//!
//! - identifiers: canonical hyphenated TEXT or 16-byte BLOB
//! - timestamps: RFC 3339 TEXT or integer unix seconds
//! - booleans: native boolean or integer 0/1 of any width
//!
//! Writes always produce the TEXT dialect; the tolerance is read-side only,
//! which keeps every query method free of dialect branching.

use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row, TypeInfo, ValueRef};
use uuid::Uuid;

use crate::error::DbError;

/// A single stored scalar, one variant per physical storage class.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
	Null,
	Integer(i64),
	Real(f64),
	Text(String),
	Blob(Vec<u8>),
	Bool(bool),
}

impl SqlValue {
	pub fn is_null(&self) -> bool {
		matches!(self, SqlValue::Null)
	}
}

/// An owned, insertion-ordered snapshot of one fetched row.
#[derive(Debug, Clone, Default)]
pub struct SqlRow {
	columns: Vec<(String, SqlValue)>,
}

impl SqlRow {
	pub fn new(columns: Vec<(String, SqlValue)>) -> Self {
		Self { columns }
	}

	/// Look up a column by name.
	pub fn get(&self, name: &str) -> Option<&SqlValue> {
		self
			.columns
			.iter()
			.find(|(col, _)| col == name)
			.map(|(_, value)| value)
	}

	/// Look up a column by name, failing with `DbError::Mapping` if the
	/// result set does not carry it at all. A present-but-NULL column is
	/// returned as [`SqlValue::Null`].
	pub fn require(&self, name: &str) -> Result<&SqlValue, DbError> {
		self
			.get(name)
			.ok_or_else(|| DbError::Mapping(format!("required column '{name}' missing from row")))
	}
}

/// Capture a sqlx row into the dialect-neutral representation.
pub fn from_sqlite_row(row: &SqliteRow) -> Result<SqlRow, DbError> {
	let mut columns = Vec::with_capacity(row.len());
	for col in row.columns() {
		let idx = col.ordinal();
		let raw = row.try_get_raw(idx)?;
		let value = if raw.is_null() {
			SqlValue::Null
		} else {
			match raw.type_info().name() {
				"TEXT" | "DATETIME" | "DATE" | "TIME" => SqlValue::Text(row.try_get::<String, _>(idx)?),
				"INTEGER" | "NUMERIC" => SqlValue::Integer(row.try_get::<i64, _>(idx)?),
				"BOOLEAN" => SqlValue::Bool(row.try_get::<bool, _>(idx)?),
				"REAL" => SqlValue::Real(row.try_get::<f64, _>(idx)?),
				"BLOB" => SqlValue::Blob(row.try_get::<Vec<u8>, _>(idx)?),
				other => {
					return Err(DbError::Format {
						column: col.name().to_string(),
						message: format!("unsupported storage class {other}"),
					});
				}
			}
		};
		columns.push((col.name().to_string(), value));
	}
	Ok(SqlRow::new(columns))
}

fn format_err(column: &str, message: impl Into<String>) -> DbError {
	DbError::Format {
		column: column.to_string(),
		message: message.into(),
	}
}

/// Decode an identifier from either canonical TEXT or a 16-byte BLOB.
pub fn decode_id(column: &str, value: &SqlValue) -> Result<Uuid, DbError> {
	match value {
		SqlValue::Text(s) => {
			Uuid::parse_str(s).map_err(|e| format_err(column, format!("invalid uuid '{s}': {e}")))
		}
		SqlValue::Blob(bytes) => Uuid::from_slice(bytes)
			.map_err(|_| format_err(column, format!("invalid uuid blob of {} bytes", bytes.len()))),
		other => Err(format_err(column, format!("expected uuid, got {other:?}"))),
	}
}

/// Decode an optional identifier, mapping NULL to `None`.
pub fn decode_opt_id(column: &str, value: &SqlValue) -> Result<Option<Uuid>, DbError> {
	match value {
		SqlValue::Null => Ok(None),
		other => decode_id(column, other).map(Some),
	}
}

/// Decode a timestamp from RFC 3339 TEXT or integer unix seconds.
pub fn decode_timestamp(column: &str, value: &SqlValue) -> Result<DateTime<Utc>, DbError> {
	match value {
		SqlValue::Text(s) => DateTime::parse_from_rfc3339(s)
			.map(|dt| dt.with_timezone(&Utc))
			.or_else(|_| {
				NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").map(|naive| naive.and_utc())
			})
			.map_err(|e| format_err(column, format!("invalid timestamp '{s}': {e}"))),
		SqlValue::Integer(secs) => DateTime::from_timestamp(*secs, 0)
			.ok_or_else(|| format_err(column, format!("unix timestamp {secs} out of range"))),
		other => Err(format_err(column, format!("expected timestamp, got {other:?}"))),
	}
}

/// Decode an optional timestamp, mapping NULL to `None`.
pub fn decode_opt_timestamp(
	column: &str,
	value: &SqlValue,
) -> Result<Option<DateTime<Utc>>, DbError> {
	match value {
		SqlValue::Null => Ok(None),
		other => decode_timestamp(column, other).map(Some),
	}
}

/// Decode a boolean from a native boolean or an integer of any width.
/// Zero is false, any nonzero value is true. Textual "0"/"1" shows up in
/// exports from the integer dialect and is accepted too.
pub fn decode_bool(column: &str, value: &SqlValue) -> Result<bool, DbError> {
	match value {
		SqlValue::Bool(b) => Ok(*b),
		SqlValue::Integer(i) => Ok(*i != 0),
		SqlValue::Text(s) => match s.as_str() {
			"0" => Ok(false),
			"1" => Ok(true),
			other => Err(format_err(column, format!("expected boolean, got '{other}'"))),
		},
		other => Err(format_err(column, format!("expected boolean, got {other:?}"))),
	}
}

/// Decode a 32-bit integer, with an explicit range check when the stored
/// value is 64-bit wide. Never truncates.
pub fn decode_i32(column: &str, value: &SqlValue) -> Result<i32, DbError> {
	match value {
		SqlValue::Integer(i) => i32::try_from(*i).map_err(|_| DbError::Overflow {
			column: column.to_string(),
			value: *i,
		}),
		other => Err(format_err(column, format!("expected integer, got {other:?}"))),
	}
}

/// Decode a 64-bit integer.
pub fn decode_i64(column: &str, value: &SqlValue) -> Result<i64, DbError> {
	match value {
		SqlValue::Integer(i) => Ok(*i),
		other => Err(format_err(column, format!("expected integer, got {other:?}"))),
	}
}

/// Decode a text column.
pub fn decode_text(column: &str, value: &SqlValue) -> Result<String, DbError> {
	match value {
		SqlValue::Text(s) => Ok(s.clone()),
		other => Err(format_err(column, format!("expected text, got {other:?}"))),
	}
}

/// Decode an optional text column, mapping NULL to `None`.
pub fn decode_opt_text(column: &str, value: &SqlValue) -> Result<Option<String>, DbError> {
	match value {
		SqlValue::Null => Ok(None),
		other => decode_text(column, other).map(Some),
	}
}

/// Decode an enumeration stored as an integer code. `from_code` is the
/// enum's own decoder; an unrecognized code fails with `UnknownEnum`.
pub fn decode_enum<T>(
	column: &str,
	value: &SqlValue,
	from_code: impl Fn(i32) -> Option<T>,
) -> Result<T, DbError> {
	let code = decode_i32(column, value)?;
	from_code(code).ok_or(DbError::UnknownEnum {
		column: column.to_string(),
		value: code,
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn id_decodes_from_text_and_blob_to_equal_values() {
		let uuid = Uuid::parse_str("3fa85f64-5717-4562-b3fc-2c963f66afa6").unwrap();
		let from_text = decode_id("id", &SqlValue::Text(uuid.to_string())).unwrap();
		let from_blob = decode_id("id", &SqlValue::Blob(uuid.as_bytes().to_vec())).unwrap();
		assert_eq!(from_text, uuid);
		assert_eq!(from_blob, uuid);
		assert_eq!(from_text, from_blob);
	}

	#[test]
	fn id_rejects_malformed_text() {
		let err = decode_id("id", &SqlValue::Text("not-a-uuid".to_string())).unwrap_err();
		assert!(matches!(err, DbError::Format { .. }));

		let err = decode_id("id", &SqlValue::Blob(vec![1, 2, 3])).unwrap_err();
		assert!(matches!(err, DbError::Format { .. }));
	}

	#[test]
	fn bool_decodes_integers_and_native() {
		assert!(!decode_bool("flag", &SqlValue::Integer(0)).unwrap());
		assert!(decode_bool("flag", &SqlValue::Integer(1)).unwrap());
		assert!(decode_bool("flag", &SqlValue::Integer(i64::MAX)).unwrap());
		assert!(decode_bool("flag", &SqlValue::Bool(true)).unwrap());
		assert!(!decode_bool("flag", &SqlValue::Bool(false)).unwrap());

		assert!(decode_bool("flag", &SqlValue::Text("1".to_string())).unwrap());
		assert!(!decode_bool("flag", &SqlValue::Text("0".to_string())).unwrap());
		assert!(decode_bool("flag", &SqlValue::Text("yes".to_string())).is_err());
	}

	#[test]
	fn timestamp_decodes_both_dialects() {
		let text = decode_timestamp(
			"created_at",
			&SqlValue::Text("2024-05-01T12:30:00+00:00".to_string()),
		)
		.unwrap();
		let unix = decode_timestamp("created_at", &SqlValue::Integer(text.timestamp())).unwrap();
		assert_eq!(text, unix);

		let err =
			decode_timestamp("created_at", &SqlValue::Text("yesterday".to_string())).unwrap_err();
		assert!(matches!(err, DbError::Format { .. }));
	}

	#[test]
	fn i32_range_checks_instead_of_truncating() {
		assert_eq!(decode_i32("count", &SqlValue::Integer(42)).unwrap(), 42);
		let err = decode_i32("count", &SqlValue::Integer(i64::from(i32::MAX) + 1)).unwrap_err();
		assert!(matches!(err, DbError::Overflow { .. }));
	}

	#[test]
	fn enum_rejects_unknown_codes() {
		use snipbin_common_model::CommentStatus;

		let ok = decode_enum("status", &SqlValue::Integer(1), CommentStatus::from_code).unwrap();
		assert_eq!(ok, CommentStatus::Pending);

		let err =
			decode_enum("status", &SqlValue::Integer(7), CommentStatus::from_code).unwrap_err();
		assert!(matches!(err, DbError::UnknownEnum { value: 7, .. }));
	}

	#[test]
	fn require_distinguishes_missing_from_null() {
		let row = SqlRow::new(vec![("present".to_string(), SqlValue::Null)]);
		assert!(row.require("present").unwrap().is_null());
		assert!(matches!(row.require("absent"), Err(DbError::Mapping(_))));
	}
}
