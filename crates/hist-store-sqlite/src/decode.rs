//! Decoding helpers between SQLite column values and the record types.
//!
//! Text columns are decoded permissively: bytes that are not valid UTF-8 are
//! replaced with U+FFFD instead of failing the read. URLs are stored
//! percent-encoded and timestamps as microseconds since the Unix epoch.

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ValueRef};

// ─── Text ────────────────────────────────────────────────────────────────────

/// A text column read without trusting its encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LossyText(pub String);

impl FromSql for LossyText {
  fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
    match value {
      ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
        Ok(Self(String::from_utf8_lossy(bytes).into_owned()))
      }
      _ => Err(FromSqlError::InvalidType),
    }
  }
}

impl From<LossyText> for String {
  fn from(text: LossyText) -> Self { text.0 }
}

// ─── URLs ────────────────────────────────────────────────────────────────────

/// Replace `%xx` escapes with the bytes they stand for. `+` is left alone.
pub fn percent_decode(s: &str) -> String {
  match urlencoding::decode_binary(s.as_bytes()) {
    Cow::Borrowed(_) => s.to_owned(),
    Cow::Owned(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
  }
}

// ─── Timestamps ──────────────────────────────────────────────────────────────

/// `None` when the value is outside the range chrono can represent.
pub fn micros_to_utc(micros: i64) -> Option<DateTime<Utc>> {
  DateTime::from_timestamp_micros(micros)
}

/// Read a microsecond timestamp column as a UTC instant.
pub fn visit_date(row: &rusqlite::Row<'_>, column: &str) -> rusqlite::Result<DateTime<Utc>> {
  let micros: i64 = row.get(column)?;
  micros_to_utc(micros).ok_or_else(|| {
    let index = row.as_ref().column_index(column).unwrap_or_default();
    rusqlite::Error::IntegralValueOutOfRange(index, micros)
  })
}

/// Read a URL column, percent-decoding it.
pub fn url(row: &rusqlite::Row<'_>, column: &str) -> rusqlite::Result<String> {
  let LossyText(raw) = row.get(column)?;
  Ok(percent_decode(&raw))
}

/// Read a nullable URL column, percent-decoding it when present.
pub fn optional_url(row: &rusqlite::Row<'_>, column: &str) -> rusqlite::Result<Option<String>> {
  let raw: Option<LossyText> = row.get(column)?;
  Ok(raw.map(|LossyText(s)| percent_decode(&s)))
}

/// Read a nullable text column.
pub fn optional_text(row: &rusqlite::Row<'_>, column: &str) -> rusqlite::Result<Option<String>> {
  let raw: Option<LossyText> = row.get(column)?;
  Ok(raw.map(String::from))
}
