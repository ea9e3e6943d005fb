//! Typed, lazily-pulled query results.
//!
//! A [`Query`] is a prepared statement bound to a [`Session`](crate::Session);
//! [`Query::rows`] starts it and returns a [`Rows`] iterator that decodes one
//! row per `next()` call. Nothing is buffered.

use std::marker::PhantomData;

use hist_core::{RawSiteMetadata, RawVisit, Visit};

use crate::{Error, Result, decode, schema};

// ─── Row decoding ────────────────────────────────────────────────────────────

mod sealed {
  pub trait Sealed {}

  impl Sealed for hist_core::RawVisit {}
  impl Sealed for hist_core::RawSiteMetadata {}
  impl Sealed for hist_core::Visit {}
}

/// A record type that one of the fixed queries produces.
///
/// Sealed: the set of queries a [`Session`](crate::Session) can run is closed.
///
/// ```compile_fail
/// struct Titles(String);
///
/// impl hist_store_sqlite::FromStoreRow for Titles {
///   const QUERY: &'static str = "SELECT title FROM moz_places";
///   const KIND: &'static str = "titles";
///
///   fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> { Ok(Self(row.get(0)?)) }
/// }
/// ```
pub trait FromStoreRow: sealed::Sealed + Sized {
  /// The SQL that yields rows of this shape.
  const QUERY: &'static str;
  /// Human-readable name for log lines.
  const KIND: &'static str;

  fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self>;
}

impl FromStoreRow for RawVisit {
  const QUERY: &'static str = schema::VISITS;
  const KIND: &'static str = "visits";

  fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      url:        decode::url(row, "url")?,
      page_id:    row.get("pid")?,
      visit_id:   row.get("vid")?,
      visit_date: decode::visit_date(row, "visit_date")?,
      visit_type: row.get("visit_type")?,
    })
  }
}

impl FromStoreRow for RawSiteMetadata {
  const QUERY: &'static str = schema::SITE_METADATA;
  const KIND: &'static str = "site metadata";

  fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      page_id:       row.get("pid")?,
      title:         decode::optional_text(row, "title")?,
      description:   decode::optional_text(row, "description")?,
      preview_image: decode::optional_url(row, "preview_image_url")?,
    })
  }
}

impl FromStoreRow for Visit {
  const QUERY: &'static str = schema::COMBINED;
  const KIND: &'static str = "combined visits";

  fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      url:           decode::url(row, "url")?,
      visit_date:    decode::visit_date(row, "visit_date")?,
      visit_type:    row.get("visit_type")?,
      title:         decode::optional_text(row, "title")?,
      description:   decode::optional_text(row, "description")?,
      preview_image: decode::optional_url(row, "preview_image_url")?,
    })
  }
}

// ─── Query ───────────────────────────────────────────────────────────────────

/// A prepared statement producing records of type `T`.
pub struct Query<'s, T> {
  stmt:      rusqlite::Statement<'s>,
  source_id: &'s str,
  _record:   PhantomData<fn() -> T>,
}

impl<'s, T: FromStoreRow> Query<'s, T> {
  pub(crate) fn new(stmt: rusqlite::Statement<'s>, source_id: &'s str) -> Self {
    Self { stmt, source_id, _record: PhantomData }
  }

  /// Execute the statement and iterate its rows.
  ///
  /// Calling this again restarts the query from the first row.
  pub fn rows(&mut self) -> Result<Rows<'_, T>> {
    let rows = self
      .stmt
      .query([])
      .map_err(|e| Error::access(self.source_id, e))?;
    Ok(Rows { rows, source_id: self.source_id, done: false, _record: PhantomData })
  }

  /// Read every row, failing without a partial result if any row fails.
  pub fn collect_all(&mut self) -> Result<Vec<T>> { self.rows()?.collect() }
}

// ─── Rows ────────────────────────────────────────────────────────────────────

/// Iterator over decoded rows.
///
/// Stops after the first error; the statement is reset when this is dropped,
/// so partial consumption leaves nothing open beyond the session itself.
pub struct Rows<'q, T> {
  rows:      rusqlite::Rows<'q>,
  source_id: &'q str,
  done:      bool,
  _record:   PhantomData<fn() -> T>,
}

impl<T: FromStoreRow> Iterator for Rows<'_, T> {
  type Item = Result<T>;

  fn next(&mut self) -> Option<Self::Item> {
    if self.done {
      return None;
    }

    let decoded = match self.rows.next() {
      Ok(Some(row)) => T::from_row(row),
      Ok(None) => {
        self.done = true;
        return None;
      }
      Err(e) => Err(e),
    };

    if decoded.is_err() {
      self.done = true;
    }
    Some(decoded.map_err(|e| Error::access(self.source_id, e)))
  }
}
