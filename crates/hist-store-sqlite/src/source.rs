//! Where rows come from: a store path the reader opens itself, or a
//! connection the caller already holds.

use std::path::{Path, PathBuf};

use hist_core::{RawSiteMetadata, RawVisit, SiteIndex, Visit};
use rusqlite::{Connection, OpenFlags};
use tracing::debug;

use crate::{
  Error, Result,
  rows::{FromStoreRow, Query},
};

// ─── Source ──────────────────────────────────────────────────────────────────

/// Input to [`SourceReader::open`](crate::SourceReader::open).
#[derive(Debug, Clone)]
pub enum Source<'c> {
  /// A store on disk. Validated, then opened read-only for one session.
  Path(PathBuf),
  /// A connection owned by the caller. Not validated and never closed here.
  Connection(&'c Connection),
}

impl<'c> Source<'c> {
  pub fn path(path: impl Into<PathBuf>) -> Self { Self::Path(path.into()) }

  /// Identifier used in log lines and errors.
  pub fn id(&self) -> String {
    match self {
      Self::Path(p) => p.display().to_string(),
      Self::Connection(_) => "<connection>".to_owned(),
    }
  }
}

impl From<PathBuf> for Source<'_> {
  fn from(path: PathBuf) -> Self { Self::Path(path) }
}

impl From<&Path> for Source<'_> {
  fn from(path: &Path) -> Self { Self::Path(path.to_path_buf()) }
}

impl<'c> From<&'c Connection> for Source<'c> {
  fn from(conn: &'c Connection) -> Self { Self::Connection(conn) }
}

// ─── Opening ─────────────────────────────────────────────────────────────────

/// Open `path` read-only with SQLite's `immutable` flag so nothing, not even a
/// journal or lock, is written next to the store.
pub(crate) fn open_immutable(path: &Path) -> rusqlite::Result<Connection> {
  Connection::open_with_flags(
    immutable_uri(path)?,
    OpenFlags::SQLITE_OPEN_READ_ONLY
      | OpenFlags::SQLITE_OPEN_URI
      | OpenFlags::SQLITE_OPEN_NO_MUTEX,
  )
}

/// `file:` URI for `path`. Characters with meaning inside a URI are escaped so
/// they stay part of the file name. Paths that are not valid UTF-8 are
/// refused rather than rewritten, which would name a different file.
fn immutable_uri(path: &Path) -> rusqlite::Result<String> {
  let raw = path
    .to_str()
    .ok_or_else(|| rusqlite::Error::InvalidPath(path.to_path_buf()))?;
  let mut uri = String::with_capacity(raw.len() + 20);
  uri.push_str("file:");
  for c in raw.chars() {
    match c {
      '%' => uri.push_str("%25"),
      '?' => uri.push_str("%3f"),
      '#' => uri.push_str("%23"),
      c => uri.push(c),
    }
  }
  uri.push_str("?immutable=1");
  Ok(uri)
}

// ─── Session ─────────────────────────────────────────────────────────────────

enum Handle<'c> {
  Owned(Connection),
  Borrowed(&'c Connection),
}

/// An open view of one source.
///
/// A session opened from a path owns its connection and closes it on drop;
/// one opened from a borrowed connection leaves it untouched. Queries and
/// their row iterators borrow the session, so the connection cannot be
/// released while rows are still being pulled.
pub struct Session<'c> {
  source_id: String,
  conn:      Handle<'c>,
}

impl<'c> Session<'c> {
  pub(crate) fn owned(source_id: String, conn: Connection) -> Self {
    Self { source_id, conn: Handle::Owned(conn) }
  }

  pub(crate) fn borrowed(source_id: String, conn: &'c Connection) -> Self {
    Self { source_id, conn: Handle::Borrowed(conn) }
  }

  pub fn source_id(&self) -> &str { &self.source_id }

  /// `true` when dropping this session closes its connection.
  pub fn owns_connection(&self) -> bool { matches!(self.conn, Handle::Owned(_)) }

  fn connection(&self) -> &Connection {
    match &self.conn {
      Handle::Owned(conn) => conn,
      Handle::Borrowed(conn) => conn,
    }
  }

  /// Prepare the fixed query for record type `T`.
  pub fn prepare<T: FromStoreRow>(&self) -> Result<Query<'_, T>> {
    debug!(source = %self.source_id, "reading {}", T::KIND);
    let stmt = self
      .connection()
      .prepare(T::QUERY)
      .map_err(|e| Error::access(&self.source_id, e))?;
    Ok(Query::new(stmt, &self.source_id))
  }

  /// Individual visit events.
  pub fn visits(&self) -> Result<Query<'_, RawVisit>> { self.prepare() }

  /// Title/description/preview image per page.
  pub fn site_metadata(&self) -> Result<Query<'_, RawSiteMetadata>> { self.prepare() }

  /// Visits already joined with their metadata by the store.
  pub fn combined(&self) -> Result<Query<'_, Visit>> { self.prepare() }

  /// Read all site metadata into a lookup keyed by page id.
  pub fn site_index(&self) -> Result<SiteIndex> {
    let mut query = self.site_metadata()?;
    let index = query.rows()?.collect::<Result<SiteIndex>>()?;
    Ok(index)
  }

  /// Close an owned connection now, reporting any error from SQLite. A no-op
  /// for borrowed connections.
  pub fn close(self) -> Result<()> {
    match self.conn {
      Handle::Owned(conn) => conn
        .close()
        .map_err(|(_, e)| Error::access(&self.source_id, e)),
      Handle::Borrowed(_) => Ok(()),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn uri_marks_store_immutable() {
    assert_eq!(
      immutable_uri(Path::new("/tmp/places.sqlite")).unwrap(),
      "file:/tmp/places.sqlite?immutable=1"
    );
  }

  #[test]
  fn uri_escapes_reserved_characters() {
    assert_eq!(
      immutable_uri(Path::new("/tmp/100%?#.sqlite")).unwrap(),
      "file:/tmp/100%25%3f%23.sqlite?immutable=1"
    );
  }

  #[cfg(unix)]
  #[test]
  fn uri_refuses_non_utf8_path() {
    use std::{ffi::OsStr, os::unix::ffi::OsStrExt};

    let path = Path::new(OsStr::from_bytes(b"/tmp/\xffplaces.sqlite"));
    assert!(matches!(immutable_uri(path), Err(rusqlite::Error::InvalidPath(p)) if p == path));
  }

  #[test]
  fn source_ids() {
    let conn = Connection::open_in_memory().unwrap();
    assert_eq!(Source::path("/a/places.sqlite").id(), "/a/places.sqlite");
    assert_eq!(Source::from(&conn).id(), "<connection>");
  }
}
