//! [`SourceReader`]: schema validation and session opening.

use std::{
  collections::HashMap,
  path::{Path, PathBuf},
};

use hist_core::Visit;
use rusqlite::ErrorCode;
use tracing::{debug, error};

use crate::{
  Error, Result, schema,
  source::{Session, Source, open_immutable},
};

// ─── Probe ───────────────────────────────────────────────────────────────────

/// Checks that a store on disk has the expected structure.
pub trait SchemaProbe {
  fn probe(&self, path: &Path) -> rusqlite::Result<()>;
}

/// The production probe: open the store immutably and select from
/// `moz_meta`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlacesProbe;

impl SchemaProbe for PlacesProbe {
  fn probe(&self, path: &Path) -> rusqlite::Result<()> {
    let conn = open_immutable(path)?;
    let mut stmt = conn.prepare(schema::PROBE)?;
    stmt.query([])?.next()?;
    Ok(())
  }
}

/// SQLite failures that mean the file could not be opened or read at all, as
/// opposed to a readable database with the wrong tables.
fn is_access_failure(err: &rusqlite::Error) -> bool {
  match err {
    rusqlite::Error::SqliteFailure(e, _) => matches!(
      e.code,
      ErrorCode::CannotOpen
        | ErrorCode::PermissionDenied
        | ErrorCode::DatabaseBusy
        | ErrorCode::DatabaseLocked
        | ErrorCode::NotADatabase
        | ErrorCode::DatabaseCorrupt
        | ErrorCode::SystemIoFailure
        | ErrorCode::OutOfMemory
    ),
    rusqlite::Error::InvalidPath(_) => true,
    _ => false,
  }
}

// ─── Reader ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Validation {
  Valid,
  Rejected(String),
}

/// How [`SourceReader::read_all`] assembles visits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
  /// One joined query; no in-memory index.
  #[default]
  Combined,
  /// Separate visit and metadata queries reconciled by
  /// [`hist_core::merge`].
  Merge,
}

/// Opens history stores and remembers which paths passed validation.
///
/// The validation cache lives as long as the reader. Drop the reader (or call
/// [`clear_validation_cache`](Self::clear_validation_cache)) to forget it.
#[derive(Debug, Default)]
pub struct SourceReader<P = PlacesProbe> {
  probe:     P,
  validated: HashMap<PathBuf, Validation>,
}

impl SourceReader {
  pub fn new() -> Self { Self::default() }
}

impl<P: SchemaProbe> SourceReader<P> {
  /// A reader that validates with `probe` instead of [`PlacesProbe`].
  pub fn with_probe(probe: P) -> Self {
    Self { probe, validated: HashMap::new() }
  }

  pub fn probe(&self) -> &P { &self.probe }

  /// Check that `source` is a places database.
  ///
  /// Each distinct path is probed at most once per reader; later calls return
  /// the cached verdict. Failures to open or read the file are not cached.
  /// Borrowed connections are trusted and never probed.
  pub fn validate_schema(&mut self, source: &Source<'_>) -> Result<()> {
    let Source::Path(path) = source else {
      return Ok(());
    };

    if let Some(verdict) = self.validated.get(path) {
      return verdict_result(path, verdict);
    }

    let verdict = match self.probe.probe(path) {
      Ok(()) => Validation::Valid,
      Err(e) if is_access_failure(&e) => {
        return Err(Error::access(&path.display().to_string(), e));
      }
      Err(e) => {
        error!(
          source = %path.display(),
          "could not select from moz_meta; not a history database in the expected format: {e}"
        );
        Validation::Rejected(e.to_string())
      }
    };

    let result = verdict_result(path, &verdict);
    self.validated.insert(path.clone(), verdict);
    result
  }

  /// Whether `path` already has a cached verdict.
  pub fn is_cached(&self, path: &Path) -> bool { self.validated.contains_key(path) }

  pub fn clear_validation_cache(&mut self) { self.validated.clear(); }

  /// Validate `source` and open a session on it.
  ///
  /// Paths get a fresh read-only, immutable connection owned by the session.
  /// Borrowed connections are reused as-is.
  pub fn open<'c>(&mut self, source: Source<'c>) -> Result<Session<'c>> {
    self.validate_schema(&source)?;
    let source_id = source.id();
    match source {
      Source::Path(path) => {
        debug!(source = %source_id, "opening read-only");
        let conn = open_immutable(&path).map_err(|e| Error::access(&source_id, e))?;
        Ok(Session::owned(source_id, conn))
      }
      Source::Connection(conn) => Ok(Session::borrowed(source_id, conn)),
    }
  }

  /// Read every visit from `source`.
  ///
  /// Unlike iterating a [`Session`], this yields nothing at all if any row
  /// fails.
  pub fn read_all(&mut self, source: Source<'_>, strategy: Strategy) -> Result<Vec<Visit>> {
    let session = self.open(source)?;
    let visits = match strategy {
      Strategy::Combined => session.combined()?.collect_all()?,
      Strategy::Merge => {
        let index = session.site_index()?;
        let mut query = session.visits()?;
        let mut visits = Vec::new();
        for raw in query.rows()? {
          visits.push(index.enrich(raw?));
        }
        visits
      }
    };
    session.close()?;
    Ok(visits)
  }
}

fn verdict_result(path: &Path, verdict: &Validation) -> Result<()> {
  match verdict {
    Validation::Valid => Ok(()),
    Validation::Rejected(reason) => Err(Error::Schema {
      source_id: path.display().to_string(),
      reason:    reason.clone(),
    }),
  }
}
