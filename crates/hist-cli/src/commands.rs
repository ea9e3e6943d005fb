//! `save` and `merge` subcommands.

use std::{
  io::Write,
  path::{Path, PathBuf},
};

use anyhow::{Context as _, Result, bail};
use hist_core::dedup::dedup_visits;
use hist_store_sqlite::{Session, Source, SourceReader, Strategy};
use tracing::{info, warn};

use crate::export::Exporter;

/// Export every visit in `db`, streaming rows straight to `exporter`.
///
/// Returns the number of visits written.
pub fn save<W: Write>(
  reader: &mut SourceReader,
  db: &Path,
  strategy: Strategy,
  exporter: &mut Exporter<W>,
) -> Result<usize> {
  let session = reader.open(Source::path(db))?;
  let written = stream_session(&session, strategy, exporter)?;
  session.close()?;
  info!("wrote {written} visits from {}", db.display());
  Ok(written)
}

fn stream_session<W: Write>(
  session: &Session<'_>,
  strategy: Strategy,
  exporter: &mut Exporter<W>,
) -> Result<usize> {
  let mut written = 0;
  match strategy {
    Strategy::Combined => {
      let mut query = session.combined()?;
      for visit in query.rows()? {
        exporter.write(&visit?).context("failed to write visit")?;
        written += 1;
      }
    }
    Strategy::Merge => {
      let index = session.site_index()?;
      let mut query = session.visits()?;
      for raw in query.rows()? {
        exporter.write(&index.enrich(raw?)).context("failed to write visit")?;
        written += 1;
      }
    }
  }
  Ok(written)
}

/// Outcome of [`merge`].
#[derive(Debug, Default, PartialEq, Eq)]
pub struct MergeSummary {
  pub read:    usize,
  pub skipped: Vec<PathBuf>,
  pub written: usize,
}

/// Export the union of several databases, dropping visits repeated across
/// them.
///
/// Each database is read in full before any of its visits are written, then
/// released; only the set of visits already seen is kept across sources. A
/// database that cannot be read is logged and skipped; the command only fails
/// if none could be read.
pub fn merge<W: Write>(
  reader: &mut SourceReader,
  dbs: &[PathBuf],
  strategy: Strategy,
  exporter: &mut Exporter<W>,
) -> Result<MergeSummary> {
  let mut read = 0;
  let mut skipped = Vec::new();
  let mut written = 0;

  let batches = dbs.iter().filter_map(|db| match reader.read_all(Source::path(db), strategy) {
    Ok(visits) => {
      info!("read {} visits from {}", visits.len(), db.display());
      read += visits.len();
      Some(visits)
    }
    Err(e) => {
      warn!("skipping {e}");
      skipped.push(db.clone());
      None
    }
  });

  for visit in dedup_visits(batches.flatten()) {
    exporter.write(&visit).context("failed to write visit")?;
    written += 1;
  }

  if skipped.len() == dbs.len() {
    bail!("none of the {} databases could be read", dbs.len());
  }

  info!("merged {read} visits into {written} ({} sources skipped)", skipped.len());
  Ok(MergeSummary { read, skipped, written })
}
