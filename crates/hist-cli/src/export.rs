//! Streaming JSON / JSON Lines writer for [`Visit`]s.
//!
//! Records are serialised as they arrive; the JSON array brackets are written
//! around them so nothing has to be collected first.

use std::{
  io::{self, BufWriter, StdoutLock, Write},
  path::{Path, PathBuf},
};

use hist_core::Visit;
use tempfile::NamedTempFile;

use crate::config::Format;

pub struct Exporter<W: Write> {
  writer:  W,
  format:  Format,
  pretty:  bool,
  written: usize,
}

impl<W: Write> Exporter<W> {
  pub fn new(writer: W, format: Format, pretty: bool) -> Self {
    Self { writer, format, pretty, written: 0 }
  }

  pub fn written(&self) -> usize { self.written }

  pub fn write(&mut self, visit: &Visit) -> io::Result<()> {
    match self.format {
      Format::Jsonl => {
        serde_json::to_writer(&mut self.writer, visit)?;
        self.writer.write_all(b"\n")?;
      }
      Format::Json => {
        let sep: &[u8] = if self.written == 0 { b"[\n" } else { b",\n" };
        self.writer.write_all(sep)?;
        if self.pretty {
          serde_json::to_writer_pretty(&mut self.writer, visit)?;
        } else {
          serde_json::to_writer(&mut self.writer, visit)?;
        }
      }
    }
    self.written += 1;
    Ok(())
  }

  /// Close the array (for JSON), flush, and hand back the writer.
  pub fn finish(mut self) -> io::Result<W> {
    if self.format == Format::Json {
      let tail: &[u8] = if self.written == 0 { b"[]\n" } else { b"\n]\n" };
      self.writer.write_all(tail)?;
    }
    self.writer.flush()?;
    Ok(self.writer)
  }
}

// ─── Output ──────────────────────────────────────────────────────────────────

/// Where an export goes.
///
/// A file export is staged in a temporary file next to its destination and
/// only renamed over it by [`commit`](Self::commit). Dropping an uncommitted
/// output removes the temporary file and leaves the destination as it was.
/// Stdout cannot be taken back: whatever was written before a failure has
/// already been emitted.
pub enum Output {
  File { staged: BufWriter<NamedTempFile>, dest: PathBuf },
  Stdout(BufWriter<StdoutLock<'static>>),
}

impl Output {
  pub fn file(dest: &Path) -> io::Result<Self> {
    let dir = match dest.parent() {
      Some(dir) if !dir.as_os_str().is_empty() => dir,
      _ => Path::new("."),
    };
    let staged = NamedTempFile::new_in(dir)?;
    Ok(Self::File { staged: BufWriter::new(staged), dest: dest.to_path_buf() })
  }

  pub fn stdout() -> Self { Self::Stdout(BufWriter::new(io::stdout().lock())) }

  /// Flush and, for a file, move the staged export into place.
  pub fn commit(self) -> io::Result<()> {
    match self {
      Self::File { staged, dest } => {
        let staged = staged.into_inner().map_err(io::IntoInnerError::into_error)?;
        staged.persist(&dest)?;
        Ok(())
      }
      Self::Stdout(mut out) => out.flush(),
    }
  }
}

impl Write for Output {
  fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
    match self {
      Self::File { staged, .. } => staged.write(buf),
      Self::Stdout(out) => out.write(buf),
    }
  }

  fn flush(&mut self) -> io::Result<()> {
    match self {
      Self::File { staged, .. } => staged.flush(),
      Self::Stdout(out) => out.flush(),
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::DateTime;
  use tempfile::TempDir;

  use super::*;

  fn visit(url: &str, title: Option<&str>) -> Visit {
    Visit {
      url:           url.into(),
      visit_date:    DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
      visit_type:    1,
      title:         title.map(str::to_owned),
      description:   None,
      preview_image: None,
    }
  }

  fn export(format: Format, visits: &[Visit]) -> String {
    let mut exporter = Exporter::new(Vec::new(), format, false);
    for v in visits {
      exporter.write(v).unwrap();
    }
    String::from_utf8(exporter.finish().unwrap()).unwrap()
  }

  #[test]
  fn json_array_parses_back() {
    let out = export(Format::Json, &[visit("https://a.example/", Some("A")), visit("https://b.example/", None)]);
    let parsed: Vec<Visit> = serde_json::from_str(&out).unwrap();
    assert_eq!(parsed.len(), 2);
    assert_eq!(parsed[0].title.as_deref(), Some("A"));
    assert_eq!(parsed[1].url, "https://b.example/");
  }

  #[test]
  fn empty_json_is_empty_array() {
    let out = export(Format::Json, &[]);
    assert_eq!(out, "[]\n");
  }

  #[test]
  fn jsonl_writes_one_object_per_line() {
    let out = export(Format::Jsonl, &[visit("https://a.example/", None), visit("https://b.example/", None)]);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 2);
    let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(first["url"], "https://a.example/");
    assert_eq!(first["visit_date"], "2023-11-14T22:13:20Z");
  }

  #[test]
  fn pretty_json_still_parses() {
    let mut exporter = Exporter::new(Vec::new(), Format::Json, true);
    exporter.write(&visit("https://a.example/", None)).unwrap();
    assert_eq!(exporter.written(), 1);
    let out = String::from_utf8(exporter.finish().unwrap()).unwrap();
    let parsed: Vec<Visit> = serde_json::from_str(&out).unwrap();
    assert_eq!(parsed.len(), 1);
  }

  #[test]
  fn file_output_appears_only_on_commit() {
    let dir = TempDir::new().unwrap();
    let dest = dir.path().join("history.json");

    let mut exporter = Exporter::new(Output::file(&dest).unwrap(), Format::Json, false);
    exporter.write(&visit("https://a.example/", None)).unwrap();
    assert!(!dest.exists());

    exporter.finish().unwrap().commit().unwrap();
    let parsed: Vec<Visit> = serde_json::from_slice(&std::fs::read(&dest).unwrap()).unwrap();
    assert_eq!(parsed.len(), 1);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
  }

  #[test]
  fn dropped_output_keeps_existing_file() {
    let dir = TempDir::new().unwrap();
    let dest = dir.path().join("history.json");
    std::fs::write(&dest, "[]\n").unwrap();

    let mut exporter = Exporter::new(Output::file(&dest).unwrap(), Format::Json, false);
    exporter.write(&visit("https://a.example/", None)).unwrap();
    drop(exporter);

    assert_eq!(std::fs::read_to_string(&dest).unwrap(), "[]\n");
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
  }
}
