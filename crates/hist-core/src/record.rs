//! Normalised record shapes that flow from the store reader to the exporter.
//!
//! `RawVisit` and `RawSiteMetadata` mirror the two independently-keyed row
//! sets in a places database; `Visit` is the merged output record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─── Raw rows ────────────────────────────────────────────────────────────────

/// A single visit event, one per `moz_historyvisits` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawVisit {
  /// Percent-decoded page URL.
  pub url:        String,
  /// Foreign key into the page table; joins with [`RawSiteMetadata::page_id`].
  pub page_id:    i64,
  pub visit_id:   i64,
  pub visit_date: DateTime<Utc>,
  /// How the visit happened (typed, link, bookmark, redirect, ...). Passed
  /// through untouched.
  pub visit_type: i64,
}

/// Title/description/preview image for a page.
///
/// Only produced for pages where at least one of the three fields is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSiteMetadata {
  pub page_id:       i64,
  pub title:         Option<String>,
  pub description:   Option<String>,
  /// Percent-decoded preview image URL.
  pub preview_image: Option<String>,
}

// ─── Output ──────────────────────────────────────────────────────────────────

/// A visit enriched with the metadata of the page it landed on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visit {
  pub url:           String,
  pub visit_date:    DateTime<Utc>,
  pub visit_type:    i64,
  pub title:         Option<String>,
  pub description:   Option<String>,
  pub preview_image: Option<String>,
}

impl Visit {
  /// Build the output record for `visit`, copying the metadata fields from
  /// `site` when one matched.
  pub fn from_parts(visit: RawVisit, site: Option<&RawSiteMetadata>) -> Self {
    let (title, description, preview_image) = match site {
      Some(s) => (s.title.clone(), s.description.clone(), s.preview_image.clone()),
      None => (None, None, None),
    };

    Self {
      url: visit.url,
      visit_date: visit.visit_date,
      visit_type: visit.visit_type,
      title,
      description,
      preview_image,
    }
  }

  /// `true` when no page metadata was attached.
  pub fn is_bare(&self) -> bool {
    self.title.is_none() && self.description.is_none() && self.preview_image.is_none()
  }
}
