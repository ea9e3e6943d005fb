//! Reconciles visit events with page metadata keyed by `page_id`.
//!
//! Pure and in-memory. The metadata side is consumed in full into a
//! [`SiteIndex`] before the first visit is emitted; visits themselves stream
//! through one at a time in input order.

use std::collections::HashMap;

use crate::record::{RawSiteMetadata, RawVisit, Visit};

// ─── Index ───────────────────────────────────────────────────────────────────

/// Lookup from `page_id` to the metadata row for that page.
///
/// Built by plain key assignment, so a repeated `page_id` keeps the row seen
/// last.
#[derive(Debug, Clone, Default)]
pub struct SiteIndex {
  sites: HashMap<i64, RawSiteMetadata>,
}

impl SiteIndex {
  pub fn new() -> Self { Self::default() }

  pub fn insert(&mut self, site: RawSiteMetadata) {
    self.sites.insert(site.page_id, site);
  }

  pub fn get(&self, page_id: i64) -> Option<&RawSiteMetadata> {
    self.sites.get(&page_id)
  }

  pub fn len(&self) -> usize { self.sites.len() }

  pub fn is_empty(&self) -> bool { self.sites.is_empty() }

  /// Attach the metadata for `visit.page_id`, if any.
  pub fn enrich(&self, visit: RawVisit) -> Visit {
    let site = self.get(visit.page_id);
    Visit::from_parts(visit, site)
  }
}

impl FromIterator<RawSiteMetadata> for SiteIndex {
  fn from_iter<T: IntoIterator<Item = RawSiteMetadata>>(iter: T) -> Self {
    let mut index = Self::new();
    index.extend(iter);
    index
  }
}

impl Extend<RawSiteMetadata> for SiteIndex {
  fn extend<T: IntoIterator<Item = RawSiteMetadata>>(&mut self, iter: T) {
    for site in iter {
      self.insert(site);
    }
  }
}

// ─── Merge ───────────────────────────────────────────────────────────────────

/// Iterator returned by [`merge`]. Yields exactly one [`Visit`] per input
/// [`RawVisit`].
#[derive(Debug)]
pub struct Merge<I> {
  index:  SiteIndex,
  visits: I,
}

impl<I> Merge<I> {
  pub fn index(&self) -> &SiteIndex { &self.index }
}

impl<I> Iterator for Merge<I>
where
  I: Iterator<Item = RawVisit>,
{
  type Item = Visit;

  fn next(&mut self) -> Option<Visit> {
    self.visits.next().map(|v| self.index.enrich(v))
  }

  fn size_hint(&self) -> (usize, Option<usize>) { self.visits.size_hint() }
}

impl<I> ExactSizeIterator for Merge<I> where I: ExactSizeIterator<Item = RawVisit> {}

/// Combine the visits and site metadata read from one source.
///
/// `metadata` is drained completely before this returns; `visits` is pulled
/// lazily as the result is iterated.
pub fn merge<V, M>(visits: V, metadata: M) -> Merge<V::IntoIter>
where
  V: IntoIterator<Item = RawVisit>,
  M: IntoIterator<Item = RawSiteMetadata>,
{
  Merge {
    index:  metadata.into_iter().collect(),
    visits: visits.into_iter(),
  }
}

#[cfg(test)]
mod tests {
  use chrono::{DateTime, Utc};

  use super::*;

  fn at(secs: i64) -> DateTime<Utc> { DateTime::from_timestamp(secs, 0).unwrap() }

  fn visit(visit_id: i64, page_id: i64) -> RawVisit {
    RawVisit {
      url: format!("https://example.com/{page_id}"),
      page_id,
      visit_id,
      visit_date: at(1_700_000_000 + visit_id),
      visit_type: 1,
    }
  }

  fn site(page_id: i64, title: &str) -> RawSiteMetadata {
    RawSiteMetadata {
      page_id,
      title: Some(title.into()),
      description: Some(format!("{title} description")),
      preview_image: None,
    }
  }

  #[test]
  fn two_visits_one_site() {
    let out: Vec<Visit> = merge(vec![visit(1, 1), visit(2, 2)], vec![site(1, "Home")]).collect();

    assert_eq!(out.len(), 2);
    assert_eq!(out[0].url, "https://example.com/1");
    assert_eq!(out[0].title.as_deref(), Some("Home"));
    assert_eq!(out[0].description.as_deref(), Some("Home description"));
    assert_eq!(out[1].url, "https://example.com/2");
    assert!(out[1].is_bare());
  }

  #[test]
  fn output_length_matches_visits() {
    let visits: Vec<RawVisit> = (0..50).map(|i| visit(i, i % 7)).collect();
    let sites = vec![site(0, "zero"), site(3, "three"), site(99, "unused")];

    let merged = merge(visits.clone(), sites);
    assert_eq!(merged.len(), visits.len());

    let out: Vec<Visit> = merged.collect();
    assert_eq!(out.len(), visits.len());
    for (raw, merged) in visits.iter().zip(&out) {
      assert_eq!(raw.url, merged.url);
      assert_eq!(raw.visit_date, merged.visit_date);
    }
  }

  #[test]
  fn repeated_page_visits_share_metadata() {
    let out: Vec<Visit> =
      merge(vec![visit(1, 5), visit(2, 5), visit(3, 5)], vec![site(5, "Five")]).collect();
    assert_eq!(out.len(), 3);
    assert!(out.iter().all(|v| v.title.as_deref() == Some("Five")));
  }

  #[test]
  fn duplicate_page_id_last_wins() {
    let out: Vec<Visit> =
      merge(vec![visit(1, 1)], vec![site(1, "first"), site(1, "second")]).collect();
    assert_eq!(out[0].title.as_deref(), Some("second"));
    assert_eq!(out[0].description.as_deref(), Some("second description"));
  }

  #[test]
  fn empty_metadata_leaves_all_bare() {
    let out: Vec<Visit> = merge(vec![visit(1, 1), visit(2, 2)], Vec::<RawSiteMetadata>::new()).collect();
    assert_eq!(out.len(), 2);
    assert!(out.iter().all(Visit::is_bare));
  }

  #[test]
  fn empty_visits_yield_nothing() {
    let merged = merge(Vec::<RawVisit>::new(), vec![site(1, "Home")]);
    assert_eq!(merged.index().len(), 1);
    assert_eq!(merged.count(), 0);
  }

  #[test]
  fn metadata_is_indexed_before_first_visit() {
    let merged = merge(std::iter::empty::<RawVisit>(), (0..4).map(|i| site(i, "x")));
    assert_eq!(merged.index().len(), 4);
  }
}
