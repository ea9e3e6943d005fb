//! Cross-source deduplication for `hist merge`.
//!
//! Backups of the same profile repeat most of their history; two visits are
//! the same event when both the URL and the timestamp match.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::record::Visit;

/// Iterator returned by [`dedup_visits`].
#[derive(Debug)]
pub struct Dedup<I> {
  seen:   HashSet<(String, DateTime<Utc>)>,
  visits: I,
}

impl<I> Dedup<I> {
  /// Number of distinct visits emitted so far.
  pub fn distinct(&self) -> usize { self.seen.len() }
}

impl<I> Iterator for Dedup<I>
where
  I: Iterator<Item = Visit>,
{
  type Item = Visit;

  fn next(&mut self) -> Option<Visit> {
    for visit in self.visits.by_ref() {
      if self.seen.insert((visit.url.clone(), visit.visit_date)) {
        return Some(visit);
      }
    }
    None
  }
}

/// Drop visits whose `(url, visit_date)` pair was already emitted, keeping the
/// first occurrence and the original order otherwise.
pub fn dedup_visits<I>(visits: I) -> Dedup<I::IntoIter>
where
  I: IntoIterator<Item = Visit>,
{
  Dedup { seen: HashSet::new(), visits: visits.into_iter() }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn visit(url: &str, secs: i64, title: Option<&str>) -> Visit {
    Visit {
      url:           url.into(),
      visit_date:    DateTime::from_timestamp(secs, 0).unwrap(),
      visit_type:    1,
      title:         title.map(str::to_owned),
      description:   None,
      preview_image: None,
    }
  }

  #[test]
  fn keeps_first_occurrence() {
    let input = vec![
      visit("https://a.example/", 1, Some("old")),
      visit("https://b.example/", 1, None),
      visit("https://a.example/", 1, Some("new")),
    ];
    let out: Vec<Visit> = dedup_visits(input).collect();
    assert_eq!(out.len(), 2);
    assert_eq!(out[0].title.as_deref(), Some("old"));
    assert_eq!(out[1].url, "https://b.example/");
  }

  #[test]
  fn same_url_different_time_is_distinct() {
    let input = vec![visit("https://a.example/", 1, None), visit("https://a.example/", 2, None)];
    let mut dedup = dedup_visits(input);
    assert_eq!(dedup.by_ref().count(), 2);
    assert_eq!(dedup.distinct(), 2);
  }
}
