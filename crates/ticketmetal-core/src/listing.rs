//! Client-side search and ordering over normalized events.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{Error, NormalizedEvent, Result};

/// Ordering applied to a listing.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum SortKey {
  /// Soonest first.
  #[default]
  DateAsc,
  DateDesc,
  /// Cheapest first.
  Price,
  /// Best rated first.
  Rating,
}

impl SortKey {
  pub const ALL: [SortKey; 4] =
    [Self::DateAsc, Self::DateDesc, Self::Price, Self::Rating];

  /// Parse `date-asc`, `date-desc`, `price` or `rating`.
  pub fn parse(s: &str) -> Result<Self> {
    s.parse().map_err(|_| Error::UnknownSortKey(s.to_string()))
  }

  /// The next key in [`SortKey::ALL`], wrapping around.
  pub fn next(self) -> Self {
    let i = Self::ALL.iter().position(|k| *k == self).unwrap_or(0);
    Self::ALL[(i + 1) % Self::ALL.len()]
  }

  /// pt-BR label for the storefront.
  pub fn label(self) -> &'static str {
    match self {
      Self::DateAsc => "Data ↑",
      Self::DateDesc => "Data ↓",
      Self::Price => "Preço",
      Self::Rating => "Avaliação",
    }
  }
}

/// Everything the list view filters and orders by.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingQuery {
  /// Case-insensitive substring matched against title, description,
  /// location and city.
  pub text: String,
  /// Date-only prefix such as `2024-03-15`.
  pub date: Option<String>,
  pub sort: SortKey,
}

impl ListingQuery {
  pub fn apply<'a>(&self, events: &'a [NormalizedEvent]) -> Vec<&'a NormalizedEvent> {
    filter_and_sort(events, &self.text, self.date.as_deref(), self.sort)
  }
}

/// Filter `events` by `query` and `date_filter`, then stable-sort by `sort`.
///
/// Events without a parseable date sort last under both date orders; events
/// without a rating sort last under [`SortKey::Rating`].
pub fn filter_and_sort<'a>(
  events: &'a [NormalizedEvent],
  query: &str,
  date_filter: Option<&str>,
  sort: SortKey,
) -> Vec<&'a NormalizedEvent> {
  let needle = query.trim().to_lowercase();
  let date_prefix = date_filter.map(str::trim).filter(|d| !d.is_empty());

  let mut out: Vec<&NormalizedEvent> = events
    .iter()
    .filter(|e| matches_text(e, &needle))
    .filter(|e| match date_prefix {
      Some(prefix) => e.date.as_deref().is_some_and(|d| d.starts_with(prefix)),
      None => true,
    })
    .collect();

  match sort {
    SortKey::DateAsc => {
      out.sort_by(|a, b| missing_last(a.starts_at(), b.starts_at(), |x, y| x.cmp(y)))
    }
    SortKey::DateDesc => {
      out.sort_by(|a, b| missing_last(a.starts_at(), b.starts_at(), |x, y| y.cmp(x)))
    }
    SortKey::Price => out.sort_by(|a, b| a.price.total_cmp(&b.price)),
    SortKey::Rating => {
      out.sort_by(|a, b| missing_last(a.rating, b.rating, |x, y| y.total_cmp(x)))
    }
  }
  out
}

fn matches_text(event: &NormalizedEvent, needle: &str) -> bool {
  needle.is_empty()
    || [
      &event.title,
      &event.description,
      &event.location,
      &event.city,
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(needle))
}

fn missing_last<T>(
  a: Option<T>,
  b: Option<T>,
  cmp: impl FnOnce(&T, &T) -> Ordering,
) -> Ordering {
  match (a, b) {
    (Some(x), Some(y)) => cmp(&x, &y),
    (Some(_), None) => Ordering::Less,
    (None, Some(_)) => Ordering::Greater,
    (None, None) => Ordering::Equal,
  }
}
