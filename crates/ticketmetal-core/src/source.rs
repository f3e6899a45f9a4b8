//! The `EventSource` trait: where the storefront gets its raw records from.
//!
//! The terminal client implements it over HTTP; tests implement it in memory.

use std::future::Future;

use serde_json::Value;
use thiserror::Error;

use crate::{
  NormalizedEvent, RawEventRecord, normalize,
  ticket::{SaleRejection, Ticket, TicketOrder},
};

/// Page and filter for [`EventSource::get_events`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedQuery {
  pub limit:  usize,
  pub offset: usize,
  pub city:   Option<String>,
}

impl Default for FeedQuery {
  fn default() -> Self {
    Self {
      limit:  50,
      offset: 0,
      city:   None,
    }
  }
}

/// Read access to the upstream event feed.
pub trait EventSource: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn get_events(
    &self,
    query: FeedQuery,
  ) -> impl Future<Output = Result<Vec<RawEventRecord>, Self::Error>> + Send + '_;

  /// Look up one record by id or slug. `None` when nothing matches.
  fn get_event(
    &self,
    key: String,
  ) -> impl Future<Output = Result<Option<RawEventRecord>, Self::Error>> + Send + '_;

  /// Buy tickets of a platform event. A refused sale is `Ok(Err(_))`.
  fn purchase(
    &self,
    order: TicketOrder,
  ) -> impl Future<Output = Result<Result<Vec<Ticket>, SaleRejection>, Self::Error>>
  + Send
  + '_;

  /// Whether `url` can actually be fetched as an image. Sources that cannot
  /// tell report every URL as reachable.
  fn image_reachable(&self, url: String) -> impl Future<Output = bool> + Send + '_ {
    let _ = url;
    async { true }
  }
}

/// Failure while loading a single event.
#[derive(Debug, Error)]
pub enum FetchError<E> {
  #[error("event not found: {0}")]
  NotFound(String),

  #[error(transparent)]
  Source(E),
}

/// A page of records parsed one element at a time.
#[derive(Debug, Default)]
pub struct DecodedPage {
  pub records: Vec<RawEventRecord>,
  /// Position and parse error of every element that fit neither schema.
  pub skipped: Vec<(usize, crate::Error)>,
}

/// Parse each element of a page on its own so that one malformed record
/// does not cost the rest of the page.
pub fn decode_page(values: Vec<Value>) -> DecodedPage {
  let mut page = DecodedPage::default();
  for (index, value) in values.into_iter().enumerate() {
    match RawEventRecord::from_value(value) {
      Ok(record) => page.records.push(record),
      Err(e) => page.skipped.push((index, e)),
    }
  }
  page
}

/// Fetch a page of records and normalize each one.
pub async fn load_listing<S: EventSource>(
  source: &S,
  query: &FeedQuery,
) -> Result<Vec<NormalizedEvent>, S::Error> {
  let raw = source.get_events(query.clone()).await?;
  Ok(raw.iter().map(normalize).collect())
}

/// Fetch one record by id or slug and normalize it.
pub async fn load_event<S: EventSource>(
  source: &S,
  key: &str,
) -> Result<NormalizedEvent, FetchError<S::Error>> {
  match source.get_event(key.to_string()).await {
    Ok(Some(raw)) => Ok(normalize(&raw)),
    Ok(None) => Err(FetchError::NotFound(key.to_string())),
    Err(e) => Err(FetchError::Source(e)),
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn malformed_elements_are_skipped_not_fatal() {
    let page = decode_page(vec![
      json!({ "id": 1, "title": "Show" }),
      json!("garbage"),
      json!({ "id": "not-a-uuid", "titulo": "X" }),
      json!({ "id": "7d9f2c1e-0000-4000-8000-000000000001", "titulo": "METAL FEST" }),
    ]);

    assert_eq!(page.records.len(), 2);
    let positions: Vec<usize> = page.skipped.iter().map(|(i, _)| *i).collect();
    assert_eq!(positions, vec![1, 2]);
  }
}
