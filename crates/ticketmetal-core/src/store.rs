//! The `EventStore` trait and the catalog's write/query types.
//!
//! Implemented by storage backends (`ticketmetal-store-sqlite`); the API
//! server only depends on this abstraction.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  event::parse_event_date,
  raw::{AggregatedEvent, InternalEvent},
  ticket::{SaleRejection, Ticket, TicketOrder},
};

// ─── Input types ─────────────────────────────────────────────────────────────

/// A platform event as submitted by an organizer. The store assigns the id
/// and starts the sales counter at zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEvent {
  pub title:          String,
  #[serde(default)]
  pub description:    String,
  pub date:           String,
  #[serde(default)]
  pub location:       String,
  #[serde(default)]
  pub address:        String,
  #[serde(default)]
  pub city:           String,
  #[serde(default)]
  pub state:          String,
  pub price:          f64,
  pub max_tickets:    u32,
  #[serde(default)]
  pub image_url:      Option<String>,
  #[serde(default)]
  pub organizer:      Option<String>,
  #[serde(default)]
  pub sales_end_date: Option<String>,
}

impl NewEvent {
  /// Reject submissions the catalog cannot display sensibly.
  pub fn validate(&self) -> Result<()> {
    if self.title.trim().is_empty() {
      return Err(Error::InvalidRecord("title must not be empty".into()));
    }
    if !self.price.is_finite() || self.price < 0.0 {
      return Err(Error::InvalidRecord(format!(
        "price must be a non-negative number, got {}",
        self.price
      )));
    }
    if parse_event_date(&self.date).is_none() {
      return Err(Error::InvalidRecord(format!(
        "unrecognised date: {:?}",
        self.date
      )));
    }
    if let Some(end) = &self.sales_end_date
      && parse_event_date(end).is_none()
    {
      return Err(Error::InvalidRecord(format!(
        "unrecognised sales end date: {end:?}"
      )));
    }
    Ok(())
  }
}

/// Paging and filtering for catalog listings.
#[derive(Debug, Clone, Default)]
pub struct CatalogQuery {
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
  /// Exact city match.
  pub city:   Option<String>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the event catalog backend.
///
/// Internal events are addressed by their numeric id; aggregated events by
/// UUID or slug.
pub trait EventStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Internal events ───────────────────────────────────────────────────

  /// Persist a new platform event and return it with its assigned id.
  fn create_event(
    &self,
    input: NewEvent,
  ) -> impl Future<Output = Result<InternalEvent, Self::Error>> + Send + '_;

  /// Insert or replace an internal event keeping its id. Used when seeding.
  fn restore_event(
    &self,
    event: InternalEvent,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_event(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<InternalEvent>, Self::Error>> + Send + '_;

  /// Overwrite the organizer-editable fields of an event. Sales, rating and
  /// the active flag are kept. `None` when the id is unknown.
  fn update_event(
    &self,
    id: i64,
    input: NewEvent,
  ) -> impl Future<Output = Result<Option<InternalEvent>, Self::Error>> + Send + '_;

  /// Withdraw an event from sale and from listings. Issued tickets stay
  /// valid. Returns `false` when the id is unknown.
  fn deactivate_event(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Active events, oldest id first.
  fn list_events(
    &self,
    query: CatalogQuery,
  ) -> impl Future<Output = Result<Vec<InternalEvent>, Self::Error>> + Send + '_;

  // ── Tickets ───────────────────────────────────────────────────────────

  /// Sell `order.quantity` tickets atomically and bump the event's sales
  /// counter. A refused sale leaves the store untouched.
  fn issue_tickets(
    &self,
    order: TicketOrder,
  ) -> impl Future<Output = Result<Result<Vec<Ticket>, SaleRejection>, Self::Error>>
  + Send
  + '_;

  fn get_ticket(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Ticket>, Self::Error>> + Send + '_;

  // ── Aggregated events ─────────────────────────────────────────────────

  /// Insert or replace an aggregated event by id.
  fn add_aggregated(
    &self,
    event: AggregatedEvent,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Look up by id (UUID in any spelling, or a numeric id) or slug.
  fn get_aggregated(
    &self,
    key: String,
  ) -> impl Future<Output = Result<Option<AggregatedEvent>, Self::Error>> + Send + '_;

  /// Aggregated events ordered by date. With `starting_after`, only events
  /// dated at or after that instant are returned; undated events are then
  /// excluded.
  fn list_aggregated(
    &self,
    query: CatalogQuery,
    starting_after: Option<DateTime<Utc>>,
  ) -> impl Future<Output = Result<Vec<AggregatedEvent>, Self::Error>> + Send + '_;
}
