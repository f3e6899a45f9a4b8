//! Conversions between catalog records and SQLite rows.
//!
//! Aggregated events are stored as their JSON wire form; the indexed columns
//! beside it are derived here. UUIDs are stored as hyphenated lowercase
//! strings, start times as `%Y-%m-%dT%H:%M:%S` so they sort lexically.

use chrono::{DateTime, NaiveDateTime, Utc};
use ticketmetal_core::{
  event::parse_event_date,
  raw::{AggregatedEvent, InternalEvent},
  ticket::Ticket,
};
use uuid::Uuid;

use crate::{Error, Result};

const STARTS_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_naive(dt: NaiveDateTime) -> String {
  dt.format(STARTS_AT_FORMAT).to_string()
}

pub fn encode_instant(dt: DateTime<Utc>) -> String {
  encode_naive(dt.naive_utc())
}

// ─── Internal events ─────────────────────────────────────────────────────────

/// Column list matching [`internal_from_row`].
pub const INTERNAL_COLUMNS: &str = "id, title, description, date, location, \
                                    address, city, state, price, max_tickets, \
                                    tickets_sold, image_url, is_active, rating, \
                                    organizer, sales_end_date";

pub fn internal_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<InternalEvent> {
  Ok(InternalEvent {
    id:             row.get(0)?,
    title:          row.get(1)?,
    description:    row.get(2)?,
    date:           row.get(3)?,
    location:       row.get(4)?,
    address:        row.get(5)?,
    city:           row.get(6)?,
    state:          row.get(7)?,
    price:          row.get(8)?,
    max_tickets:    row.get(9)?,
    tickets_sold:   row.get(10)?,
    image_url:      row.get(11)?,
    is_active:      row.get(12)?,
    rating:         row.get(13)?,
    organizer:      row.get(14)?,
    sales_end_date: row.get(15)?,
  })
}

// ─── Tickets ─────────────────────────────────────────────────────────────────

/// Column list matching [`RawTicket::from_row`].
pub const TICKET_COLUMNS: &str =
  "id, event_id, ticket_number, qr_code, buyer, price_paid, purchased_at";

/// A `tickets` row before its text columns are decoded.
pub struct RawTicket {
  pub id:            i64,
  pub event_id:      i64,
  pub ticket_number: String,
  pub qr_code:       String,
  pub buyer:         Option<String>,
  pub price_paid:    f64,
  pub purchased_at:  String,
}

impl RawTicket {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            row.get(0)?,
      event_id:      row.get(1)?,
      ticket_number: row.get(2)?,
      qr_code:       row.get(3)?,
      buyer:         row.get(4)?,
      price_paid:    row.get(5)?,
      purchased_at:  row.get(6)?,
    })
  }

  pub fn into_ticket(self) -> Result<Ticket> {
    Ok(Ticket {
      id:            self.id,
      event_id:      self.event_id,
      ticket_number: self.ticket_number,
      qr_code:       decode_uuid(&self.qr_code)?,
      buyer:         self.buyer,
      price_paid:    self.price_paid,
      purchased_at:  decode_dt(&self.purchased_at)?,
    })
  }
}

// ─── Aggregated events ───────────────────────────────────────────────────────

/// An `eventos_rock` row ready to insert.
pub struct AggregatedRow {
  pub id:          String,
  pub slug:        Option<String>,
  pub cidade:      Option<String>,
  pub starts_at:   Option<String>,
  pub record_json: String,
}

impl AggregatedRow {
  pub fn encode(event: &AggregatedEvent) -> Result<Self> {
    let date = event
      .data_formatada
      .as_deref()
      .or(event.legacy.date.as_deref());
    Ok(Self {
      id:          event.id.to_string(),
      slug:        event.slug.clone().filter(|s| !s.is_empty()),
      cidade:      event.cidade.clone().or_else(|| event.legacy.city.clone()),
      starts_at:   date.and_then(parse_event_date).map(encode_naive),
      record_json: serde_json::to_string(event)?,
    })
  }
}

pub fn decode_aggregated(record_json: &str) -> Result<AggregatedEvent> {
  Ok(serde_json::from_str(record_json)?)
}
