//! [`SqliteStore`] — the SQLite implementation of [`EventStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use tracing::{debug, info};
use uuid::Uuid;

use ticketmetal_core::{
  raw::{AggregatedEvent, InternalEvent},
  store::{CatalogQuery, EventStore, NewEvent},
  ticket::{SaleRejection, Ticket, TicketOrder, check_sale, ticket_number},
};

use crate::{
  Result,
  encode::{
    AggregatedRow, INTERNAL_COLUMNS, RawTicket, TICKET_COLUMNS, decode_aggregated,
    encode_dt, encode_instant, encode_uuid, internal_from_row,
  },
  error::Error,
  schema::SCHEMA,
};

const DEFAULT_LIMIT: usize = 50;

// ─── Store ───────────────────────────────────────────────────────────────────

/// An event catalog backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a catalog at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory catalog — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

/// LIMIT and OFFSET values. Sizes beyond `i64::MAX` saturate instead of
/// wrapping to a negative LIMIT, which SQLite reads as "no limit".
fn page(query: &CatalogQuery) -> (i64, i64) {
  let clamp = |n: usize| i64::try_from(n).unwrap_or(i64::MAX);
  (
    clamp(query.limit.unwrap_or(DEFAULT_LIMIT)),
    clamp(query.offset.unwrap_or(0)),
  )
}

// ─── EventStore impl ─────────────────────────────────────────────────────────

impl EventStore for SqliteStore {
  type Error = Error;

  // ── Internal events ───────────────────────────────────────────────────────

  async fn create_event(&self, input: NewEvent) -> Result<InternalEvent> {
    input.validate()?;

    let row = input.clone();
    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO events (
             title, description, date, location, address, city, state,
             price, max_tickets, image_url, organizer, sales_end_date
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
          rusqlite::params![
            row.title,
            row.description,
            row.date,
            row.location,
            row.address,
            row.city,
            row.state,
            row.price,
            row.max_tickets,
            row.image_url,
            row.organizer,
            row.sales_end_date,
          ],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    debug!(id, title = %input.title, "created event");

    Ok(InternalEvent {
      id,
      title: input.title,
      description: input.description,
      date: Some(input.date),
      location: input.location,
      address: input.address,
      city: input.city,
      state: input.state,
      price: input.price,
      max_tickets: input.max_tickets,
      tickets_sold: 0,
      image_url: input.image_url,
      is_active: true,
      rating: None,
      organizer: input.organizer,
      sales_end_date: input.sales_end_date,
    })
  }

  async fn restore_event(&self, event: InternalEvent) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        // Sales already recorded here are never rolled back by a re-import,
        // so ticket serials stay unique.
        conn.execute(
          &format!(
            "INSERT INTO events ({INTERNAL_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
             ON CONFLICT(id) DO UPDATE SET
               title = excluded.title,
               description = excluded.description,
               date = excluded.date,
               location = excluded.location,
               address = excluded.address,
               city = excluded.city,
               state = excluded.state,
               price = excluded.price,
               max_tickets = excluded.max_tickets,
               tickets_sold = MAX(events.tickets_sold, excluded.tickets_sold),
               image_url = excluded.image_url,
               is_active = excluded.is_active,
               rating = excluded.rating,
               organizer = excluded.organizer,
               sales_end_date = excluded.sales_end_date"
          ),
          rusqlite::params![
            event.id,
            event.title,
            event.description,
            event.date,
            event.location,
            event.address,
            event.city,
            event.state,
            event.price,
            event.max_tickets,
            event.tickets_sold,
            event.image_url,
            event.is_active,
            event.rating,
            event.organizer,
            event.sales_end_date,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_event(&self, id: i64) -> Result<Option<InternalEvent>> {
    let event = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {INTERNAL_COLUMNS} FROM events WHERE id = ?1"),
              rusqlite::params![id],
              internal_from_row,
            )
            .optional()?,
        )
      })
      .await?;
    Ok(event)
  }

  async fn update_event(&self, id: i64, input: NewEvent) -> Result<Option<InternalEvent>> {
    input.validate()?;

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE events SET
             title = ?2, description = ?3, date = ?4, location = ?5,
             address = ?6, city = ?7, state = ?8, price = ?9,
             max_tickets = ?10, image_url = ?11, organizer = ?12,
             sales_end_date = ?13
           WHERE id = ?1",
          rusqlite::params![
            id,
            input.title,
            input.description,
            input.date,
            input.location,
            input.address,
            input.city,
            input.state,
            input.price,
            input.max_tickets,
            input.image_url,
            input.organizer,
            input.sales_end_date,
          ],
        )?)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    debug!(id, "updated event");
    self.get_event(id).await
  }

  async fn deactivate_event(&self, id: i64) -> Result<bool> {
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE events SET is_active = 0 WHERE id = ?1",
          rusqlite::params![id],
        )?)
      })
      .await?;
    debug!(id, found = changed > 0, "deactivated event");
    Ok(changed > 0)
  }

  async fn list_events(&self, query: CatalogQuery) -> Result<Vec<InternalEvent>> {
    let (limit, offset) = page(&query);
    let city = query.city;

    let events = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {INTERNAL_COLUMNS} FROM events
           WHERE is_active = 1 AND (?1 IS NULL OR city = ?1)
           ORDER BY id
           LIMIT ?2 OFFSET ?3"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![city, limit, offset], internal_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(events)
  }

  // ── Tickets ───────────────────────────────────────────────────────────────

  async fn issue_tickets(
    &self,
    order: TicketOrder,
  ) -> Result<std::result::Result<Vec<Ticket>, SaleRejection>> {
    let now = Utc::now();
    let event_id = order.event_id;

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let event = tx
          .query_row(
            &format!("SELECT {INTERNAL_COLUMNS} FROM events WHERE id = ?1"),
            rusqlite::params![order.event_id],
            internal_from_row,
          )
          .optional()?;
        let Some(event) = event else {
          return Ok(Err(SaleRejection::EventNotFound));
        };
        if let Err(rejection) = check_sale(&event, order.quantity, now.naive_utc()) {
          return Ok(Err(rejection));
        }

        let mut tickets = Vec::with_capacity(order.quantity as usize);
        for serial in event.tickets_sold + 1..=event.tickets_sold + order.quantity {
          let mut ticket = Ticket {
            id:            0,
            event_id:      event.id,
            ticket_number: ticket_number(event.id, serial),
            qr_code:       Uuid::new_v4(),
            buyer:         order.buyer.clone(),
            price_paid:    event.price,
            purchased_at:  now,
          };
          tx.execute(
            "INSERT INTO tickets (
               event_id, ticket_number, qr_code, buyer, price_paid, purchased_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
              ticket.event_id,
              ticket.ticket_number,
              encode_uuid(ticket.qr_code),
              ticket.buyer,
              ticket.price_paid,
              encode_dt(ticket.purchased_at),
            ],
          )?;
          ticket.id = tx.last_insert_rowid();
          tickets.push(ticket);
        }

        tx.execute(
          "UPDATE events SET tickets_sold = tickets_sold + ?1 WHERE id = ?2",
          rusqlite::params![order.quantity, event.id],
        )?;
        tx.commit()?;
        Ok(Ok(tickets))
      })
      .await?;

    match &outcome {
      Ok(tickets) => info!(event_id, count = tickets.len(), "tickets issued"),
      Err(rejection) => debug!(event_id, %rejection, "sale refused"),
    }
    Ok(outcome)
  }

  async fn get_ticket(&self, id: i64) -> Result<Option<Ticket>> {
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE id = ?1"),
              rusqlite::params![id],
              RawTicket::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawTicket::into_ticket).transpose()
  }

  // ── Aggregated events ─────────────────────────────────────────────────────

  async fn add_aggregated(&self, event: AggregatedEvent) -> Result<()> {
    let row = AggregatedRow::encode(&event)?;
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR REPLACE INTO eventos_rock (id, slug, cidade, starts_at, record_json)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![
            row.id,
            row.slug,
            row.cidade,
            row.starts_at,
            row.record_json,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_aggregated(&self, key: String) -> Result<Option<AggregatedEvent>> {
    // Any UUID spelling matches the stored hyphenated form; numeric ids and
    // slugs are matched verbatim.
    let id = Uuid::parse_str(&key)
      .map(encode_uuid)
      .unwrap_or_else(|_| key.clone());

    let json: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT record_json FROM eventos_rock
               WHERE id = ?1 OR slug = ?2
               LIMIT 1",
              rusqlite::params![id, key],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    json.as_deref().map(decode_aggregated).transpose()
  }

  async fn list_aggregated(
    &self,
    query: CatalogQuery,
    starting_after: Option<DateTime<Utc>>,
  ) -> Result<Vec<AggregatedEvent>> {
    let (limit, offset) = page(&query);
    let city = query.city;
    let from = starting_after.map(encode_instant);

    let rows: Vec<String> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT record_json FROM eventos_rock
           WHERE (?1 IS NULL OR starts_at >= ?1)
             AND (?2 IS NULL OR cidade = ?2)
           ORDER BY starts_at IS NULL, starts_at, id
           LIMIT ?3 OFFSET ?4",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![from, city, limit, offset], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    rows.iter().map(|json| decode_aggregated(json)).collect()
  }
}
