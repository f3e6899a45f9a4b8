//! Tickets issued for platform events, and the rules a sale must pass.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{
  checkout::MAX_TICKETS_PER_ORDER, event::parse_event_date, raw::InternalEvent,
};

/// One admission to a platform event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
  pub id:            i64,
  pub event_id:      i64,
  /// Human-readable number, see [`ticket_number`].
  pub ticket_number: String,
  /// Opaque code checked at the door.
  pub qr_code:       Uuid,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub buyer:         Option<String>,
  /// Unit price of the event at the time of the sale.
  pub price_paid:    f64,
  pub purchased_at:  DateTime<Utc>,
}

/// A request to buy `quantity` tickets of one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketOrder {
  pub event_id: i64,
  #[serde(default = "one")]
  pub quantity: u32,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub buyer:    Option<String>,
}

fn one() -> u32 { 1 }

/// Why a sale was refused. The messages are shown to buyers as-is.
///
/// Serialises with a `reason` tag so clients can tell the cases apart.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SaleRejection {
  #[error("Evento não encontrado")]
  EventNotFound,

  #[error("Evento não está ativo")]
  Inactive,

  #[error("Ingressos esgotados")]
  SoldOut,

  #[error("Vendas encerradas")]
  SalesClosed,

  #[error("Quantidade inválida: {quantity}")]
  InvalidQuantity { quantity: u32 },
}

/// `TM` followed by the zero-padded event id and serial, e.g. `TM00070451`.
pub fn ticket_number(event_id: i64, serial: u32) -> String {
  format!("TM{event_id:04}{serial:04}")
}

/// Check that `quantity` tickets of `event` may be sold at `now` (UTC).
pub fn check_sale(
  event: &InternalEvent,
  quantity: u32,
  now: NaiveDateTime,
) -> Result<(), SaleRejection> {
  if quantity == 0 || quantity > MAX_TICKETS_PER_ORDER {
    return Err(SaleRejection::InvalidQuantity { quantity });
  }
  if !event.is_active {
    return Err(SaleRejection::Inactive);
  }
  if event.tickets_sold.saturating_add(quantity) > event.max_tickets {
    return Err(SaleRejection::SoldOut);
  }
  if let Some(end) = event.sales_end_date.as_deref().and_then(parse_event_date)
    && now >= end
  {
    return Err(SaleRejection::SalesClosed);
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;

  fn event() -> InternalEvent {
    serde_json::from_value(serde_json::json!({
      "id": 7,
      "title": "Festival",
      "price": 50.0,
      "max_tickets": 100,
      "tickets_sold": 98,
      "sales_end_date": "2024-03-14T23:59:59"
    }))
    .unwrap()
  }

  fn march(day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, day)
      .unwrap()
      .and_hms_opt(12, 0, 0)
      .unwrap()
  }

  #[test]
  fn numbers_are_zero_padded() {
    assert_eq!(ticket_number(7, 451), "TM00070451");
    assert_eq!(ticket_number(12345, 1), "TM123450001");
  }

  #[test]
  fn sale_within_capacity_and_window_passes() {
    assert_eq!(check_sale(&event(), 2, march(1)), Ok(()));
  }

  #[test]
  fn sale_past_capacity_is_sold_out() {
    assert_eq!(check_sale(&event(), 3, march(1)), Err(SaleRejection::SoldOut));
  }

  #[test]
  fn sale_after_deadline_is_closed() {
    assert_eq!(
      check_sale(&event(), 1, march(15)),
      Err(SaleRejection::SalesClosed)
    );
  }

  #[test]
  fn inactive_event_is_refused_first() {
    let mut event = event();
    event.is_active = false;
    event.tickets_sold = event.max_tickets;
    assert_eq!(check_sale(&event, 1, march(1)), Err(SaleRejection::Inactive));
  }

  #[test]
  fn quantity_must_be_between_one_and_the_order_cap() {
    assert_eq!(
      check_sale(&event(), 0, march(1)),
      Err(SaleRejection::InvalidQuantity { quantity: 0 })
    );
    assert!(check_sale(&event(), MAX_TICKETS_PER_ORDER + 1, march(1)).is_err());
  }

  #[test]
  fn order_quantity_defaults_to_one() {
    let order: TicketOrder =
      serde_json::from_value(serde_json::json!({ "event_id": 7 })).unwrap();
    assert_eq!(order.quantity, 1);
    assert_eq!(order.buyer, None);
  }

  #[test]
  fn rejection_messages() {
    assert_eq!(SaleRejection::SoldOut.to_string(), "Ingressos esgotados");
    assert_eq!(SaleRejection::SalesClosed.to_string(), "Vendas encerradas");
  }

  #[test]
  fn rejections_are_tagged_by_reason() {
    let value = serde_json::to_value(SaleRejection::InvalidQuantity { quantity: 0 }).unwrap();
    assert_eq!(value, serde_json::json!({ "reason": "invalid_quantity", "quantity": 0 }));

    let parsed: SaleRejection = serde_json::from_value(serde_json::json!({
      "reason": "sold_out",
      "error": "Ingressos esgotados"
    }))
    .unwrap();
    assert_eq!(parsed, SaleRejection::SoldOut);
  }
}
