//! Quantity selection for the internal purchase flow.
//!
//! There is no payment step: a confirmed order is issued by the server and
//! summarised with [`receipt`].

use chrono::NaiveDateTime;

use crate::{
  NormalizedEvent, PurchaseFlow,
  event::parse_event_date,
  format::format_brl,
  ticket::{Ticket, TicketOrder},
};

/// Upper bound per order when the event's capacity is unknown.
pub const MAX_TICKETS_PER_ORDER: u32 = 10;

/// Whether tickets are still on sale at `now`. Events without a (parseable)
/// sales deadline are always on sale.
pub fn sales_open(event: &NormalizedEvent, now: NaiveDateTime) -> bool {
  event
    .sales_end
    .as_deref()
    .and_then(parse_event_date)
    .is_none_or(|end| now < end)
}

/// The quantity selector state for one event.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderDraft {
  unit_price:   f64,
  quantity:     u32,
  max_quantity: u32,
}

impl OrderDraft {
  /// A draft for one ticket, or `None` when the event is sold elsewhere or
  /// has no tickets left.
  pub fn for_event(event: &NormalizedEvent) -> Option<Self> {
    let PurchaseFlow::Internal {
      unit_price,
      is_free,
      available,
    } = event.purchase_flow()
    else {
      return None;
    };

    let max_quantity = available
      .unwrap_or(MAX_TICKETS_PER_ORDER)
      .min(MAX_TICKETS_PER_ORDER);
    if max_quantity == 0 {
      return None;
    }

    Some(Self {
      unit_price: if is_free { 0.0 } else { unit_price },
      quantity: 1,
      max_quantity,
    })
  }

  pub fn quantity(&self) -> u32 { self.quantity }

  pub fn max_quantity(&self) -> u32 { self.max_quantity }

  pub fn increment(&mut self) {
    self.quantity = (self.quantity + 1).min(self.max_quantity);
  }

  pub fn decrement(&mut self) {
    self.quantity = self.quantity.saturating_sub(1).max(1);
  }

  pub fn total(&self) -> f64 { self.unit_price * f64::from(self.quantity) }

  /// The request that buys the selected quantity of event `event_id`.
  pub fn order(&self, event_id: i64) -> TicketOrder {
    TicketOrder {
      event_id,
      quantity: self.quantity,
      buyer: None,
    }
  }
}

/// The notification shown once tickets are issued.
pub fn receipt(tickets: &[Ticket]) -> String {
  let total: f64 = tickets.iter().map(|t| t.price_paid).sum();
  let numbers: Vec<&str> = tickets.iter().map(|t| t.ticket_number.as_str()).collect();
  format!(
    "{} ingresso(s) emitido(s): {}. Total: {}",
    tickets.len(),
    numbers.join(", "),
    format_brl(total)
  )
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;
  use uuid::Uuid;

  use super::*;
  use crate::{
    normalize,
    raw::{AggregatedEvent, InternalEvent, RawEventRecord},
  };

  fn internal(max: u32, sold: u32, price: f64) -> NormalizedEvent {
    let raw: InternalEvent = serde_json::from_value(serde_json::json!({
      "id": 1,
      "title": "Festival",
      "price": price,
      "max_tickets": max,
      "tickets_sold": sold,
      "sales_end_date": "2024-03-14T23:59:59"
    }))
    .unwrap();
    normalize(&RawEventRecord::from(raw))
  }

  fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
      .unwrap()
      .and_hms_opt(12, 0, 0)
      .unwrap()
  }

  #[test]
  fn quantity_is_clamped_to_availability() {
    let mut draft = OrderDraft::for_event(&internal(500, 497, 50.0)).unwrap();
    assert_eq!(draft.max_quantity(), 3);
    for _ in 0..5 {
      draft.increment();
    }
    assert_eq!(draft.quantity(), 3);
    assert_eq!(draft.total(), 150.0);

    for _ in 0..5 {
      draft.decrement();
    }
    assert_eq!(draft.quantity(), 1);
  }

  #[test]
  fn quantity_is_capped_per_order() {
    let draft = OrderDraft::for_event(&internal(500, 0, 50.0)).unwrap();
    assert_eq!(draft.max_quantity(), MAX_TICKETS_PER_ORDER);
  }

  #[test]
  fn sold_out_events_have_no_draft() {
    assert!(OrderDraft::for_event(&internal(100, 100, 50.0)).is_none());
  }

  #[test]
  fn external_events_have_no_draft() {
    let mut raw = AggregatedEvent::new(Uuid::new_v4());
    raw.link_compra = Some("https://www.sympla.com.br/x".into());
    assert!(OrderDraft::for_event(&normalize(&raw.into())).is_none());
  }

  #[test]
  fn order_carries_the_selected_quantity() {
    let mut draft = OrderDraft::for_event(&internal(500, 0, 50.0)).unwrap();
    draft.increment();
    let order = draft.order(1);
    assert_eq!(order.event_id, 1);
    assert_eq!(order.quantity, 2);
  }

  #[test]
  fn receipt_lists_numbers_and_total() {
    let ticket = |n: &str| Ticket {
      id:            1,
      event_id:      1,
      ticket_number: n.into(),
      qr_code:       Uuid::nil(),
      buyer:         None,
      price_paid:    50.0,
      purchased_at:  chrono::Utc::now(),
    };
    assert_eq!(
      receipt(&[ticket("TM00010451"), ticket("TM00010452")]),
      "2 ingresso(s) emitido(s): TM00010451, TM00010452. Total: R$ 100,00"
    );
  }

  #[test]
  fn sales_window() {
    let event = internal(500, 0, 50.0);
    assert!(sales_open(&event, at(2024, 3, 1)));
    assert!(!sales_open(&event, at(2024, 3, 15)));

    let mut no_deadline = event.clone();
    no_deadline.sales_end = None;
    assert!(sales_open(&no_deadline, at(2099, 1, 1)));
  }
}
