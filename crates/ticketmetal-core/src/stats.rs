//! Ticket statistics for platform events and the operator report totals.

use serde::{Deserialize, Serialize};

use crate::raw::InternalEvent;

/// Sales figures for one platform event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventStats {
  pub event_id:          i64,
  pub event_title:       String,
  pub max_tickets:       u32,
  pub tickets_sold:      u32,
  pub tickets_available: u32,
  pub total_revenue:     f64,
  pub average_price:     f64,
  /// Percentage of capacity sold; `0` when capacity is `0`.
  pub occupancy_rate:    f64,
}

impl EventStats {
  pub fn for_event(event: &InternalEvent) -> Self {
    let price = if event.price.is_finite() { event.price.max(0.0) } else { 0.0 };
    let sold = event.tickets_sold;
    let revenue = f64::from(sold) * price;

    Self {
      event_id:          event.id,
      event_title:       event.title.clone(),
      max_tickets:       event.max_tickets,
      tickets_sold:      sold,
      tickets_available: event.max_tickets.saturating_sub(sold),
      total_revenue:     revenue,
      average_price:     if sold > 0 { revenue / f64::from(sold) } else { 0.0 },
      occupancy_rate:    if event.max_tickets > 0 {
        f64::from(sold) * 100.0 / f64::from(event.max_tickets)
      } else {
        0.0
      },
    }
  }
}

/// Totals across every event in a report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
  pub total_events:       usize,
  pub total_tickets_sold: u64,
  pub total_revenue:      f64,
  /// Mean of the per-event occupancy rates.
  pub average_occupancy:  f64,
}

pub fn summarize(stats: &[EventStats]) -> ReportSummary {
  if stats.is_empty() {
    return ReportSummary::default();
  }
  let occupancy: f64 = stats.iter().map(|s| s.occupancy_rate).sum();
  ReportSummary {
    total_events:       stats.len(),
    total_tickets_sold: stats.iter().map(|s| u64::from(s.tickets_sold)).sum(),
    total_revenue:      stats.iter().map(|s| s.total_revenue).sum(),
    average_occupancy:  occupancy / stats.len() as f64,
  }
}
