//! `GET /reports/summary` — sales totals across every active platform event.

use std::sync::Arc;

use axum::{Json, extract::State};
use serde::Serialize;
use ticketmetal_core::{
  stats::{EventStats, ReportSummary, summarize},
  store::{CatalogQuery, EventStore},
};

use crate::error::ApiError;

const PAGE: usize = 200;

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
  #[serde(flatten)]
  pub summary: ReportSummary,
  pub events:  Vec<EventStats>,
}

pub async fn summary<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<SummaryResponse>, ApiError>
where
  S: EventStore,
{
  let mut stats = Vec::new();
  let mut offset = 0;
  loop {
    let page = store
      .list_events(CatalogQuery {
        limit:  Some(PAGE),
        offset: Some(offset),
        city:   None,
      })
      .await
      .map_err(ApiError::store)?;
    let fetched = page.len();
    stats.extend(page.iter().map(EventStats::for_event));
    if fetched < PAGE {
      break;
    }
    offset += fetched;
  }

  Ok(Json(SummaryResponse {
    summary: summarize(&stats),
    events:  stats,
  }))
}
