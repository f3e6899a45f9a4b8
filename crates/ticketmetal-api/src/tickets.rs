//! Handlers for `/tickets` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/tickets` | Body: [`TicketOrder`]; 201 with the issued tickets |
//! | `GET`  | `/tickets/{id}` | 404 if not found |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use ticketmetal_core::{
  store::EventStore,
  ticket::{Ticket, TicketOrder},
};
use tracing::info;

use crate::error::ApiError;

/// `POST /tickets`
pub async fn issue<S>(
  State(store): State<Arc<S>>,
  Json(order): Json<TicketOrder>,
) -> Result<impl IntoResponse, ApiError>
where
  S: EventStore,
{
  let event_id = order.event_id;
  let tickets = store
    .issue_tickets(order)
    .await
    .map_err(ApiError::store)?
    .map_err(ApiError::Rejected)?;
  info!(event_id, count = tickets.len(), "tickets sold");
  Ok((StatusCode::CREATED, Json(tickets)))
}

/// `GET /tickets/{id}`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<String>,
) -> Result<Json<Ticket>, ApiError>
where
  S: EventStore,
{
  let not_found = || ApiError::NotFound(format!("ticket {id} not found"));
  let Ok(numeric) = id.parse::<i64>() else {
    return Err(not_found());
  };
  store
    .get_ticket(numeric)
    .await
    .map_err(ApiError::store)?
    .map(Json)
    .ok_or_else(not_found)
}
