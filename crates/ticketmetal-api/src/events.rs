//! Handlers for `/events` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/events` | Platform events; `?limit&offset&city` |
//! | `POST` | `/events` | Body: [`NewEvent`]; 201 with the stored record |
//! | `GET`  | `/events/rock` | Upcoming aggregated events, soonest first |
//! | `GET`  | `/events/{key}` | Numeric id, UUID or slug; 404 if not found |
//! | `PUT`  | `/events/{key}` | Body: [`NewEvent`]; edits a platform event |
//! | `DELETE` | `/events/{key}` | Withdraws a platform event from sale; 204 |
//! | `GET`  | `/events/{key}/stats` | Ticket statistics of a platform event |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;
use ticketmetal_core::{
  RawEventRecord,
  raw::{AggregatedEvent, InternalEvent},
  stats::EventStats,
  store::{CatalogQuery, EventStore, NewEvent},
};
use tracing::info;

use crate::error::ApiError;

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
  pub city:   Option<String>,
}

impl From<ListParams> for CatalogQuery {
  fn from(p: ListParams) -> Self {
    CatalogQuery {
      limit:  p.limit,
      offset: p.offset,
      city:   p.city.filter(|c| !c.trim().is_empty()),
    }
  }
}

/// `GET /events`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<InternalEvent>>, ApiError>
where
  S: EventStore,
{
  let events = store
    .list_events(params.into())
    .await
    .map_err(ApiError::store)?;
  Ok(Json(events))
}

/// `GET /events/rock`
pub async fn list_rock<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<AggregatedEvent>>, ApiError>
where
  S: EventStore,
{
  let events = store
    .list_aggregated(params.into(), Some(Utc::now()))
    .await
    .map_err(ApiError::store)?;
  Ok(Json(events))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /events`
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewEvent>,
) -> Result<impl IntoResponse, ApiError>
where
  S: EventStore,
{
  body
    .validate()
    .map_err(|e| ApiError::BadRequest(e.to_string()))?;

  let event = store.create_event(body).await.map_err(ApiError::store)?;
  info!(id = event.id, title = %event.title, "event created");
  Ok((StatusCode::CREATED, Json(event)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /events/{key}`
///
/// Numeric keys address platform events first; a numeric key with no
/// platform event, and anything else, is tried as the id or slug of an
/// aggregated event.
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(key): Path<String>,
) -> Result<Json<RawEventRecord>, ApiError>
where
  S: EventStore,
{
  if let Ok(id) = key.parse::<i64>()
    && let Some(event) = store.get_event(id).await.map_err(ApiError::store)?
  {
    return Ok(Json(event.into()));
  }

  store
    .get_aggregated(key.clone())
    .await
    .map_err(ApiError::store)?
    .map(|event| Json(RawEventRecord::from(event)))
    .ok_or_else(|| not_found(&key))
}

// ─── Update / delete ──────────────────────────────────────────────────────────

/// `PUT /events/{key}`
pub async fn update<S>(
  State(store): State<Arc<S>>,
  Path(key): Path<String>,
  Json(body): Json<NewEvent>,
) -> Result<Json<InternalEvent>, ApiError>
where
  S: EventStore,
{
  let id = platform_id(&key)?;
  body
    .validate()
    .map_err(|e| ApiError::BadRequest(e.to_string()))?;

  let event = store
    .update_event(id, body)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| not_found(&key))?;
  info!(id, title = %event.title, "event updated");
  Ok(Json(event))
}

/// `DELETE /events/{key}`
pub async fn delete<S>(
  State(store): State<Arc<S>>,
  Path(key): Path<String>,
) -> Result<StatusCode, ApiError>
where
  S: EventStore,
{
  let id = platform_id(&key)?;
  if !store.deactivate_event(id).await.map_err(ApiError::store)? {
    return Err(not_found(&key));
  }
  info!(id, "event withdrawn");
  Ok(StatusCode::NO_CONTENT)
}

// ─── Stats ────────────────────────────────────────────────────────────────────

/// `GET /events/{key}/stats`
pub async fn stats<S>(
  State(store): State<Arc<S>>,
  Path(key): Path<String>,
) -> Result<Json<EventStats>, ApiError>
where
  S: EventStore,
{
  let id = platform_id(&key)?;
  let event = store
    .get_event(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| not_found(&key))?;
  Ok(Json(EventStats::for_event(&event)))
}

/// Only platform events, addressed by number, are editable and have sales.
fn platform_id(key: &str) -> Result<i64, ApiError> {
  key
    .parse()
    .map_err(|_| ApiError::BadRequest(format!("{key:?} is not a platform event id")))
}

fn not_found(key: &str) -> ApiError { ApiError::NotFound(format!("event {key} not found")) }
