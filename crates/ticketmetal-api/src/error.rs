//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use thiserror::Error;
use ticketmetal_core::ticket::SaleRejection;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// A ticket sale the event's state does not allow.
  #[error("sale refused: {0}")]
  Rejected(SaleRejection),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Rejected(rejection) => return rejected(rejection),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}

/// `{"error": <message>, "reason": <tag>, ...}`; 404 for a missing event,
/// 400 otherwise.
fn rejected(rejection: &SaleRejection) -> Response {
  let status = match rejection {
    SaleRejection::EventNotFound => StatusCode::NOT_FOUND,
    _ => StatusCode::BAD_REQUEST,
  };
  let mut body = match serde_json::to_value(rejection) {
    Ok(Value::Object(map)) => map,
    _ => serde_json::Map::new(),
  };
  body.insert("error".into(), Value::String(rejection.to_string()));
  (status, Json(Value::Object(body))).into_response()
}
