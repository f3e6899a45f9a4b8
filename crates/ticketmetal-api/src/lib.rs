//! JSON REST API for the TicketMetal event catalog.
//!
//! Exposes an axum [`Router`] backed by any [`EventStore`]. The `server`
//! binary mounts it under `/api` over a SQLite store.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", ticketmetal_api::api_router(store.clone()))
//! ```

pub mod error;
pub mod events;
pub mod health;
pub mod reports;
pub mod seed;
pub mod tickets;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, post},
};
use serde::Deserialize;
use ticketmetal_core::store::EventStore;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use error::ApiError;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `TICKETMETAL_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:            String,
  #[serde(default = "default_port")]
  pub port:            u16,
  #[serde(default = "default_store_path")]
  pub store_path:      PathBuf,
  /// JSON array of raw records imported at start-up.
  #[serde(default)]
  pub seed_path:       Option<PathBuf>,
  /// Allow any origin, for a browser storefront served elsewhere.
  #[serde(default)]
  pub cors_permissive: bool,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8000 }

fn default_store_path() -> PathBuf { PathBuf::from("ticketmetal.db") }

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: EventStore + 'static,
{
  Router::new()
    .route("/events", get(events::list::<S>).post(events::create::<S>))
    .route("/events/rock", get(events::list_rock::<S>))
    .route(
      "/events/{key}",
      get(events::get_one::<S>)
        .put(events::update::<S>)
        .delete(events::delete::<S>),
    )
    .route("/events/{key}/stats", get(events::stats::<S>))
    .route("/tickets", post(tickets::issue::<S>))
    .route("/tickets/{id}", get(tickets::get_one::<S>))
    .route("/reports/summary", get(reports::summary::<S>))
    .route("/health", get(health::handler))
    .with_state(store)
}

/// The full application: the API under `/api` plus request tracing, and CORS
/// when enabled.
pub fn app<S>(store: Arc<S>, config: &ServerConfig) -> Router
where
  S: EventStore + 'static,
{
  let app = Router::new().nest("/api", api_router(store));
  let app = if config.cors_permissive {
    app.layer(CorsLayer::permissive())
  } else {
    app
  };
  app.layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests;
