//! Async HTTP client for the TicketMetal JSON API.

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;
use strum::{Display, EnumString};
use thiserror::Error;
use ticketmetal_core::{
  RawEventRecord,
  source::{EventSource, FeedQuery, decode_page},
  ticket::{SaleRejection, Ticket, TicketOrder},
};
use tracing::{debug, warn};

/// Which upstream list the storefront shows.
#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Deserialize,
  Display,
  EnumString,
  clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Feed {
  /// Events created on the platform (`/events`).
  #[default]
  Platform,
  /// Upcoming events scraped from ticketing sites (`/events/rock`).
  Aggregated,
}

impl Feed {
  fn path(self) -> &'static str {
    match self {
      Feed::Platform => "/events",
      Feed::Aggregated => "/events/rock",
    }
  }
}

/// Connection settings for the API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  pub feed:     Feed,
}

#[derive(Debug, Error)]
pub enum ClientError {
  #[error("invalid server URL {0:?}")]
  BaseUrl(String),

  #[error("network error: {0}")]
  Network(#[from] reqwest::Error),

  #[error("{path} → HTTP {status}")]
  Status { path: String, status: StatusCode },
}

/// Async HTTP client for the catalog API.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  base:   Url,
  feed:   Feed,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self, ClientError> {
    let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
    let base = Url::parse(config.base_url.trim_end_matches('/'))
      .map_err(|_| ClientError::BaseUrl(config.base_url.clone()))?;
    if base.cannot_be_a_base() {
      return Err(ClientError::BaseUrl(config.base_url));
    }
    Ok(Self {
      client,
      base,
      feed: config.feed,
    })
  }

  /// `<base>/api` followed by `segments`, each percent-encoded.
  fn url(&self, segments: &[&str]) -> Url {
    let mut url = self.base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
      path.pop_if_empty().push("api").extend(segments);
    }
    url
  }

  /// Resolve a site-relative image path against the server.
  fn image_url(&self, src: &str) -> Option<Url> {
    if src.starts_with('/') {
      self.base.join(src).ok()
    } else {
      Url::parse(src).ok()
    }
  }
}

fn segments(path: &str) -> Vec<&str> {
  path.split('/').filter(|s| !s.is_empty()).collect()
}

impl EventSource for ApiClient {
  type Error = ClientError;

  /// `GET /api/events` or `GET /api/events/rock`, depending on the feed.
  async fn get_events(&self, query: FeedQuery) -> Result<Vec<RawEventRecord>, ClientError> {
    let path = self.feed.path();
    let mut params = vec![
      ("limit", query.limit.to_string()),
      ("offset", query.offset.to_string()),
    ];
    if let Some(city) = query.city {
      params.push(("city", city));
    }

    let resp = self
      .client
      .get(self.url(&segments(path)))
      .query(&params)
      .send()
      .await?;

    if !resp.status().is_success() {
      return Err(ClientError::Status {
        path:   path.to_string(),
        status: resp.status(),
      });
    }
    let values: Vec<Value> = resp.json().await?;
    let page = decode_page(values);
    for (index, error) in &page.skipped {
      warn!(index, %error, feed = %self.feed, "skipping malformed event record");
    }
    debug!(count = page.records.len(), feed = %self.feed, "fetched events");
    Ok(page.records)
  }

  /// `GET /api/events/{key}`; `None` on 404.
  async fn get_event(&self, key: String) -> Result<Option<RawEventRecord>, ClientError> {
    let resp = self
      .client
      .get(self.url(&["events", &key]))
      .send()
      .await?;

    match resp.status() {
      StatusCode::NOT_FOUND => Ok(None),
      status if status.is_success() => Ok(Some(resp.json().await?)),
      status => Err(ClientError::Status {
        path: format!("/events/{key}"),
        status,
      }),
    }
  }

  /// `POST /api/tickets`. A 400 or 404 carrying a sale rejection is a
  /// refused sale, not an error.
  async fn purchase(
    &self,
    order: TicketOrder,
  ) -> Result<Result<Vec<Ticket>, SaleRejection>, ClientError> {
    let resp = self
      .client
      .post(self.url(&["tickets"]))
      .json(&order)
      .send()
      .await?;

    let status = resp.status();
    if status.is_success() {
      return Ok(Ok(resp.json().await?));
    }
    if matches!(status, StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND) {
      let body: Value = resp.json().await?;
      if let Some(rejection) = rejection(body) {
        return Ok(Err(rejection));
      }
    }
    Err(ClientError::Status {
      path: "/tickets".into(),
      status,
    })
  }

  /// `HEAD` the image; inline `data:` payloads are always displayable.
  async fn image_reachable(&self, src: String) -> bool {
    if src.starts_with("data:") {
      return true;
    }
    let Some(url) = self.image_url(&src) else {
      return false;
    };
    match self.client.head(url).send().await {
      Ok(resp) => resp.status().is_success(),
      Err(e) => {
        debug!(error = %e, src, "image check failed");
        false
      }
    }
  }
}

/// The sale rejection carried by an error body, if it is one.
fn rejection(body: Value) -> Option<SaleRejection> {
  serde_json::from_value(body).ok()
}
