//! The canonical display model and the normalizer that produces it.
//!
//! [`normalize`] is a pure projection: it never fails, never mutates its input
//! and carries no state between calls. Each field is resolved from the
//! aggregated-schema name first, then the internal-schema name, then a hard
//! default, because records produced during the schema migration may carry
//! both.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::{
  image::{is_valid_image_url, resolve_image_url},
  raw::{AggregatedEvent, InternalEvent, RawEventRecord},
  site::resolve_site_name,
};

// ─── NormalizedEvent ─────────────────────────────────────────────────────────

/// Ticket capacity of a platform event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capacity {
  pub max_tickets:  u32,
  pub tickets_sold: u32,
}

impl Capacity {
  pub fn available(&self) -> u32 {
    self.max_tickets.saturating_sub(self.tickets_sold)
  }
}

/// One event in the shape every view renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedEvent {
  pub id:                    String,
  pub slug:                  Option<String>,
  pub title:                 String,
  pub description:           String,
  /// ISO-8601 start; `None` when absent or unparseable.
  pub date:                  Option<String>,
  /// Free-text door time from aggregated sources.
  pub time:                  Option<String>,
  pub location:              String,
  pub address:               String,
  pub city:                  String,
  pub state:                 String,
  /// Lowest known price; always finite and non-negative.
  pub price:                 f64,
  /// Upper bound of a price range, when the source gives one.
  pub price_max:             Option<f64>,
  /// Always a displayable URL.
  pub image_url:             String,
  pub is_free:               bool,
  /// When set, the event is sold elsewhere and internal checkout is disabled.
  pub external_purchase_url: Option<String>,
  pub source_label:          Option<String>,
  pub artists:               Option<String>,
  pub genres:                Vec<String>,
  pub rating:                Option<f64>,
  pub organizer:             Option<String>,
  pub capacity:              Option<Capacity>,
  pub sales_end:             Option<String>,
  pub is_active:             bool,
}

impl NormalizedEvent {
  /// The slug when present, otherwise the id.
  pub fn route_key(&self) -> &str {
    self
      .slug
      .as_deref()
      .filter(|s| !s.is_empty())
      .unwrap_or(&self.id)
  }

  /// Parsed start time, used for ordering.
  pub fn starts_at(&self) -> Option<NaiveDateTime> {
    self.date.as_deref().and_then(parse_event_date)
  }

  /// Which purchase UI the detail view must render.
  pub fn purchase_flow(&self) -> PurchaseFlow<'_> {
    match &self.external_purchase_url {
      Some(url) => PurchaseFlow::External {
        url,
        vendor: self
          .source_label
          .clone()
          .unwrap_or_else(|| resolve_site_name(url)),
      },
      None => PurchaseFlow::Internal {
        unit_price: self.price,
        is_free:    self.is_free,
        available:  self.capacity.map(|c| c.available()),
      },
    }
  }
}

/// The two mutually exclusive ways an event can be bought.
#[derive(Debug, Clone, PartialEq)]
pub enum PurchaseFlow<'a> {
  /// Quantity selector and simulated checkout on this platform.
  Internal {
    unit_price: f64,
    is_free:    bool,
    /// Remaining tickets, when the capacity is known.
    available:  Option<u32>,
  },
  /// Outbound link to the vendor that actually sells the event.
  External { url: &'a str, vendor: String },
}

// ─── Normalizer ──────────────────────────────────────────────────────────────

/// Project either upstream schema onto [`NormalizedEvent`].
pub fn normalize(raw: &RawEventRecord) -> NormalizedEvent {
  match raw {
    RawEventRecord::Internal(e) => from_internal(e),
    RawEventRecord::Aggregated(e) => from_aggregated(e),
  }
}

fn from_internal(e: &InternalEvent) -> NormalizedEvent {
  NormalizedEvent {
    id:                    e.id.to_string(),
    slug:                  None,
    title:                 e.title.clone(),
    description:           e.description.clone(),
    date:                  normalize_date(e.date.as_deref()),
    time:                  None,
    location:              e.location.clone(),
    address:               e.address.clone(),
    city:                  e.city.clone(),
    state:                 e.state.clone(),
    price:                 first_price(&[Some(e.price)]),
    price_max:             None,
    image_url:             resolve_image_url(valid_image(&[e.image_url.as_deref()])),
    is_free:               false,
    external_purchase_url: None,
    source_label:          None,
    artists:               None,
    genres:                Vec::new(),
    rating:                e.rating.filter(|r| r.is_finite()),
    organizer:             e.organizer.clone(),
    capacity:              Some(Capacity {
      max_tickets:  e.max_tickets,
      tickets_sold: e.tickets_sold,
    }),
    sales_end:             e.sales_end_date.clone(),
    is_active:             e.is_active,
  }
}

fn from_aggregated(e: &AggregatedEvent) -> NormalizedEvent {
  let legacy = &e.legacy;
  let pick = |primary: &Option<String>, fallback: &Option<String>| {
    primary.clone().or_else(|| fallback.clone()).unwrap_or_default()
  };

  let price = first_price(&[e.preco_min, e.preco_max, legacy.price]);
  let price_max = e
    .preco_max
    .filter(|p| p.is_finite() && *p > price);

  let external_purchase_url = e.link_compra.clone().or_else(|| e.link.clone());
  let source_label = e
    .fonte
    .clone()
    .filter(|f| !f.trim().is_empty())
    .or_else(|| external_purchase_url.as_deref().map(resolve_site_name));

  NormalizedEvent {
    id: e.id.to_string(),
    slug: e.slug.clone(),
    title: pick(&e.titulo, &legacy.title),
    description: pick(&e.descricao, &legacy.description),
    date: normalize_date(e.data_formatada.as_deref().or(legacy.date.as_deref())),
    time: e.hora.clone(),
    location: pick(&e.nome_local, &legacy.location),
    address: pick(&e.endereco, &legacy.address),
    city: pick(&e.cidade, &legacy.city),
    state: pick(&e.estado, &legacy.state),
    price,
    price_max,
    image_url: resolve_image_url(valid_image(&[
      e.imagem.as_deref(),
      legacy.image.as_deref(),
    ])),
    is_free: e.evento_gratuito == Some(true),
    external_purchase_url,
    source_label,
    artists: e.artistas.clone(),
    genres: e.generos.clone(),
    rating: legacy.rating.filter(|r| r.is_finite()),
    organizer: legacy.organizer.clone(),
    capacity: legacy.max_tickets.map(|max_tickets| Capacity {
      max_tickets,
      tickets_sold: legacy.tickets_sold.unwrap_or(0),
    }),
    sales_end: legacy.sales_end_date.clone(),
    is_active: legacy.is_active.unwrap_or(true),
  }
}

/// First candidate that is a finite, non-negative price; `0` otherwise.
fn first_price(candidates: &[Option<f64>]) -> f64 {
  candidates
    .iter()
    .flatten()
    .copied()
    .find(|p| p.is_finite() && *p >= 0.0)
    .unwrap_or(0.0)
}

/// First candidate that passes the image validator.
fn valid_image<'a>(candidates: &[Option<&'a str>]) -> Option<&'a str> {
  candidates
    .iter()
    .copied()
    .find(|c| is_valid_image_url(*c))
    .flatten()
}

/// Keep `raw` only when it parses as a date.
fn normalize_date(raw: Option<&str>) -> Option<String> {
  let trimmed = raw?.trim();
  parse_event_date(trimmed).map(|_| trimmed.to_string())
}

// ─── Dates ───────────────────────────────────────────────────────────────────

const NAIVE_FORMATS: &[&str] = &[
  "%Y-%m-%dT%H:%M:%S",
  "%Y-%m-%dT%H:%M:%S%.f",
  "%Y-%m-%dT%H:%M",
  "%Y-%m-%d %H:%M:%S",
  "%Y-%m-%d %H:%M",
];

/// Parse the ISO-8601 variants upstream sources emit.
///
/// Offset-bearing timestamps are converted to UTC; naive timestamps and
/// date-only values are taken as-is (date-only means midnight).
pub fn parse_event_date(raw: &str) -> Option<NaiveDateTime> {
  let raw = raw.trim();
  if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
    return Some(dt.naive_utc());
  }
  if let Some(dt) = NAIVE_FORMATS
    .iter()
    .find_map(|f| NaiveDateTime::parse_from_str(raw, f).ok())
  {
    return Some(dt);
  }
  NaiveDate::parse_from_str(raw, "%Y-%m-%d")
    .ok()
    .and_then(|d| d.and_hms_opt(0, 0, 0))
}
