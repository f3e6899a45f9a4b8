//! Upstream event records.
//!
//! The API can hand back two differently-shaped records: events created on the
//! platform itself ([`InternalEvent`]) and events scraped from external
//! ticketing sites ([`AggregatedEvent`], Portuguese field names). Both are
//! parsed into the [`RawEventRecord`] tagged union at the deserialization
//! boundary so that nothing downstream has to dig through loose JSON.
//!
//! Upstream tables return `null` for every empty column, so every field that
//! is not an `Option` treats `null` like a missing key.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, de::Error as _};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Internal schema ─────────────────────────────────────────────────────────

/// An event created through the platform's own event flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InternalEvent {
  pub id:             i64,
  #[serde(default, deserialize_with = "null_as_default")]
  pub title:          String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub description:    String,
  /// ISO-8601 start time.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub date:           Option<String>,
  #[serde(default, deserialize_with = "null_as_default")]
  pub location:       String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub address:        String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub city:           String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub state:          String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub price:          f64,
  #[serde(default, deserialize_with = "null_as_default")]
  pub max_tickets:    u32,
  #[serde(default, deserialize_with = "null_as_default")]
  pub tickets_sold:   u32,
  #[serde(default, alias = "image", skip_serializing_if = "Option::is_none")]
  pub image_url:      Option<String>,
  #[serde(default = "active_by_default", deserialize_with = "null_as_active")]
  pub is_active:      bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub rating:         Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub organizer:      Option<String>,
  /// ISO-8601 instant after which tickets are no longer sold.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub sales_end_date: Option<String>,
}

fn active_by_default() -> bool { true }

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
  D: Deserializer<'de>,
  T: Default + Deserialize<'de>,
{
  Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_active<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
  D: Deserializer<'de>,
{
  Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(true))
}

// ─── Aggregated schema ───────────────────────────────────────────────────────

/// Internal-schema field names that may appear on an aggregated record while
/// the two schemas are being merged upstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegacyFields {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub title:       Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub date:        Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub location:    Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub address:     Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub city:        Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub state:       Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub price:          Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub image:          Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub max_tickets:    Option<u32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub tickets_sold:   Option<u32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub is_active:      Option<bool>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub rating:         Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub organizer:      Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub sales_end_date: Option<String>,
}

/// Identifier of an aggregated record: a UUID, or the numeric id of a
/// platform row that already carries aggregated fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AggregatedId {
  Uuid(Uuid),
  Numeric(i64),
}

impl fmt::Display for AggregatedId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Uuid(id) => write!(f, "{}", id.hyphenated()),
      Self::Numeric(id) => write!(f, "{id}"),
    }
  }
}

impl From<Uuid> for AggregatedId {
  fn from(id: Uuid) -> Self { Self::Uuid(id) }
}

/// An event sourced from an external ticketing site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedEvent {
  pub id:              AggregatedId,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub slug:            Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub titulo:          Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub descricao:       Option<String>,
  /// ISO-8601 start time, despite the name.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub data_formatada:  Option<String>,
  /// Free-text door time, e.g. `"20h"`.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub hora:            Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub nome_local:      Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub endereco:        Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub cidade:          Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub estado:          Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub preco_min:       Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub preco_max:       Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub imagem:          Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub evento_gratuito: Option<bool>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub link:            Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub link_compra:     Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub artistas:        Option<String>,
  #[serde(
    default,
    deserialize_with = "null_as_default",
    skip_serializing_if = "Vec::is_empty"
  )]
  pub generos:         Vec<String>,
  /// Name of the site the record was scraped from.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub fonte:           Option<String>,
  #[serde(flatten)]
  pub legacy:          LegacyFields,
}

impl AggregatedEvent {
  /// An aggregated record with only its id set.
  pub fn new(id: impl Into<AggregatedId>) -> Self {
    Self {
      id: id.into(),
      slug: None,
      titulo: None,
      descricao: None,
      data_formatada: None,
      hora: None,
      nome_local: None,
      endereco: None,
      cidade: None,
      estado: None,
      preco_min: None,
      preco_max: None,
      imagem: None,
      evento_gratuito: None,
      link: None,
      link_compra: None,
      artistas: None,
      generos: Vec::new(),
      fonte: None,
      legacy: LegacyFields::default(),
    }
  }
}

// ─── Tagged union ────────────────────────────────────────────────────────────

/// Keys that only ever appear on aggregated records.
const AGGREGATED_KEYS: &[&str] = &[
  "slug",
  "titulo",
  "descricao",
  "data_formatada",
  "hora",
  "nome_local",
  "endereco",
  "cidade",
  "estado",
  "preco_min",
  "preco_max",
  "imagem",
  "evento_gratuito",
  "link",
  "link_compra",
  "artistas",
  "generos",
  "fonte",
];

/// A raw upstream event, classified by schema.
///
/// Serialises as the bare inner record (no tag); deserialisation classifies
/// the object by its keys, see [`RawEventRecord::from_value`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RawEventRecord {
  Internal(InternalEvent),
  Aggregated(AggregatedEvent),
}

impl RawEventRecord {
  /// Parse a JSON object into the matching variant.
  ///
  /// The `id` decides first: a string id is always aggregated. A numeric id
  /// is internal unless the object also carries aggregated-only keys, in which
  /// case it is read as an aggregated record with a numeric id so that both
  /// sets of field names are kept.
  pub fn from_value(value: Value) -> Result<Self> {
    let Value::Object(map) = value else {
      return Err(Error::InvalidRecord("expected a JSON object".into()));
    };

    if is_aggregated(&map) {
      Ok(Self::Aggregated(serde_json::from_value(Value::Object(map))?))
    } else {
      Ok(Self::Internal(serde_json::from_value(Value::Object(map))?))
    }
  }

  /// The opaque identifier as a string.
  pub fn id(&self) -> String {
    match self {
      Self::Internal(e) => e.id.to_string(),
      Self::Aggregated(e) => e.id.to_string(),
    }
  }
}

fn is_aggregated(map: &Map<String, Value>) -> bool {
  map.get("id").is_some_and(Value::is_string)
    || AGGREGATED_KEYS.iter().any(|key| map.contains_key(*key))
}

impl<'de> Deserialize<'de> for RawEventRecord {
  fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
  where
    D: Deserializer<'de>,
  {
    let value = Value::deserialize(deserializer)?;
    Self::from_value(value).map_err(D::Error::custom)
  }
}

impl From<InternalEvent> for RawEventRecord {
  fn from(e: InternalEvent) -> Self { Self::Internal(e) }
}

impl From<AggregatedEvent> for RawEventRecord {
  fn from(e: AggregatedEvent) -> Self { Self::Aggregated(e) }
}
