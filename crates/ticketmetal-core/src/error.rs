//! Error types for `ticketmetal-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid event record: {0}")]
  InvalidRecord(String),

  #[error("unknown sort key: {0:?}")]
  UnknownSortKey(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
