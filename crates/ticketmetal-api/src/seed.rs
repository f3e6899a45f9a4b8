//! Start-up import of a JSON array of raw event records.

use std::path::Path;

use ticketmetal_core::{RawEventRecord, store::EventStore};
use tracing::{debug, info};

/// How many records of each schema were imported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
  pub internal:   usize,
  pub aggregated: usize,
}

/// Store every record, keeping internal ids and aggregated UUIDs.
pub async fn import<S: EventStore>(
  store: &S,
  records: Vec<RawEventRecord>,
) -> Result<SeedReport, S::Error> {
  let mut report = SeedReport::default();
  for record in records {
    debug!(id = %record.id(), "importing seed record");
    match record {
      RawEventRecord::Internal(event) => {
        store.restore_event(event).await?;
        report.internal += 1;
      }
      RawEventRecord::Aggregated(event) => {
        store.add_aggregated(event).await?;
        report.aggregated += 1;
      }
    }
  }
  info!(
    internal = report.internal,
    aggregated = report.aggregated,
    "seed imported"
  );
  Ok(report)
}

/// Parse a seed file. Any record that fits neither schema fails the whole file.
pub fn read_file(path: &Path) -> anyhow::Result<Vec<RawEventRecord>> {
  use anyhow::Context as _;

  let text = std::fs::read_to_string(path)
    .with_context(|| format!("failed to read seed file {path:?}"))?;
  serde_json::from_str(&text)
    .with_context(|| format!("failed to parse seed file {path:?}"))
}
