//! Read-only storage snapshots fed to the aggregation engine.

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::Deserialize;
use tracing::debug;

use crate::data_source::{SourceError, SourceFuture};
use crate::{CoreError, StockQuote};

/// Point-in-time collection of stored stock records.
///
/// Implementations return only active records; the core never writes back.
pub trait SnapshotSource: Send + Sync {
    fn snapshot(&self) -> SourceFuture<'_, Vec<StockQuote>>;
}

/// Snapshot held in memory and replaced wholesale by its owner.
#[derive(Debug, Default)]
pub struct InMemorySnapshot {
    records: RwLock<Vec<StockQuote>>,
}

impl InMemorySnapshot {
    pub fn new(records: Vec<StockQuote>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    pub fn replace(&self, records: Vec<StockQuote>) {
        match self.records.write() {
            Ok(mut guard) => *guard = records,
            Err(poisoned) => *poisoned.into_inner() = records,
        }
    }
}

impl SnapshotSource for InMemorySnapshot {
    fn snapshot(&self) -> SourceFuture<'_, Vec<StockQuote>> {
        let records = match self.records.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        Box::pin(async move { Ok(records) })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredStock {
    #[serde(flatten)]
    quote: StockQuote,
    #[serde(default = "active_by_default")]
    is_active: bool,
}

fn active_by_default() -> bool {
    true
}

/// Snapshot read from a JSON array of stored stock records on every call.
///
/// Records flagged `"isActive": false` are dropped. A missing file or a
/// document that is not an array of records is an internal error.
#[derive(Debug, Clone)]
pub struct JsonFileSnapshot {
    path: PathBuf,
}

impl JsonFileSnapshot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_active(&self) -> Result<Vec<StockQuote>, CoreError> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        let stored: Vec<StoredStock> = serde_json::from_str(&raw)?;

        let total = stored.len();
        let active: Vec<StockQuote> = stored
            .into_iter()
            .filter(|record| record.is_active)
            .map(|record| record.quote)
            .collect();
        debug!(
            path = %self.path.display(),
            total,
            active = active.len(),
            "loaded stock snapshot"
        );

        Ok(active)
    }
}

impl SnapshotSource for JsonFileSnapshot {
    fn snapshot(&self) -> SourceFuture<'_, Vec<StockQuote>> {
        Box::pin(async move {
            self.read_active().await.map_err(|err| {
                SourceError::internal(format!("snapshot '{}': {err}", self.path.display()))
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Symbol, UtcDateTime};

    fn quote(symbol: &str) -> StockQuote {
        StockQuote::from_prices(
            Symbol::parse(symbol).expect("symbol"),
            symbol,
            Some(String::from("Banking")),
            10.0,
            9.0,
            100,
            1_000.0,
            "AED",
            UtcDateTime::now(),
        )
    }

    #[tokio::test]
    async fn in_memory_snapshot_returns_replaced_records() {
        let source = InMemorySnapshot::new(vec![quote("ENBD")]);
        assert_eq!(source.snapshot().await.expect("snapshot").len(), 1);

        source.replace(vec![quote("ENBD"), quote("DFM")]);
        let records = source.snapshot().await.expect("snapshot");
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].symbol.as_str(), "DFM");
    }

    #[tokio::test]
    async fn missing_file_is_internal_error() {
        let source = JsonFileSnapshot::new("/definitely/not/here/stocks.json");
        let err = source.snapshot().await.expect_err("must fail");
        assert_eq!(err.code(), "INTERNAL_ERROR");
    }
}
