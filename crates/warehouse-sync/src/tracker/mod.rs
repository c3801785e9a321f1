//! Per-table run tracking.
//!
//! The tracker records, for every synced table, the last successfully
//! committed watermark, the shape fingerprint of the last run, and the row
//! counts observed at commit time. It is the only state carried between batch
//! runs; everything else is recomputed. The executor loads tracker state at
//! the start of a table copy and writes it back exactly once, at commit, so a
//! failed copy never advances the watermark.

pub mod db;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::schema::Watermark;
use crate::error::Result;
use crate::mapper::SchemaFingerprint;

/// Status of the most recent copy attempt for a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStatus {
    /// Never attempted, or tracker row created lazily this run.
    Idle,

    /// A copy is in flight (or was, when the process died).
    Running,

    /// Last copy committed.
    Succeeded,

    /// Last copy failed; the watermark still reflects the last success.
    Failed,
}

/// Tracker state for one table.
///
/// A table never synced before gets a default entry with everything unset,
/// which the strategy selector reads as "first run, copy everything".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableTracker {
    /// Highest watermark committed to the warehouse.
    pub last_watermark: Option<Watermark>,

    /// When the last copy attempt finished.
    pub last_run_at: Option<DateTime<Utc>>,

    /// Shape fingerprint at the last committed copy.
    pub last_fingerprint: Option<SchemaFingerprint>,

    /// Replica row count observed at the last commit.
    pub last_source_rows: Option<i64>,

    /// Warehouse row count observed at the last commit.
    pub last_target_rows: Option<i64>,

    /// Status of the most recent attempt.
    pub status: LoadStatus,
}

impl Default for TableTracker {
    fn default() -> Self {
        Self {
            last_watermark: None,
            last_run_at: None,
            last_fingerprint: None,
            last_source_rows: None,
            last_target_rows: None,
            status: LoadStatus::Idle,
        }
    }
}

/// Persistence seam for tracker state.
#[async_trait]
pub trait TrackerStore: Send + Sync {
    /// Load tracker state for a table, creating a default entry if absent.
    async fn load(&self, table: &str) -> Result<TableTracker>;

    /// Persist tracker state for a table.
    async fn save(&self, table: &str, tracker: &TableTracker) -> Result<()>;
}

/// In-memory tracker store for tests and embedded use.
#[derive(Default)]
pub struct MemoryTrackerStore {
    entries: std::sync::Mutex<std::collections::HashMap<String, TableTracker>>,
}

impl MemoryTrackerStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed tracker state for a table, for tests simulating prior runs.
    pub fn seed(&self, table: &str, tracker: TableTracker) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(table.to_string(), tracker);
    }
}

#[async_trait]
impl TrackerStore for MemoryTrackerStore {
    async fn load(&self, table: &str) -> Result<TableTracker> {
        Ok(self
            .entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(table)
            .cloned()
            .unwrap_or_default())
    }

    async fn save(&self, table: &str, tracker: &TableTracker) -> Result<()> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(table.to_string(), tracker.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_table_loads_default_entry() {
        let store = MemoryTrackerStore::new();
        let tracker = store.load("medication").await.unwrap();
        assert_eq!(tracker.status, LoadStatus::Idle);
        assert!(tracker.last_watermark.is_none());
        assert!(tracker.last_fingerprint.is_none());
    }

    #[tokio::test]
    async fn test_save_then_load_round_trips() {
        let store = MemoryTrackerStore::new();
        let tracker = TableTracker {
            last_watermark: Some(Watermark::Int(1090)),
            last_run_at: Some(Utc::now()),
            last_fingerprint: Some("abc123".to_string().into()),
            last_source_rows: Some(1090),
            last_target_rows: Some(1090),
            status: LoadStatus::Succeeded,
        };
        store.save("medication", &tracker).await.unwrap();

        let loaded = store.load("medication").await.unwrap();
        assert_eq!(loaded.last_watermark, Some(Watermark::Int(1090)));
        assert_eq!(loaded.status, LoadStatus::Succeeded);
        assert_eq!(loaded.last_source_rows, Some(1090));
    }

    #[test]
    fn test_status_serde_names() {
        assert_eq!(
            serde_json::to_string(&LoadStatus::Succeeded).unwrap(),
            "\"succeeded\""
        );
        let back: LoadStatus = serde_json::from_str("\"failed\"").unwrap();
        assert_eq!(back, LoadStatus::Failed);
    }
}
