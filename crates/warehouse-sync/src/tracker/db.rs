//! Warehouse-resident tracker storage.
//!
//! Tracker state lives in the warehouse itself, in the `_warehouse_sync`
//! schema, so the watermark commits against the same endpoint the rows land
//! in and survives engine restarts without any local files.

use async_trait::async_trait;
use deadpool_postgres::Pool;
use tracing::debug;

use crate::core::schema::Watermark;
use crate::error::{Result, SyncError};
use crate::mapper::SchemaFingerprint;

use super::{LoadStatus, TableTracker, TrackerStore};

/// Schema holding the tracker table.
const TRACKER_SCHEMA: &str = "_warehouse_sync";

/// Tracker store backed by the warehouse database.
pub struct DbTrackerStore {
    pool: Pool,
}

impl DbTrackerStore {
    /// Create a store over an existing warehouse pool.
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Create the tracker schema and table if they do not exist.
    pub async fn init_schema(&self) -> Result<()> {
        let conn = self.pool.get().await?;

        conn.execute(
            &format!("CREATE SCHEMA IF NOT EXISTS {}", TRACKER_SCHEMA),
            &[],
        )
        .await?;

        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {}.table_tracker (
                    table_name TEXT PRIMARY KEY,
                    last_watermark TEXT,
                    last_run_at TIMESTAMPTZ,
                    last_fingerprint TEXT,
                    last_source_rows BIGINT,
                    last_target_rows BIGINT,
                    status TEXT NOT NULL CHECK (status IN ('idle', 'running', 'succeeded', 'failed')),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                )",
                TRACKER_SCHEMA
            ),
            &[],
        )
        .await?;

        debug!("tracker schema ready");
        Ok(())
    }
}

fn status_str(status: LoadStatus) -> &'static str {
    match status {
        LoadStatus::Idle => "idle",
        LoadStatus::Running => "running",
        LoadStatus::Succeeded => "succeeded",
        LoadStatus::Failed => "failed",
    }
}

fn parse_status(s: &str) -> Result<LoadStatus> {
    match s {
        "idle" => Ok(LoadStatus::Idle),
        "running" => Ok(LoadStatus::Running),
        "succeeded" => Ok(LoadStatus::Succeeded),
        "failed" => Ok(LoadStatus::Failed),
        other => Err(SyncError::Tracker(format!("unknown status '{}'", other))),
    }
}

#[async_trait]
impl TrackerStore for DbTrackerStore {
    async fn load(&self, table: &str) -> Result<TableTracker> {
        let conn = self.pool.get().await?;
        let row = conn
            .query_opt(
                &format!(
                    "SELECT last_watermark, last_run_at, last_fingerprint,
                            last_source_rows, last_target_rows, status
                     FROM {}.table_tracker WHERE table_name = $1",
                    TRACKER_SCHEMA
                ),
                &[&table],
            )
            .await?;

        let Some(row) = row else {
            // First sight of this table; the caller gets a blank slate.
            return Ok(TableTracker::default());
        };

        let last_watermark = row
            .get::<_, Option<String>>(0)
            .map(|s| serde_json::from_str::<Watermark>(&s))
            .transpose()
            .map_err(|e| SyncError::Tracker(format!("corrupt watermark for '{}': {}", table, e)))?;

        Ok(TableTracker {
            last_watermark,
            last_run_at: row.get(1),
            last_fingerprint: row
                .get::<_, Option<String>>(2)
                .map(SchemaFingerprint::from),
            last_source_rows: row.get(3),
            last_target_rows: row.get(4),
            status: parse_status(row.get(5))?,
        })
    }

    async fn save(&self, table: &str, tracker: &TableTracker) -> Result<()> {
        let watermark_json = tracker
            .last_watermark
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let fingerprint = tracker.last_fingerprint.as_ref().map(|f| f.as_str());

        let conn = self.pool.get().await?;
        conn.execute(
            &format!(
                "INSERT INTO {}.table_tracker
                    (table_name, last_watermark, last_run_at, last_fingerprint,
                     last_source_rows, last_target_rows, status, updated_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, NOW())
                 ON CONFLICT (table_name) DO UPDATE SET
                    last_watermark = EXCLUDED.last_watermark,
                    last_run_at = EXCLUDED.last_run_at,
                    last_fingerprint = EXCLUDED.last_fingerprint,
                    last_source_rows = EXCLUDED.last_source_rows,
                    last_target_rows = EXCLUDED.last_target_rows,
                    status = EXCLUDED.status,
                    updated_at = NOW()",
                TRACKER_SCHEMA
            ),
            &[
                &table,
                &watermark_json,
                &tracker.last_run_at,
                &fingerprint,
                &tracker.last_source_rows,
                &tracker.last_target_rows,
                &status_str(tracker.status),
            ],
        )
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [
            LoadStatus::Idle,
            LoadStatus::Running,
            LoadStatus::Succeeded,
            LoadStatus::Failed,
        ] {
            assert_eq!(parse_status(status_str(status)).unwrap(), status);
        }
        assert!(parse_status("paused").is_err());
    }

    #[test]
    fn test_watermark_column_format() {
        // The stored text must parse back to the same watermark.
        let wm = Watermark::Int(1090);
        let text = serde_json::to_string(&wm).unwrap();
        assert_eq!(text, r#"{"int":1090}"#);
        let back: Watermark = serde_json::from_str(&text).unwrap();
        assert_eq!(back, wm);
    }
}
