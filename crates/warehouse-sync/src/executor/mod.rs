//! Per-table copy execution.
//!
//! One [`LoadExecutor::copy_table`] call takes a table from "tracker state
//! loaded" to "rows committed and tracker updated", choosing the cheapest
//! copy strategy the table's state allows. Strategy selection is re-derived
//! every run from the shape fingerprint, the stored watermark, and the
//! configured size category; nothing about a previous run's strategy is
//! assumed to still hold.

pub mod staleness;

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::config::{EngineConfig, SizeCategory, TableSpec, Tier};
use crate::core::schema::{KeyValue, Watermark};
use crate::core::value::Row;
use crate::error::{Result, SyncError};
use crate::mapper::{compute_fingerprint, SchemaFingerprint, SchemaMapper};
use crate::store::{ChunkBound, ChunkRequest, ReplicaSource, Warehouse};
use crate::tracker::{LoadStatus, TableTracker, TrackerStore};

use self::staleness::CountComparison;

/// How a table is copied this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CopyStrategy {
    /// Clear the target and copy every row.
    Full,

    /// Single watermark-filtered read, upserted in one pass.
    WatermarkIncremental,

    /// Watermark-filtered keyset pagination, one commit per chunk.
    ChunkedIncremental,

    /// Chunked read streamed through a bounded channel to the writer.
    StreamedIncremental,
}

impl CopyStrategy {
    /// Lowercase name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            CopyStrategy::Full => "full",
            CopyStrategy::WatermarkIncremental => "watermark_incremental",
            CopyStrategy::ChunkedIncremental => "chunked_incremental",
            CopyStrategy::StreamedIncremental => "streamed_incremental",
        }
    }
}

/// How a table copy attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// The copy committed.
    Success,

    /// The copy failed; the tracker keeps the last committed state.
    Failure,

    /// The batch was cancelled before this table started.
    Skipped,
}

/// Outcome of one table copy.
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    /// Table name.
    pub table: String,

    /// Priority tier the table ran under.
    pub tier: Tier,

    /// Strategy used; `None` when the run failed before selection.
    pub strategy: Option<CopyStrategy>,

    /// Rows moved by the selected strategy (healing rows not included).
    pub rows_moved: u64,

    /// Rows re-copied by the stale-state detector.
    pub rows_healed: u64,

    /// Whether the stale-state detector ran a healing copy.
    pub healed: bool,

    /// How the attempt ended.
    pub outcome: RunOutcome,

    /// Informational note (e.g. a detected schema drift).
    pub note: Option<String>,

    /// Error message for failed runs.
    pub error: Option<String>,

    /// Wall-clock duration of the attempt.
    pub elapsed_ms: u64,
}

impl RunResult {
    /// Whether the copy committed.
    pub fn is_success(&self) -> bool {
        self.outcome == RunOutcome::Success
    }

    fn ended(spec: &TableSpec, outcome: RunOutcome, error: SyncError, elapsed: Duration) -> Self {
        Self {
            table: spec.name.clone(),
            tier: spec.tier,
            strategy: None,
            rows_moved: 0,
            rows_healed: 0,
            healed: false,
            outcome,
            note: None,
            error: Some(error.to_string()),
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }

    fn failed(spec: &TableSpec, error: SyncError, elapsed: Duration) -> Self {
        Self::ended(spec, RunOutcome::Failure, error, elapsed)
    }

    fn skipped(spec: &TableSpec, elapsed: Duration) -> Self {
        Self::ended(spec, RunOutcome::Skipped, SyncError::Cancelled, elapsed)
    }
}

/// Result of the strategy-specific copy body.
struct CopyOutcome {
    strategy: CopyStrategy,
    rows_moved: u64,
    rows_healed: u64,
    healed: bool,
    fingerprint: SchemaFingerprint,
    new_watermark: Option<Watermark>,
    source_rows: i64,
    target_rows: i64,
    note: Option<String>,
}

/// Choose the copy strategy for this run.
///
/// Any doubt about the incremental path's soundness resolves to a full copy:
/// no watermark column, no committed fingerprint, a drifted fingerprint, or
/// no stored watermark all disqualify the incremental strategies.
fn select_strategy(spec: &TableSpec, prior: &TableTracker, drifted: bool) -> CopyStrategy {
    if spec.watermark_column.is_none() || drifted || prior.last_watermark.is_none() {
        return CopyStrategy::Full;
    }
    match spec.size_category {
        SizeCategory::Small => CopyStrategy::WatermarkIncremental,
        SizeCategory::Medium => CopyStrategy::ChunkedIncremental,
        SizeCategory::Large => CopyStrategy::StreamedIncremental,
    }
}

/// Retry an operation on transient store errors with exponential backoff.
async fn with_retry<T, F, Fut>(
    engine: &EngineConfig,
    table: &str,
    what: &str,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut attempt: u32 = 0;
    loop {
        match op().await {
            Ok(v) => return Ok(v),
            Err(e) if e.is_transient() && attempt < engine.max_chunk_retries => {
                attempt += 1;
                let delay = engine
                    .retry_base_ms
                    .saturating_mul(2u64.saturating_pow(attempt - 1));
                warn!(
                    table,
                    attempt,
                    delay_ms = delay,
                    "{} failed transiently, retrying: {}",
                    what,
                    e
                );
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Extract the `(watermark, key)` boundary from the last row of a chunk.
fn pair_boundary(
    table: &str,
    row: &Row,
    wm_idx: usize,
    key_idx: usize,
) -> Result<(Watermark, KeyValue)> {
    let wm = Watermark::from_value(&row[wm_idx]).ok_or_else(|| {
        SyncError::copy(table, "watermark value is null or not orderable")
    })?;
    let key = KeyValue::from_value(&row[key_idx])
        .ok_or_else(|| SyncError::copy(table, "primary key value is not orderable"))?;
    Ok((wm, key))
}

fn key_boundary(table: &str, row: &Row, key_idx: usize) -> Result<KeyValue> {
    KeyValue::from_value(&row[key_idx])
        .ok_or_else(|| SyncError::copy(table, "primary key value is not orderable"))
}

/// Executes a single table copy end to end.
pub struct LoadExecutor {
    source: Arc<dyn ReplicaSource>,
    warehouse: Arc<dyn Warehouse>,
    tracker: Arc<dyn TrackerStore>,
    engine: EngineConfig,
    mapper: SchemaMapper,
}

impl LoadExecutor {
    /// Create an executor over the given stores.
    pub fn new(
        source: Arc<dyn ReplicaSource>,
        warehouse: Arc<dyn Warehouse>,
        tracker: Arc<dyn TrackerStore>,
        engine: EngineConfig,
    ) -> Self {
        let mapper = SchemaMapper::new(engine.sample_limit);
        Self {
            source,
            warehouse,
            tracker,
            engine,
            mapper,
        }
    }

    /// Copy one table, honoring the duration budget and cancellation.
    ///
    /// Never panics and never returns `Err`; every failure mode collapses
    /// into a [`RunResult`] so one table cannot take down its siblings.
    pub async fn copy_table(&self, spec: &TableSpec, cancel: &watch::Receiver<bool>) -> RunResult {
        let started = Instant::now();

        if *cancel.borrow() {
            return RunResult::skipped(spec, started.elapsed());
        }

        let prior = match self.tracker.load(&spec.name).await {
            Ok(p) => p,
            Err(e) => return RunResult::failed(spec, e, started.elapsed()),
        };

        let mut running = prior.clone();
        running.status = LoadStatus::Running;
        if let Err(e) = self.tracker.save(&spec.name, &running).await {
            return RunResult::failed(spec, e, started.elapsed());
        }

        let budget = Duration::from_secs(self.engine.table_budget_secs);
        let outcome = match tokio::time::timeout(budget, self.copy_inner(spec, &prior, cancel))
            .await
        {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                self.record_failure(spec, &prior).await;
                return RunResult::failed(spec, e, started.elapsed());
            }
            Err(_) => {
                self.record_failure(spec, &prior).await;
                let e = SyncError::Timeout {
                    table: spec.name.clone(),
                    budget_secs: self.engine.table_budget_secs,
                };
                return RunResult::failed(spec, e, started.elapsed());
            }
        };

        // The watermark and fingerprint advance only here, after every chunk
        // has committed.
        let committed = TableTracker {
            last_watermark: outcome
                .new_watermark
                .clone()
                .or(prior.last_watermark.clone()),
            last_run_at: Some(chrono::Utc::now()),
            last_fingerprint: Some(outcome.fingerprint.clone()),
            last_source_rows: Some(outcome.source_rows),
            last_target_rows: Some(outcome.target_rows),
            status: LoadStatus::Succeeded,
        };
        if let Err(e) = self.tracker.save(&spec.name, &committed).await {
            return RunResult::failed(spec, e, started.elapsed());
        }

        info!(
            table = spec.name,
            strategy = outcome.strategy.name(),
            rows_moved = outcome.rows_moved,
            healed = outcome.healed,
            "table copy committed"
        );

        RunResult {
            table: spec.name.clone(),
            tier: spec.tier,
            strategy: Some(outcome.strategy),
            rows_moved: outcome.rows_moved,
            rows_healed: outcome.rows_healed,
            healed: outcome.healed,
            outcome: RunOutcome::Success,
            note: outcome.note,
            error: None,
            elapsed_ms: started.elapsed().as_millis() as u64,
        }
    }

    async fn record_failure(&self, spec: &TableSpec, prior: &TableTracker) {
        let mut failed = prior.clone();
        failed.status = LoadStatus::Failed;
        failed.last_run_at = Some(chrono::Utc::now());
        if let Err(e) = self.tracker.save(&spec.name, &failed).await {
            warn!(table = spec.name, "could not record failure: {}", e);
        }
    }

    /// The strategy-independent copy body.
    async fn copy_inner(
        &self,
        spec: &TableSpec,
        prior: &TableTracker,
        cancel: &watch::Receiver<bool>,
    ) -> Result<CopyOutcome> {
        let table = spec.name.as_str();

        let source_columns = self.source.fetch_columns(table).await?;
        let fingerprint = compute_fingerprint(&source_columns);
        let drifted = match &prior.last_fingerprint {
            Some(prev) => *prev != fingerprint,
            None => true,
        };
        let mut note = None;
        if drifted && prior.last_fingerprint.is_some() {
            info!(table, "schema drift detected, forcing full copy");
            note = Some("schema drift detected; target rebuilt with a full copy".to_string());
        }

        let target = self
            .mapper
            .map_schema(table, &source_columns, self.source.as_ref())
            .await?;
        let columns = target.column_names();

        let key_col = spec
            .primary_key
            .first()
            .ok_or_else(|| SyncError::copy(table, "no primary key configured"))?;
        let key_idx = columns
            .iter()
            .position(|c| c == key_col)
            .ok_or_else(|| SyncError::copy(table, "primary key column missing from replica"))?;
        let wm_idx = match &spec.watermark_column {
            Some(wm_col) => Some(columns.iter().position(|c| c == wm_col).ok_or_else(|| {
                SyncError::copy(table, "watermark column missing from replica")
            })?),
            None => None,
        };

        self.warehouse
            .ensure_table(table, &target, &spec.primary_key)
            .await?;

        let strategy = select_strategy(spec, prior, drifted);
        debug!(table, strategy = strategy.name(), "strategy selected");

        let (rows_moved, mut new_watermark) = match strategy {
            CopyStrategy::Full => self.full_copy(spec, &columns, key_idx, wm_idx, cancel).await?,
            CopyStrategy::WatermarkIncremental => {
                self.watermark_copy(spec, &columns, wm_idx, prior, cancel)
                    .await?
            }
            CopyStrategy::ChunkedIncremental => {
                self.chunked_copy(spec, &columns, key_idx, wm_idx, prior, cancel)
                    .await?
            }
            CopyStrategy::StreamedIncremental => {
                self.streamed_copy(spec, &columns, key_idx, wm_idx, prior, cancel)
                    .await?
            }
        };

        let mut healed = false;
        let mut rows_healed = 0u64;
        if strategy != CopyStrategy::Full && rows_moved == 0 {
            let counts = CountComparison {
                source_rows: self.source.count_rows(table).await?,
                target_rows: self.warehouse.count_rows(table).await?,
            };
            if counts.needs_heal(self.engine.stale_row_tolerance) {
                warn!(
                    table,
                    source_rows = counts.source_rows,
                    target_rows = counts.target_rows,
                    "quiet incremental copy hides divergent counts, healing with a full copy"
                );
                let (n, wm) = self.full_copy(spec, &columns, key_idx, wm_idx, cancel).await?;
                healed = true;
                rows_healed = n;
                // The stored watermark was ahead of the data; reset it to
                // what the replica actually holds.
                new_watermark = wm;
            }
        }

        let source_rows = self.source.count_rows(table).await?;
        let target_rows = self.warehouse.count_rows(table).await?;

        Ok(CopyOutcome {
            strategy,
            rows_moved,
            rows_healed,
            healed,
            fingerprint,
            new_watermark,
            source_rows,
            target_rows,
            note,
        })
    }

    /// Clear the target and copy everything, paginating by primary key.
    async fn full_copy(
        &self,
        spec: &TableSpec,
        columns: &[String],
        key_idx: usize,
        wm_idx: Option<usize>,
        cancel: &watch::Receiver<bool>,
    ) -> Result<(u64, Option<Watermark>)> {
        let table = spec.name.as_str();
        let chunk_size = spec.chunk_size_or(self.engine.default_chunk_size);

        self.warehouse.clear_table(table).await?;

        let mut moved = 0u64;
        let mut max_wm: Option<Watermark> = None;
        let mut bound: Option<ChunkBound> = None;

        loop {
            if *cancel.borrow() {
                return Err(SyncError::Cancelled);
            }

            let rows = with_retry(&self.engine, table, "reading chunk", || {
                let req = ChunkRequest {
                    table,
                    columns,
                    watermark_column: None,
                    key_column: spec.primary_key[0].as_str(),
                    bound: bound.clone(),
                    limit: Some(chunk_size),
                };
                async move { self.source.read_chunk(&req).await }
            })
            .await?;

            if rows.is_empty() {
                break;
            }

            let done = rows.len() < chunk_size;

            if let Some(idx) = wm_idx {
                for row in &rows {
                    if let Some(wm) = Watermark::from_value(&row[idx]) {
                        max_wm = Some(match max_wm.take() {
                            Some(prev) => prev.later(wm),
                            None => wm,
                        });
                    }
                }
            }
            if let Some(last) = rows.last() {
                bound = Some(ChunkBound::AfterKey(key_boundary(table, last, key_idx)?));
            }

            moved += rows.len() as u64;
            with_retry(&self.engine, table, "appending chunk", || {
                let rows = rows.clone();
                async move { self.warehouse.append_chunk(table, columns, rows).await }
            })
            .await?;

            if done {
                break;
            }
        }

        Ok((moved, max_wm))
    }

    /// Single watermark-filtered read for tables that fit in memory.
    async fn watermark_copy(
        &self,
        spec: &TableSpec,
        columns: &[String],
        wm_idx: Option<usize>,
        prior: &TableTracker,
        cancel: &watch::Receiver<bool>,
    ) -> Result<(u64, Option<Watermark>)> {
        let table = spec.name.as_str();
        let wm_col = watermark_column(spec)?;
        let wm_idx = incremental_wm_idx(table, wm_idx)?;
        let since = stored_watermark(table, prior)?;

        if *cancel.borrow() {
            return Err(SyncError::Cancelled);
        }

        let rows = with_retry(&self.engine, table, "reading rows", || {
            let req = ChunkRequest {
                table,
                columns,
                watermark_column: Some(wm_col),
                key_column: spec.primary_key[0].as_str(),
                bound: Some(ChunkBound::AfterWatermark(since.clone())),
                limit: None,
            };
            async move { self.source.read_chunk(&req).await }
        })
        .await?;

        if rows.is_empty() {
            return Ok((0, None));
        }

        // Rows are ordered by (watermark, key); the last row carries the max.
        let new_wm = rows
            .last()
            .and_then(|r| Watermark::from_value(&r[wm_idx]));

        let moved = rows.len() as u64;
        with_retry(&self.engine, table, "upserting rows", || {
            let rows = rows.clone();
            async move {
                self.warehouse
                    .upsert_chunk(table, columns, &spec.primary_key, rows)
                    .await
            }
        })
        .await?;

        Ok((moved, new_wm))
    }

    /// Watermark-filtered keyset pagination with per-chunk commits.
    async fn chunked_copy(
        &self,
        spec: &TableSpec,
        columns: &[String],
        key_idx: usize,
        wm_idx: Option<usize>,
        prior: &TableTracker,
        cancel: &watch::Receiver<bool>,
    ) -> Result<(u64, Option<Watermark>)> {
        let table = spec.name.as_str();
        let wm_col = watermark_column(spec)?;
        let wm_idx = incremental_wm_idx(table, wm_idx)?;
        let since = stored_watermark(table, prior)?;
        let chunk_size = spec.chunk_size_or(self.engine.default_chunk_size);

        let mut moved = 0u64;
        let mut new_wm: Option<Watermark> = None;
        let mut bound = ChunkBound::AfterWatermark(since);

        loop {
            if *cancel.borrow() {
                return Err(SyncError::Cancelled);
            }

            let rows = with_retry(&self.engine, table, "reading chunk", || {
                let req = ChunkRequest {
                    table,
                    columns,
                    watermark_column: Some(wm_col),
                    key_column: spec.primary_key[0].as_str(),
                    bound: Some(bound.clone()),
                    limit: Some(chunk_size),
                };
                async move { self.source.read_chunk(&req).await }
            })
            .await?;

            if rows.is_empty() {
                break;
            }

            let done = rows.len() < chunk_size;

            if let Some(last) = rows.last() {
                let (wm, key) = pair_boundary(table, last, wm_idx, key_idx)?;
                new_wm = Some(wm.clone());
                bound = ChunkBound::AfterPair(wm, key);
            }

            moved += rows.len() as u64;
            with_retry(&self.engine, table, "upserting chunk", || {
                let rows = rows.clone();
                async move {
                    self.warehouse
                        .upsert_chunk(table, columns, &spec.primary_key, rows)
                        .await
                }
            })
            .await?;

            if done {
                break;
            }
        }

        Ok((moved, new_wm))
    }

    /// Chunked copy with the reader decoupled from the writer by a bounded
    /// channel, so neither side waits on the other and memory stays capped
    /// at `stream_buffer_chunks` chunks.
    async fn streamed_copy(
        &self,
        spec: &TableSpec,
        columns: &[String],
        key_idx: usize,
        wm_idx: Option<usize>,
        prior: &TableTracker,
        cancel: &watch::Receiver<bool>,
    ) -> Result<(u64, Option<Watermark>)> {
        let table = spec.name.as_str();
        let wm_col = watermark_column(spec)?.to_string();
        let wm_idx = incremental_wm_idx(table, wm_idx)?;
        let since = stored_watermark(table, prior)?;
        let chunk_size = spec.chunk_size_or(self.engine.default_chunk_size);

        let (tx, mut rx) = mpsc::channel::<Result<Vec<Row>>>(self.engine.stream_buffer_chunks);

        let reader_source = Arc::clone(&self.source);
        let reader_engine = self.engine.clone();
        let reader_table = spec.name.clone();
        let reader_columns = columns.to_vec();
        let reader_key = spec.primary_key[0].clone();
        let reader_cancel = cancel.clone();

        let reader = tokio::spawn(async move {
            let table = reader_table.as_str();
            let mut bound = ChunkBound::AfterWatermark(since);
            loop {
                if *reader_cancel.borrow() {
                    let _ = tx.send(Err(SyncError::Cancelled)).await;
                    return;
                }

                let read = with_retry(&reader_engine, table, "reading chunk", || {
                    let req = ChunkRequest {
                        table,
                        columns: &reader_columns,
                        watermark_column: Some(wm_col.as_str()),
                        key_column: reader_key.as_str(),
                        bound: Some(bound.clone()),
                        limit: Some(chunk_size),
                    };
                    let source = Arc::clone(&reader_source);
                    async move { source.read_chunk(&req).await }
                })
                .await;

                let rows = match read {
                    Ok(rows) => rows,
                    Err(e) => {
                        let _ = tx.send(Err(e)).await;
                        return;
                    }
                };

                if rows.is_empty() {
                    return;
                }
                let done = rows.len() < chunk_size;

                if let Some(last) = rows.last() {
                    match pair_boundary(table, last, wm_idx, key_idx) {
                        Ok((wm, key)) => bound = ChunkBound::AfterPair(wm, key),
                        Err(e) => {
                            let _ = tx.send(Err(e)).await;
                            return;
                        }
                    }
                }

                // A full channel applies backpressure to the reader here.
                if tx.send(Ok(rows)).await.is_err() {
                    return;
                }
                if done {
                    return;
                }
            }
        });

        let mut moved = 0u64;
        let mut new_wm: Option<Watermark> = None;
        let mut result: Result<()> = Ok(());

        while let Some(item) = rx.recv().await {
            let rows = match item {
                Ok(rows) => rows,
                Err(e) => {
                    result = Err(e);
                    break;
                }
            };
            if *cancel.borrow() {
                result = Err(SyncError::Cancelled);
                break;
            }

            if let Some(last) = rows.last() {
                new_wm = Watermark::from_value(&last[wm_idx]);
            }

            let written = with_retry(&self.engine, table, "upserting chunk", || {
                let rows = rows.clone();
                async move {
                    self.warehouse
                        .upsert_chunk(table, columns, &spec.primary_key, rows)
                        .await
                }
            })
            .await;

            match written {
                Ok(_) => moved += rows.len() as u64,
                Err(e) => {
                    result = Err(e);
                    break;
                }
            }
        }

        // Dropping the receiver unblocks a reader parked on a full channel.
        drop(rx);
        if let Err(e) = reader.await {
            if result.is_ok() {
                result = Err(SyncError::copy(table, format!("reader task failed: {}", e)));
            }
        }
        result?;

        Ok((moved, new_wm))
    }
}

fn watermark_column(spec: &TableSpec) -> Result<&str> {
    spec.watermark_column
        .as_deref()
        .ok_or_else(|| SyncError::copy(&spec.name, "incremental copy without a watermark column"))
}

fn incremental_wm_idx(table: &str, wm_idx: Option<usize>) -> Result<usize> {
    wm_idx.ok_or_else(|| SyncError::copy(table, "incremental copy without a watermark column"))
}

fn stored_watermark(table: &str, prior: &TableTracker) -> Result<Watermark> {
    prior
        .last_watermark
        .clone()
        .ok_or_else(|| SyncError::copy(table, "incremental copy without a stored watermark"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SizeCategory;

    fn spec(size: SizeCategory, watermark: Option<&str>) -> TableSpec {
        TableSpec {
            name: "medication".into(),
            tier: Tier::Medium,
            watermark_column: watermark.map(|s| s.to_string()),
            chunk_size: None,
            primary_key: vec!["medication_id".into()],
            size_category: size,
        }
    }

    fn tracker(watermark: Option<Watermark>, fingerprint: Option<&str>) -> TableTracker {
        TableTracker {
            last_watermark: watermark,
            last_fingerprint: fingerprint.map(|f| f.to_string().into()),
            ..TableTracker::default()
        }
    }

    #[test]
    fn test_no_watermark_column_forces_full() {
        let s = spec(SizeCategory::Large, None);
        let t = tracker(Some(Watermark::Int(5)), Some("fp"));
        assert_eq!(select_strategy(&s, &t, false), CopyStrategy::Full);
    }

    #[test]
    fn test_drift_forces_full() {
        let s = spec(SizeCategory::Small, Some("date_changed"));
        let t = tracker(Some(Watermark::Int(5)), Some("fp"));
        assert_eq!(select_strategy(&s, &t, true), CopyStrategy::Full);
    }

    #[test]
    fn test_first_run_forces_full() {
        let s = spec(SizeCategory::Medium, Some("date_changed"));
        assert_eq!(
            select_strategy(&s, &TableTracker::default(), true),
            CopyStrategy::Full
        );
    }

    #[test]
    fn test_missing_watermark_with_fingerprint_forces_full() {
        // Shape known but no committed watermark: the incremental filter has
        // nothing to compare against.
        let s = spec(SizeCategory::Small, Some("date_changed"));
        let t = tracker(None, Some("fp"));
        assert_eq!(select_strategy(&s, &t, false), CopyStrategy::Full);
    }

    #[test]
    fn test_size_category_picks_incremental_variant() {
        let t = tracker(Some(Watermark::Int(5)), Some("fp"));
        assert_eq!(
            select_strategy(&spec(SizeCategory::Small, Some("w")), &t, false),
            CopyStrategy::WatermarkIncremental
        );
        assert_eq!(
            select_strategy(&spec(SizeCategory::Medium, Some("w")), &t, false),
            CopyStrategy::ChunkedIncremental
        );
        assert_eq!(
            select_strategy(&spec(SizeCategory::Large, Some("w")), &t, false),
            CopyStrategy::StreamedIncremental
        );
    }

    #[test]
    fn test_strategy_names() {
        assert_eq!(CopyStrategy::Full.name(), "full");
        assert_eq!(
            CopyStrategy::StreamedIncremental.name(),
            "streamed_incremental"
        );
    }
}
