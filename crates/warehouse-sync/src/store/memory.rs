//! In-memory store implementations.
//!
//! The second concrete implementation behind the store seams: used by every
//! engine test, with hooks to mutate rows and inject failures mid-run.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::core::schema::{Column, KeyValue, TargetSchema, Watermark};
use crate::core::value::Row;
use crate::error::{Result, SyncError};

use super::{ChunkBound, ChunkRequest, ReplicaSource, Warehouse};

struct SourceTable {
    columns: Vec<Column>,
    rows: Vec<Row>,
}

#[derive(Default)]
struct SourceInner {
    tables: HashMap<String, SourceTable>,
    // Remaining transient read failures per table.
    transient_failures: HashMap<String, u32>,
    // Tables that fail every read.
    broken: HashMap<String, String>,
}

/// In-memory replica source.
#[derive(Clone, Default)]
pub struct MemorySource {
    inner: Arc<Mutex<SourceInner>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table with its columns and rows.
    pub fn insert_table(&self, name: &str, columns: Vec<Column>, rows: Vec<Row>) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .tables
            .insert(name.to_string(), SourceTable { columns, rows });
    }

    /// Append rows to an existing table.
    pub fn push_rows(&self, name: &str, rows: Vec<Row>) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(table) = inner.tables.get_mut(name) {
            table.rows.extend(rows);
        }
    }

    /// Replace a table's column set, keeping its rows (schema drift).
    pub fn set_columns(&self, name: &str, columns: Vec<Column>) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(table) = inner.tables.get_mut(name) {
            table.columns = columns;
        }
    }

    /// Fail the next `n` chunk reads for a table with a transient error.
    pub fn fail_transiently(&self, name: &str, n: u32) {
        let mut inner = self.inner.lock().unwrap();
        inner.transient_failures.insert(name.to_string(), n);
    }

    /// Fail every read for a table.
    pub fn break_table(&self, name: &str, message: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.broken.insert(name.to_string(), message.to_string());
    }

    fn check_broken(inner: &SourceInner, table: &str) -> Result<()> {
        if let Some(msg) = inner.broken.get(table) {
            return Err(SyncError::store(msg.clone(), format!("reading {table}")));
        }
        Ok(())
    }
}

/// Ordering for optional watermarks: absent sorts first, cross-variant
/// mismatches fall back to equal (uniform within one table in practice).
fn cmp_watermark(a: &Option<Watermark>, b: &Option<Watermark>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => {
            if x.is_after(y) {
                Ordering::Greater
            } else if y.is_after(x) {
                Ordering::Less
            } else {
                Ordering::Equal
            }
        }
    }
}

fn col_index(columns: &[Column], name: &str) -> Result<usize> {
    columns
        .iter()
        .position(|c| c.name == name)
        .ok_or_else(|| SyncError::store(format!("no such column: {name}"), "memory source"))
}

#[async_trait]
impl ReplicaSource for MemorySource {
    async fn fetch_columns(&self, table: &str) -> Result<Vec<Column>> {
        let inner = self.inner.lock().unwrap();
        Self::check_broken(&inner, table)?;
        inner
            .tables
            .get(table)
            .map(|t| t.columns.clone())
            .ok_or_else(|| SyncError::store(format!("no such table: {table}"), "memory source"))
    }

    async fn count_rows(&self, table: &str) -> Result<i64> {
        let inner = self.inner.lock().unwrap();
        Self::check_broken(&inner, table)?;
        inner
            .tables
            .get(table)
            .map(|t| t.rows.len() as i64)
            .ok_or_else(|| SyncError::store(format!("no such table: {table}"), "memory source"))
    }

    async fn sample_int_values(
        &self,
        table: &str,
        column: &str,
        limit: usize,
    ) -> Result<Vec<i64>> {
        let inner = self.inner.lock().unwrap();
        Self::check_broken(&inner, table)?;
        let t = inner
            .tables
            .get(table)
            .ok_or_else(|| SyncError::store(format!("no such table: {table}"), "memory source"))?;
        let idx = col_index(&t.columns, column)?;
        Ok(t.rows
            .iter()
            .filter_map(|r| r.get(idx).and_then(|v| v.as_i64()))
            .take(limit)
            .collect())
    }

    async fn read_chunk(&self, req: &ChunkRequest<'_>) -> Result<Vec<Row>> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_broken(&inner, req.table)?;

        if let Some(remaining) = inner.transient_failures.get_mut(req.table) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(SyncError::store(
                    "simulated connection drop",
                    format!("reading chunk from {}", req.table),
                ));
            }
        }

        let t = inner.tables.get(req.table).ok_or_else(|| {
            SyncError::store(format!("no such table: {}", req.table), "memory source")
        })?;

        let key_idx = col_index(&t.columns, req.key_column)?;
        let wm_idx = match req.watermark_column {
            Some(wm) => Some(col_index(&t.columns, wm)?),
            None => None,
        };
        let out_idx: Vec<usize> = req
            .columns
            .iter()
            .map(|c| col_index(&t.columns, c))
            .collect::<Result<_>>()?;

        // Decorate with (watermark, key), sort, filter, project.
        let mut decorated: Vec<(Option<Watermark>, KeyValue, &Row)> = t
            .rows
            .iter()
            .map(|row| {
                let wm = wm_idx.and_then(|i| Watermark::from_value(&row[i]));
                let key = KeyValue::from_value(&row[key_idx]).ok_or_else(|| {
                    SyncError::store(
                        format!("unorderable key value in {}", req.table),
                        "memory source",
                    )
                })?;
                Ok((wm, key, row))
            })
            .collect::<Result<_>>()?;

        decorated.sort_by(|a, b| cmp_watermark(&a.0, &b.0).then_with(|| a.1.cmp(&b.1)));

        let passes = |wm: &Option<Watermark>, key: &KeyValue| match &req.bound {
            None => true,
            Some(ChunkBound::AfterWatermark(w)) => {
                wm.as_ref().map(|x| x.is_after(w)).unwrap_or(false)
            }
            Some(ChunkBound::AfterPair(w, k)) => match wm {
                Some(x) if x.is_after(w) => true,
                Some(x) if x == w => key > k,
                _ => false,
            },
            Some(ChunkBound::AfterKey(k)) => key > k,
        };

        let mut out = Vec::new();
        for (wm, key, row) in decorated {
            if !passes(&wm, &key) {
                continue;
            }
            out.push(out_idx.iter().map(|&i| row[i].clone()).collect());
            if let Some(limit) = req.limit {
                if out.len() >= limit {
                    break;
                }
            }
        }
        Ok(out)
    }
}

struct WarehouseTable {
    schema: TargetSchema,
    primary_key: Vec<String>,
    rows: BTreeMap<Vec<KeyValue>, Row>,
}

#[derive(Default)]
struct WarehouseInner {
    tables: HashMap<String, WarehouseTable>,
}

/// In-memory warehouse.
#[derive(Clone, Default)]
pub struct MemoryWarehouse {
    inner: Arc<Mutex<WarehouseInner>>,
}

impl MemoryWarehouse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a table's rows, in key order.
    pub fn rows(&self, table: &str) -> Vec<Row> {
        let inner = self.inner.lock().unwrap();
        inner
            .tables
            .get(table)
            .map(|t| t.rows.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Current row count, zero for a missing table.
    pub fn row_count(&self, table: &str) -> i64 {
        let inner = self.inner.lock().unwrap();
        inner
            .tables
            .get(table)
            .map(|t| t.rows.len() as i64)
            .unwrap_or(0)
    }

    /// Deliberately shrink a table to its first `keep` rows (corruption hook
    /// for staleness tests).
    pub fn truncate_to(&self, table: &str, keep: usize) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(t) = inner.tables.get_mut(table) {
            let keys: Vec<_> = t.rows.keys().skip(keep).cloned().collect();
            for k in keys {
                t.rows.remove(&k);
            }
        }
    }

    fn row_key(
        table: &WarehouseTable,
        columns: &[String],
        row: &Row,
    ) -> Result<Vec<KeyValue>> {
        table
            .primary_key
            .iter()
            .map(|pk| {
                let idx = columns.iter().position(|c| c == pk).ok_or_else(|| {
                    SyncError::store(format!("missing pk column {pk}"), "memory warehouse")
                })?;
                KeyValue::from_value(&row[idx]).ok_or_else(|| {
                    SyncError::store(format!("unorderable pk value in {pk}"), "memory warehouse")
                })
            })
            .collect()
    }
}

#[async_trait]
impl Warehouse for MemoryWarehouse {
    async fn ensure_table(
        &self,
        table: &str,
        schema: &TargetSchema,
        primary_key: &[String],
    ) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        match inner.tables.get(table) {
            Some(existing) if existing.schema == *schema => Ok(()),
            _ => {
                inner.tables.insert(
                    table.to_string(),
                    WarehouseTable {
                        schema: schema.clone(),
                        primary_key: primary_key.to_vec(),
                        rows: BTreeMap::new(),
                    },
                );
                Ok(())
            }
        }
    }

    async fn clear_table(&self, table: &str) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(t) = inner.tables.get_mut(table) {
            t.rows.clear();
        }
        Ok(())
    }

    async fn append_chunk(&self, table: &str, columns: &[String], rows: Vec<Row>) -> Result<u64> {
        self.upsert_chunk(table, columns, &[], rows).await
    }

    async fn upsert_chunk(
        &self,
        table: &str,
        columns: &[String],
        _primary_key: &[String],
        rows: Vec<Row>,
    ) -> Result<u64> {
        let mut inner = self.inner.lock().unwrap();
        let t = inner.tables.get_mut(table).ok_or_else(|| {
            SyncError::store(format!("no such table: {table}"), "memory warehouse")
        })?;
        let count = rows.len() as u64;
        for row in rows {
            let key = Self::row_key(t, columns, &row)?;
            t.rows.insert(key, row);
        }
        Ok(count)
    }

    async fn count_rows(&self, table: &str) -> Result<i64> {
        Ok(self.row_count(table))
    }
}
