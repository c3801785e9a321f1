//! Store traits for the replica source and the warehouse.
//!
//! The executor works against these seams only; concrete implementations are
//! the Postgres pair in [`postgres`] and the in-memory pair in [`memory`].

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::core::schema::{Column, KeyValue, TargetSchema, Watermark};
use crate::core::value::Row;
use crate::error::Result;

/// Lower bound for an ordered chunk read.
#[derive(Debug, Clone)]
pub enum ChunkBound {
    /// Rows whose watermark strictly exceeds the stored value.
    ///
    /// Strict, to avoid re-copying the boundary row on the next run.
    AfterWatermark(Watermark),

    /// Rows after a `(watermark, key)` composite boundary, lexicographic.
    ///
    /// Used between chunks so rows sharing a watermark value at a chunk
    /// boundary are neither skipped nor duplicated.
    AfterPair(Watermark, KeyValue),

    /// Rows after a primary-key boundary (full-copy pagination).
    AfterKey(KeyValue),
}

/// An ordered chunk read against the replica store.
///
/// Rows come back ordered by `(watermark, key)` when a watermark column is
/// given, by `key` alone otherwise. Chunks therefore apply in strictly
/// increasing watermark order within one table copy.
#[derive(Debug, Clone)]
pub struct ChunkRequest<'a> {
    /// Table name.
    pub table: &'a str,

    /// Columns to read, in target ordinal order.
    pub columns: &'a [String],

    /// Watermark column, if the table has one.
    pub watermark_column: Option<&'a str>,

    /// Primary key column driving the tie-break ordering.
    pub key_column: &'a str,

    /// Lower bound; `None` reads from the start.
    pub bound: Option<ChunkBound>,

    /// Maximum rows to return; `None` reads to the end.
    pub limit: Option<usize>,
}

/// Read side: the intermediate replication store.
#[async_trait]
pub trait ReplicaSource: Send + Sync {
    /// Introspect column definitions for a table, in ordinal order.
    async fn fetch_columns(&self, table: &str) -> Result<Vec<Column>>;

    /// Current row count.
    async fn count_rows(&self, table: &str) -> Result<i64>;

    /// Sample up to `limit` non-null integer values from a column.
    ///
    /// Feeds the mapper's boolean heuristic.
    async fn sample_int_values(&self, table: &str, column: &str, limit: usize)
        -> Result<Vec<i64>>;

    /// Read one ordered chunk of rows.
    async fn read_chunk(&self, req: &ChunkRequest<'_>) -> Result<Vec<Row>>;
}

/// Write side: the analytics warehouse raw namespace.
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Make the target table exist with the given shape.
    ///
    /// Creates the table if missing. If a table exists with a different
    /// shape it is dropped and recreated empty. When the source shape
    /// changed too, the caller is already forcing a full copy. When only
    /// the warehouse side was altered out of band, the run stays
    /// incremental and leaves the rebuilt table sparse; the next quiet run
    /// trips the row-count check and repopulates it.
    async fn ensure_table(
        &self,
        table: &str,
        schema: &TargetSchema,
        primary_key: &[String],
    ) -> Result<()>;

    /// Remove all rows from the target table.
    async fn clear_table(&self, table: &str) -> Result<()>;

    /// Append a chunk of rows (full copy into a cleared table).
    ///
    /// Commits independently of any other chunk.
    async fn append_chunk(&self, table: &str, columns: &[String], rows: Vec<Row>) -> Result<u64>;

    /// Insert-or-update a chunk of rows keyed by the primary key.
    ///
    /// Commits independently of any other chunk.
    async fn upsert_chunk(
        &self,
        table: &str,
        columns: &[String],
        primary_key: &[String],
        rows: Vec<Row>,
    ) -> Result<u64>;

    /// Current row count.
    async fn count_rows(&self, table: &str) -> Result<i64>;
}
