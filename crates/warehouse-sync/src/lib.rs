//! # warehouse-sync
//!
//! Incremental replication and load engine moving OLTP data from an
//! intermediate replication store into an analytics warehouse.
//!
//! The engine runs as a batch: every configured table is copied once per
//! run, with support for:
//!
//! - **Per-table copy strategies** chosen each run from the table's size
//!   category, stored watermark, and schema fingerprint
//! - **Schema drift detection** via order- and type-sensitive fingerprints,
//!   falling back to a full reload when the replica shape changes
//! - **Stale-state self-healing** when a quiet incremental copy hides a
//!   diverged warehouse table
//! - **Priority tiers** processed in fixed order with per-tier worker pools
//!   and per-table failure isolation
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use warehouse_sync::{
//!     DbTrackerStore, LoadExecutor, PostgresSource, PostgresWarehouse, Scheduler, SyncConfig,
//! };
//!
//! #[tokio::main]
//! async fn main() -> warehouse_sync::Result<()> {
//!     let config = SyncConfig::load("sync.yaml")?;
//!     let source = Arc::new(PostgresSource::connect(&config.source).await?);
//!     let warehouse = Arc::new(PostgresWarehouse::connect(&config.warehouse).await?);
//!     let tracker = Arc::new(DbTrackerStore::new(warehouse.tracker_pool()));
//!     tracker.init_schema().await?;
//!
//!     let executor = Arc::new(LoadExecutor::new(
//!         source,
//!         warehouse,
//!         tracker,
//!         config.engine.clone(),
//!     ));
//!     let (_stop, cancel) = tokio::sync::watch::channel(false);
//!     let batch = Scheduler::from_config(executor, &config)
//!         .run_batch(&cancel)
//!         .await?;
//!     println!("{} tables synced, {} failed", batch.succeeded(), batch.failed());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod executor;
pub mod mapper;
pub mod scheduler;
pub mod store;
pub mod tracker;

// Re-exports for convenient access
pub use config::{
    ConfigProvider, EngineConfig, FileConfigProvider, MemoryConfigProvider, SizeCategory,
    StoreConfig, SyncConfig, TableSpec, Tier, TierMode, TierPolicy,
};
pub use crate::core::schema::{Column, KeyValue, TargetColumn, TargetSchema, Watermark};
pub use crate::core::value::{Row, SqlValue};
pub use error::{Result, SyncError};
pub use executor::{CopyStrategy, LoadExecutor, RunOutcome, RunResult};
pub use mapper::{compute_fingerprint, SchemaFingerprint, SchemaMapper};
pub use scheduler::{BatchResult, Scheduler, TierOutcome};
pub use store::memory::{MemorySource, MemoryWarehouse};
pub use store::postgres::{PostgresSource, PostgresWarehouse};
pub use store::{ChunkBound, ChunkRequest, ReplicaSource, Warehouse};
pub use tracker::db::DbTrackerStore;
pub use tracker::{LoadStatus, MemoryTrackerStore, TableTracker, TrackerStore};
