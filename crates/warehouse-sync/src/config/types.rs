//! Configuration type definitions.
//!
//! All knobs are explicit values on a config object constructed once and
//! passed by reference into the scheduler and executor; there is no ambient
//! global state.

use serde::{Deserialize, Serialize};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Intermediate replication store (read side).
    pub source: StoreConfig,

    /// Analytics warehouse (write side).
    pub warehouse: StoreConfig,

    /// Engine behavior configuration.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Per-tier scheduling policies. Tiers without a policy use defaults.
    #[serde(default)]
    pub tiers: Vec<TierPolicy>,

    /// Per-table specifications.
    #[serde(default)]
    pub tables: Vec<TableSpec>,
}

/// Connection configuration for one Postgres endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Database host.
    pub host: String,

    /// Database port (default: 5432).
    #[serde(default = "default_pg_port")]
    pub port: u16,

    /// Database name.
    pub database: String,

    /// Username.
    pub user: String,

    /// Password.
    pub password: String,

    /// Schema holding the tables ("replica" seed schema or "raw" namespace).
    pub schema: String,

    /// SSL mode: "disable" or "require" (default: "require").
    #[serde(default = "default_require")]
    pub ssl_mode: String,

    /// Maximum pooled connections (default: 8).
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

/// Engine behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Rows per chunk when a table does not override it.
    #[serde(default = "default_chunk_size")]
    pub default_chunk_size: usize,

    /// Chunks buffered between reader and writer in streamed copies.
    #[serde(default = "default_stream_buffer")]
    pub stream_buffer_chunks: usize,

    /// Values sampled per tinyint column for the boolean heuristic.
    #[serde(default = "default_sample_limit")]
    pub sample_limit: usize,

    /// Row-count divergence tolerated before the stale-state detector heals.
    #[serde(default)]
    pub stale_row_tolerance: i64,

    /// Retry attempts per chunk for transient store errors.
    #[serde(default = "default_chunk_retries")]
    pub max_chunk_retries: u32,

    /// Base backoff between chunk retries, in milliseconds (doubles per attempt).
    #[serde(default = "default_retry_base_ms")]
    pub retry_base_ms: u64,

    /// Maximum duration budget for one table copy, in seconds.
    #[serde(default = "default_table_budget")]
    pub table_budget_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_chunk_size: default_chunk_size(),
            stream_buffer_chunks: default_stream_buffer(),
            sample_limit: default_sample_limit(),
            stale_row_tolerance: 0,
            max_chunk_retries: default_chunk_retries(),
            retry_base_ms: default_retry_base_ms(),
            table_budget_secs: default_table_budget(),
        }
    }
}

/// Priority tier: determines scheduling order and treatment.
///
/// A closed set; unknown tier names in configuration fail deserialization at
/// load time rather than at first use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Business-critical tables, processed first.
    Critical,

    /// Large tables benefiting from a parallel worker pool.
    Large,

    /// Mid-size tables.
    Medium,

    /// Small tables, processed sequentially last.
    Small,
}

impl Tier {
    /// Fixed processing order, most critical first.
    pub const ORDER: [Tier; 4] = [Tier::Critical, Tier::Large, Tier::Medium, Tier::Small];

    /// Lowercase name for logs and results.
    pub fn name(&self) -> &'static str {
        match self {
            Tier::Critical => "critical",
            Tier::Large => "large",
            Tier::Medium => "medium",
            Tier::Small => "small",
        }
    }
}

/// How a tier's tables are dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierMode {
    /// Bounded worker pool, tables in flight concurrently.
    Parallel,

    /// One table at a time.
    Sequential,
}

/// Scheduling policy for one tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierPolicy {
    /// The tier this policy applies to.
    pub tier: Tier,

    /// Dispatch mode.
    pub mode: TierMode,

    /// Worker bound for parallel mode (ignored for sequential).
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl TierPolicy {
    /// Built-in policy: critical/large parallel, medium/small sequential.
    pub fn default_for(tier: Tier) -> Self {
        match tier {
            Tier::Critical | Tier::Large => Self {
                tier,
                mode: TierMode::Parallel,
                workers: default_workers(),
            },
            Tier::Medium | Tier::Small => Self {
                tier,
                mode: TierMode::Sequential,
                workers: 1,
            },
        }
    }
}

/// Size category driving the incremental strategy choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeCategory {
    /// Fits in memory; a single watermark query suffices.
    #[default]
    Small,

    /// Copied in independently committed chunks.
    Medium,

    /// Streamed through a bounded pipeline, never fully materialized.
    Large,
}

/// Static per-table specification, read once per batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSpec {
    /// Table name (same in replica store and warehouse raw namespace).
    pub name: String,

    /// Priority tier.
    pub tier: Tier,

    /// Watermark column; absence forces a full copy every run.
    #[serde(default)]
    pub watermark_column: Option<String>,

    /// Per-table chunk size override.
    #[serde(default)]
    pub chunk_size: Option<usize>,

    /// Primary key column(s); the first drives the tie-break ordering.
    pub primary_key: Vec<String>,

    /// Size category for strategy selection.
    #[serde(default)]
    pub size_category: SizeCategory,
}

impl TableSpec {
    /// Effective chunk size for this table.
    pub fn chunk_size_or(&self, default: usize) -> usize {
        self.chunk_size.unwrap_or(default)
    }
}

// Default value functions for serde

fn default_pg_port() -> u16 {
    5432
}

fn default_require() -> String {
    "require".to_string()
}

fn default_max_connections() -> usize {
    8
}

fn default_chunk_size() -> usize {
    5_000
}

fn default_stream_buffer() -> usize {
    4
}

fn default_sample_limit() -> usize {
    100
}

fn default_chunk_retries() -> u32 {
    3
}

fn default_retry_base_ms() -> u64 {
    500
}

fn default_table_budget() -> u64 {
    3_600
}

fn default_workers() -> usize {
    4
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_tier_rejected_at_parse() {
        let yaml = r#"
name: person
tier: urgent
primary_key: [person_id]
"#;
        let parsed: std::result::Result<TableSpec, _> = serde_yaml::from_str(yaml);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_table_spec_defaults() {
        let yaml = r#"
name: person
tier: small
primary_key: [person_id]
"#;
        let spec: TableSpec = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(spec.watermark_column, None);
        assert_eq!(spec.chunk_size, None);
        assert_eq!(spec.size_category, SizeCategory::Small);
        assert_eq!(spec.chunk_size_or(5_000), 5_000);
    }

    #[test]
    fn test_tier_order_most_critical_first() {
        assert_eq!(Tier::ORDER[0], Tier::Critical);
        assert_eq!(Tier::ORDER[3], Tier::Small);
    }

    #[test]
    fn test_default_tier_policies() {
        assert_eq!(TierPolicy::default_for(Tier::Critical).mode, TierMode::Parallel);
        assert_eq!(TierPolicy::default_for(Tier::Large).mode, TierMode::Parallel);
        assert_eq!(TierPolicy::default_for(Tier::Medium).mode, TierMode::Sequential);
        assert_eq!(TierPolicy::default_for(Tier::Small).mode, TierMode::Sequential);
    }

    #[test]
    fn test_engine_defaults() {
        let engine = EngineConfig::default();
        assert_eq!(engine.stale_row_tolerance, 0);
        assert!(engine.max_chunk_retries >= 1);
        assert!(engine.default_chunk_size > 0);
    }
}
