//! Configuration validation, run once at load time.
//!
//! Malformed table specs are rejected at startup, not at first use.

use std::collections::HashSet;

use crate::error::{Result, SyncError};

use super::types::{SyncConfig, TierMode};

/// Validate a loaded configuration.
pub fn validate(config: &SyncConfig) -> Result<()> {
    if config.engine.default_chunk_size == 0 {
        return Err(SyncError::Config(
            "engine.default_chunk_size must be greater than zero".into(),
        ));
    }
    if config.engine.stream_buffer_chunks == 0 {
        return Err(SyncError::Config(
            "engine.stream_buffer_chunks must be greater than zero".into(),
        ));
    }
    if config.engine.stale_row_tolerance < 0 {
        return Err(SyncError::Config(
            "engine.stale_row_tolerance must not be negative".into(),
        ));
    }

    for policy in &config.tiers {
        if policy.mode == TierMode::Parallel && policy.workers == 0 {
            return Err(SyncError::Config(format!(
                "tier '{}' is parallel but has zero workers",
                policy.tier.name()
            )));
        }
    }

    let mut seen = HashSet::new();
    for spec in &config.tables {
        if spec.name.trim().is_empty() {
            return Err(SyncError::Config("table with empty name".into()));
        }
        if !seen.insert(spec.name.as_str()) {
            return Err(SyncError::Config(format!(
                "duplicate table spec: {}",
                spec.name
            )));
        }
        if spec.primary_key.is_empty() {
            return Err(SyncError::Config(format!(
                "table '{}' has no primary key columns",
                spec.name
            )));
        }
        if let Some(wm) = &spec.watermark_column {
            if wm.trim().is_empty() {
                return Err(SyncError::Config(format!(
                    "table '{}' has an empty watermark column",
                    spec.name
                )));
            }
        }
        if spec.chunk_size == Some(0) {
            return Err(SyncError::Config(format!(
                "table '{}' has a zero chunk size",
                spec.name
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::{
        EngineConfig, SizeCategory, StoreConfig, TableSpec, Tier, TierPolicy,
    };

    fn store() -> StoreConfig {
        StoreConfig {
            host: "localhost".into(),
            port: 5432,
            database: "db".into(),
            user: "u".into(),
            password: "p".into(),
            schema: "public".into(),
            ssl_mode: "disable".into(),
            max_connections: 4,
        }
    }

    fn spec(name: &str) -> TableSpec {
        TableSpec {
            name: name.into(),
            tier: Tier::Small,
            watermark_column: Some("date_changed".into()),
            chunk_size: None,
            primary_key: vec!["id".into()],
            size_category: SizeCategory::Small,
        }
    }

    fn config(tables: Vec<TableSpec>) -> SyncConfig {
        SyncConfig {
            source: store(),
            warehouse: store(),
            engine: EngineConfig::default(),
            tiers: Vec::new(),
            tables,
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate(&config(vec![spec("person"), spec("obs")])).is_ok());
    }

    #[test]
    fn test_duplicate_table_rejected() {
        let err = validate(&config(vec![spec("person"), spec("person")])).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_missing_primary_key_rejected() {
        let mut s = spec("person");
        s.primary_key.clear();
        assert!(validate(&config(vec![s])).is_err());
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let mut s = spec("person");
        s.chunk_size = Some(0);
        assert!(validate(&config(vec![s])).is_err());
    }

    #[test]
    fn test_zero_worker_parallel_tier_rejected() {
        let mut cfg = config(vec![spec("person")]);
        cfg.tiers.push(TierPolicy {
            tier: Tier::Large,
            mode: TierMode::Parallel,
            workers: 0,
        });
        assert!(validate(&cfg).is_err());
    }
}
