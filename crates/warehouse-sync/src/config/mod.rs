//! Configuration loading and the provider seam.

mod types;
mod validation;

use std::collections::HashMap;
use std::path::Path;

pub use types::{
    EngineConfig, SizeCategory, StoreConfig, SyncConfig, TableSpec, Tier, TierMode, TierPolicy,
};
pub use validation::validate;

use crate::error::Result;

impl SyncConfig {
    /// Load and validate configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: SyncConfig = serde_yaml::from_str(&content)?;
        validate(&config)?;
        Ok(config)
    }
}

/// Access to table specifications and environment values.
///
/// Injected into the embedding binary's wiring so engine code never touches
/// a concrete configuration source directly.
pub trait ConfigProvider: Send + Sync {
    /// All table specifications for this batch run.
    fn table_specs(&self) -> Result<Vec<TableSpec>>;

    /// An environment value by key, if present.
    fn env(&self, key: &str) -> Option<String>;
}

/// File-backed provider: specs from the loaded YAML, env from the process.
pub struct FileConfigProvider {
    config: SyncConfig,
}

impl FileConfigProvider {
    /// Load a provider from a YAML config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self {
            config: SyncConfig::load(path)?,
        })
    }

    /// Wrap an already-loaded configuration.
    pub fn new(config: SyncConfig) -> Self {
        Self { config }
    }

    /// The full configuration backing this provider.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }
}

impl ConfigProvider for FileConfigProvider {
    fn table_specs(&self) -> Result<Vec<TableSpec>> {
        Ok(self.config.tables.clone())
    }

    fn env(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// In-memory provider for tests and embedded use.
#[derive(Default)]
pub struct MemoryConfigProvider {
    specs: Vec<TableSpec>,
    env: HashMap<String, String>,
}

impl MemoryConfigProvider {
    /// Create a provider serving the given specs.
    pub fn new(specs: Vec<TableSpec>) -> Self {
        Self {
            specs,
            env: HashMap::new(),
        }
    }

    /// Add an environment value.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}

impl ConfigProvider for MemoryConfigProvider {
    fn table_specs(&self) -> Result<Vec<TableSpec>> {
        Ok(self.specs.clone())
    }

    fn env(&self, key: &str) -> Option<String> {
        self.env.get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_from_yaml_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
source:
  host: replica.internal
  database: replica
  user: sync
  password: secret
  schema: seed
warehouse:
  host: warehouse.internal
  database: analytics
  user: sync
  password: secret
  schema: raw
tables:
  - name: medication
    tier: medium
    watermark_column: date_changed
    primary_key: [medication_id]
    size_category: medium
"#
        )
        .unwrap();

        let config = SyncConfig::load(file.path()).unwrap();
        assert_eq!(config.tables.len(), 1);
        assert_eq!(config.tables[0].name, "medication");
        assert_eq!(config.tables[0].tier, Tier::Medium);
        assert_eq!(config.source.port, 5432);
        assert_eq!(config.warehouse.ssl_mode, "require");
    }

    #[test]
    fn test_load_rejects_invalid_spec() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
source:
  host: h
  database: d
  user: u
  password: p
  schema: s
warehouse:
  host: h
  database: d
  user: u
  password: p
  schema: raw
tables:
  - name: medication
    tier: medium
    primary_key: []
"#
        )
        .unwrap();

        assert!(SyncConfig::load(file.path()).is_err());
    }

    #[test]
    fn test_memory_provider() {
        let provider = MemoryConfigProvider::new(Vec::new()).with_env("SYNC_ENV", "staging");
        assert_eq!(provider.env("SYNC_ENV"), Some("staging".into()));
        assert_eq!(provider.env("MISSING"), None);
        assert!(provider.table_specs().unwrap().is_empty());
    }
}
