//! Tier-ordered batch scheduling.
//!
//! Tables run grouped by priority tier, one tier at a time in
//! [`Tier::ORDER`]. Within a tier the policy decides between a bounded
//! parallel worker pool and strictly sequential execution. A failed table
//! never stops its tier or the tiers after it; failures surface in the
//! batch result.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio::sync::{watch, Semaphore};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::{
    ConfigProvider, FileConfigProvider, SyncConfig, TableSpec, Tier, TierMode, TierPolicy,
};
use crate::error::{Result, SyncError};
use crate::executor::{LoadExecutor, RunOutcome, RunResult};

/// Results for one tier, split by how each table ended.
#[derive(Debug, Default, Serialize)]
pub struct TierOutcome {
    /// Tables that committed.
    pub succeeded: Vec<RunResult>,

    /// Tables that failed or were skipped.
    pub failed: Vec<RunResult>,
}

/// Outcome of one batch run across all tiers.
#[derive(Debug, Serialize)]
pub struct BatchResult {
    /// Unique id for this batch run.
    pub run_id: Uuid,

    /// Wall-clock duration of the whole batch.
    pub elapsed_ms: u64,

    /// Per-tier results, keyed by tier in priority order.
    pub tiers: BTreeMap<Tier, TierOutcome>,
}

impl BatchResult {
    fn add(&mut self, result: RunResult) {
        let tier = self.tiers.entry(result.tier).or_default();
        match result.outcome {
            RunOutcome::Success => tier.succeeded.push(result),
            RunOutcome::Failure | RunOutcome::Skipped => tier.failed.push(result),
        }
    }

    /// All per-table results across tiers.
    pub fn tables(&self) -> impl Iterator<Item = &RunResult> {
        self.tiers
            .values()
            .flat_map(|t| t.succeeded.iter().chain(t.failed.iter()))
    }

    /// Number of tables that committed.
    pub fn succeeded(&self) -> usize {
        self.tiers.values().map(|t| t.succeeded.len()).sum()
    }

    /// Number of tables that failed or were skipped.
    pub fn failed(&self) -> usize {
        self.tiers.values().map(|t| t.failed.len()).sum()
    }

    /// Result for one table, if it ran in this batch.
    pub fn result(&self, table: &str) -> Option<&RunResult> {
        self.tables().find(|r| r.table == table)
    }
}

/// Runs a batch of table copies in tier order.
///
/// Table specs come through the injected [`ConfigProvider`], never from a
/// concrete configuration source.
pub struct Scheduler {
    executor: Arc<LoadExecutor>,
    provider: Arc<dyn ConfigProvider>,
    policies: Vec<TierPolicy>,
}

impl Scheduler {
    /// Create a scheduler over an executor, a spec provider, and the tier
    /// policies. Tiers without a policy use the built-in defaults.
    pub fn new(
        executor: Arc<LoadExecutor>,
        provider: Arc<dyn ConfigProvider>,
        policies: Vec<TierPolicy>,
    ) -> Self {
        Self {
            executor,
            provider,
            policies,
        }
    }

    /// Convenience constructor wiring a loaded configuration file in as the
    /// provider.
    pub fn from_config(executor: Arc<LoadExecutor>, config: &SyncConfig) -> Self {
        Self::new(
            executor,
            Arc::new(FileConfigProvider::new(config.clone())),
            config.tiers.clone(),
        )
    }

    fn tier_policy(&self, tier: Tier) -> TierPolicy {
        self.policies
            .iter()
            .find(|p| p.tier == tier)
            .cloned()
            .unwrap_or_else(|| TierPolicy::default_for(tier))
    }

    /// Run every configured table, tier by tier.
    ///
    /// Errors only when the provider cannot produce the table specs; once
    /// the batch starts it always returns a complete accounting.
    pub async fn run_batch(&self, cancel: &watch::Receiver<bool>) -> Result<BatchResult> {
        let specs = self.provider.table_specs()?;
        let run_id = Uuid::new_v4();
        let started = Instant::now();
        info!(%run_id, tables = specs.len(), "batch run starting");

        let mut batch = BatchResult {
            run_id,
            elapsed_ms: 0,
            tiers: BTreeMap::new(),
        };

        for tier in Tier::ORDER {
            let tier_specs: Vec<&TableSpec> =
                specs.iter().filter(|s| s.tier == tier).collect();
            if tier_specs.is_empty() {
                continue;
            }

            let policy = self.tier_policy(tier);
            info!(
                tier = tier.name(),
                tables = tier_specs.len(),
                mode = ?policy.mode,
                "processing tier"
            );

            // Sequential tiers take the same spawned path with one worker,
            // so a panicking table is contained the same way in both modes.
            let workers = match policy.mode {
                TierMode::Parallel => policy.workers,
                TierMode::Sequential => 1,
            };
            self.run_tier(&tier_specs, workers, cancel, &mut batch).await;
        }

        batch.elapsed_ms = started.elapsed().as_millis() as u64;
        info!(
            %run_id,
            succeeded = batch.succeeded(),
            failed = batch.failed(),
            elapsed_ms = batch.elapsed_ms,
            "batch run finished"
        );
        Ok(batch)
    }

    async fn run_tier(
        &self,
        specs: &[&TableSpec],
        workers: usize,
        cancel: &watch::Receiver<bool>,
        batch: &mut BatchResult,
    ) {
        let semaphore = Arc::new(Semaphore::new(workers.max(1)));
        let mut handles = Vec::with_capacity(specs.len());

        for spec in specs {
            let semaphore = Arc::clone(&semaphore);
            let executor = Arc::clone(&self.executor);
            let cancel = cancel.clone();
            let spec = (*spec).clone();

            handles.push((
                spec.name.clone(),
                spec.tier,
                tokio::spawn(async move {
                    let _permit = semaphore.acquire_owned().await.ok();
                    executor.copy_table(&spec, &cancel).await
                }),
            ));
        }

        for (table, tier, handle) in handles {
            match handle.await {
                Ok(result) => batch.add(result),
                Err(e) => {
                    // A panicked worker is reported like any other failure.
                    warn!(table, "table worker panicked: {}", e);
                    batch.add(RunResult {
                        table: table.clone(),
                        tier,
                        strategy: None,
                        rows_moved: 0,
                        rows_healed: 0,
                        healed: false,
                        outcome: RunOutcome::Failure,
                        note: None,
                        error: Some(
                            SyncError::copy(table, format!("worker task failed: {}", e))
                                .to_string(),
                        ),
                        elapsed_ms: 0,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(table: &str, tier: Tier, outcome: RunOutcome) -> RunResult {
        RunResult {
            table: table.into(),
            tier,
            strategy: None,
            rows_moved: 0,
            rows_healed: 0,
            healed: false,
            outcome,
            note: None,
            error: match outcome {
                RunOutcome::Success => None,
                _ => Some("boom".into()),
            },
            elapsed_ms: 1,
        }
    }

    #[test]
    fn test_batch_result_groups_by_tier() {
        let mut batch = BatchResult {
            run_id: Uuid::new_v4(),
            elapsed_ms: 10,
            tiers: BTreeMap::new(),
        };
        batch.add(result("person", Tier::Critical, RunOutcome::Success));
        batch.add(result("obs", Tier::Large, RunOutcome::Failure));
        batch.add(result("visit", Tier::Small, RunOutcome::Skipped));
        batch.add(result("medication", Tier::Large, RunOutcome::Success));

        assert_eq!(batch.succeeded(), 2);
        assert_eq!(batch.failed(), 2);
        assert_eq!(batch.tiers[&Tier::Large].succeeded.len(), 1);
        assert_eq!(batch.tiers[&Tier::Large].failed.len(), 1);
        assert!(batch.result("obs").is_some());
        assert!(!batch.result("obs").map(|r| r.is_success()).unwrap_or(true));
        assert!(batch.result("missing").is_none());
    }
}
