//! Stale-state detection for incremental copies.
//!
//! A zero-row incremental copy is either a genuinely quiet table or a
//! watermark that ran ahead of the warehouse (a restored backup, a manual
//! truncate, a partially applied load). The two are told apart by comparing
//! row counts, which is cheap enough to afford on every quiet run.

/// Row counts compared by the detector.
#[derive(Debug, Clone, Copy)]
pub struct CountComparison {
    /// Rows in the replica store.
    pub source_rows: i64,

    /// Rows in the warehouse table.
    pub target_rows: i64,
}

impl CountComparison {
    /// Absolute divergence between the two counts.
    pub fn divergence(&self) -> i64 {
        (self.source_rows - self.target_rows).abs()
    }

    /// Whether the divergence exceeds the configured tolerance.
    ///
    /// Only consulted when an incremental copy moved zero rows; a copy that
    /// moved rows is making progress and is left alone.
    pub fn needs_heal(&self, tolerance: i64) -> bool {
        self.divergence() > tolerance
    }
}
