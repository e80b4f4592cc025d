//! Per-scan reporting.

use std::time::Duration;

use hashwatch_core::{ChangeKind, ScanEvent, ScanWarning};

/// Counters for one pass over the tree.
#[derive(Debug, Clone, Default)]
pub struct ScanStats {
    /// Number of files fingerprinted.
    pub files_scanned: u64,
    /// Number of files that fingerprinted as unreadable.
    pub unreadable: u64,
    /// Non-fatal problems met during the pass.
    pub warnings: Vec<ScanWarning>,
    /// Time the pass took.
    pub elapsed: Duration,
}

impl ScanStats {
    /// Calculate scan rate in files per second.
    pub fn files_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.files_scanned as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }
}

/// Everything a round produced.
#[derive(Debug, Clone, Default)]
pub struct RoundReport {
    /// Created and modified events in visitation order, then deletions.
    pub events: Vec<ScanEvent>,
    pub stats: ScanStats,
}

impl RoundReport {
    /// Check if the round detected any change.
    pub fn has_changes(&self) -> bool {
        !self.events.is_empty()
    }

    /// Count events of one kind.
    pub fn count(&self, kind: ChangeKind) -> usize {
        self.events.iter().filter(|e| e.kind == kind).count()
    }
}
