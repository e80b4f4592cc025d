//! Baseline construction and round-by-round diffing.

use std::path::{Path, PathBuf};
use std::time::Instant;

use thiserror::Error;

use hashwatch_core::{
    Baseline, BaselineEntry, BaselineStore, ChangeKind, Fingerprint, LoadedBaseline,
    MonitorConfig, MonitorError, ParsedBaseline, ScanError, ScanEvent, StoreError,
};

use crate::digest::Digester;
use crate::report::{RoundReport, ScanStats};
use crate::walker::{TreeWalker, ensure_root};

/// How the engine obtains its first baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StartMode {
    /// Discard the stored baseline and hash the tree again.
    Fresh,
    /// Load the stored baseline, rebuilding it if it is unusable.
    #[default]
    Resume,
}

/// Why a stored baseline could not be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FallbackReason {
    #[error("baseline not found")]
    Missing,
    #[error("baseline is empty")]
    Empty,
    #[error("baseline is corrupted at line {line}")]
    Corrupt { line: usize },
}

/// Result of reading a stored baseline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResumeOutcome {
    Loaded(Baseline),
    Unusable(FallbackReason),
}

/// How the engine actually started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    /// A fresh baseline was requested and built.
    Fresh,
    /// The stored baseline was loaded.
    Resumed,
    /// Resuming was requested but the stored baseline was unusable.
    Rebuilt(FallbackReason),
}

/// Owns the walk and fingerprint settings and diffs the tree against a
/// [`Baseline`].
///
/// The engine holds no baseline itself; callers pass it in so a round can
/// be driven against any starting state.
#[derive(Debug, Clone)]
pub struct DiffEngine {
    root: PathBuf,
    walker: TreeWalker,
    digester: Digester,
}

impl DiffEngine {
    /// Create an engine for a monitor configuration.
    pub fn new(config: &MonitorConfig) -> Self {
        Self {
            root: config.root.clone(),
            walker: TreeWalker::new(config.ignore_set()),
            digester: Digester::new(config.algorithm),
        }
    }

    /// Obtain the initial baseline according to `mode`.
    ///
    /// A missing or unreadable root fails here, before any round runs.
    pub fn start<S>(
        &self,
        mode: StartMode,
        store: &mut S,
    ) -> Result<(Baseline, StartOutcome), MonitorError>
    where
        S: BaselineStore + ?Sized,
    {
        ensure_root(&self.root)?;

        if mode == StartMode::Fresh {
            let (baseline, _) = self.build_baseline(store)?;
            return Ok((baseline, StartOutcome::Fresh));
        }

        match self.load_baseline(store)? {
            ResumeOutcome::Loaded(baseline) => {
                tracing::info!(files = baseline.len(), "Resumed stored baseline");
                Ok((baseline, StartOutcome::Resumed))
            }
            ResumeOutcome::Unusable(reason) => {
                tracing::warn!(%reason, "Stored baseline unusable, creating a new one");
                let (baseline, _) = self.build_baseline(store)?;
                Ok((baseline, StartOutcome::Rebuilt(reason)))
            }
        }
    }

    /// Read the stored baseline without falling back.
    ///
    /// Every loaded record starts unseen. A single malformed line makes
    /// the whole store unusable.
    pub fn load_baseline<S>(&self, store: &mut S) -> Result<ResumeOutcome, StoreError>
    where
        S: BaselineStore + ?Sized,
    {
        let outcome = match store.load()? {
            LoadedBaseline::Missing => ResumeOutcome::Unusable(FallbackReason::Missing),
            LoadedBaseline::Parsed(ParsedBaseline::Empty) => {
                ResumeOutcome::Unusable(FallbackReason::Empty)
            }
            LoadedBaseline::Parsed(ParsedBaseline::Corrupt { line, content }) => {
                tracing::debug!(line, content = %content, "Malformed baseline line");
                ResumeOutcome::Unusable(FallbackReason::Corrupt { line })
            }
            LoadedBaseline::Parsed(ParsedBaseline::Entries(entries)) => {
                let baseline: Baseline = entries.into_iter().collect();
                if baseline.is_empty() {
                    ResumeOutcome::Unusable(FallbackReason::Empty)
                } else {
                    ResumeOutcome::Loaded(baseline)
                }
            }
        };
        Ok(outcome)
    }

    /// Hash the whole tree into a new baseline.
    ///
    /// The store is reset first and each entry is appended as soon as it
    /// is hashed. No events are produced.
    pub fn build_baseline<S>(&self, store: &mut S) -> Result<(Baseline, ScanStats), MonitorError>
    where
        S: BaselineStore + ?Sized,
    {
        let start = Instant::now();
        let walk = self.walker.walk(&self.root)?;
        store.reset()?;

        let mut baseline = Baseline::new();
        let mut stats = ScanStats {
            warnings: walk.warnings,
            ..ScanStats::default()
        };

        for path in walk.files {
            let fingerprint = self.observe(&path, &mut stats);
            store.append(&BaselineEntry::new(path.clone(), fingerprint.clone()))?;
            baseline.insert(path, fingerprint);
        }

        stats.elapsed = start.elapsed();
        tracing::info!(
            files = stats.files_scanned,
            unreadable = stats.unreadable,
            elapsed_ms = stats.elapsed.as_millis() as u64,
            "Baseline created"
        );

        Ok((baseline, stats))
    }

    /// Walk the tree once and diff it against `baseline`, updating it in
    /// place.
    pub fn run_round(&self, baseline: &mut Baseline) -> Result<RoundReport, ScanError> {
        let start = Instant::now();
        let walk = self.walker.walk(&self.root)?;

        let mut stats = ScanStats {
            warnings: walk.warnings,
            ..ScanStats::default()
        };

        let observed = walk.files.into_iter().map(|path| {
            let fingerprint = self.observe(&path, &mut stats);
            (path, fingerprint)
        });
        let events = apply_observations(baseline, observed);

        stats.elapsed = start.elapsed();
        Ok(RoundReport { events, stats })
    }

    fn observe(&self, path: &Path, stats: &mut ScanStats) -> Fingerprint {
        let (fingerprint, warning) = self.digester.fingerprint_with_warning(path);
        stats.files_scanned += 1;
        if let Some(warning) = warning {
            stats.unreadable += 1;
            stats.warnings.push(warning);
        }
        fingerprint
    }
}

/// Diff observed `(path, fingerprint)` pairs against a baseline.
///
/// Known paths with a new fingerprint are updated and reported as
/// modified; unknown paths are inserted and reported as created. Once
/// `observed` is exhausted, every record that was not observed is removed
/// and reported as deleted, and the seen flags are cleared for the next
/// round.
pub fn apply_observations<I>(baseline: &mut Baseline, observed: I) -> Vec<ScanEvent>
where
    I: IntoIterator<Item = (PathBuf, Fingerprint)>,
{
    let mut events = Vec::new();

    for (path, fingerprint) in observed {
        match baseline.get_mut(&path) {
            Some(record) => {
                record.seen_this_round = true;
                if record.fingerprint != fingerprint {
                    record.fingerprint = fingerprint;
                    tracing::debug!(path = %path.display(), "Modified");
                    events.push(ScanEvent::now(path, ChangeKind::Modified));
                }
            }
            None => {
                tracing::debug!(path = %path.display(), "Created");
                baseline.insert_seen(path.clone(), fingerprint);
                events.push(ScanEvent::now(path, ChangeKind::Created));
            }
        }
    }

    for path in baseline.sweep_unseen() {
        tracing::debug!(path = %path.display(), "Deleted");
        events.push(ScanEvent::now(path, ChangeKind::Deleted));
    }

    events
}
