//! The polling loop.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use hashwatch_core::{AlertSink, Baseline, ChangeKind, MonitorConfig, MonitorError};

use crate::engine::DiffEngine;
use crate::report::RoundReport;

/// Totals for a finished [`Monitor::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorSummary {
    /// Rounds completed.
    pub rounds: u64,
    /// Events emitted across all rounds.
    pub events: u64,
    /// Whether the loop stopped because the token was cancelled.
    pub cancelled: bool,
}

/// Runs rounds back to back, emitting every event to an alert sink.
///
/// Rounds never overlap: each one finishes, events included, before the
/// delay starts.
pub struct Monitor<A> {
    engine: DiffEngine,
    alerts: A,
    delay: Duration,
    max_rounds: Option<u64>,
}

impl<A: AlertSink> Monitor<A> {
    /// Create a monitor from a configuration.
    pub fn new(config: &MonitorConfig, alerts: A) -> Self {
        Self {
            engine: DiffEngine::new(config),
            alerts,
            delay: config.round_delay(),
            max_rounds: config.max_rounds,
        }
    }

    /// Override the delay between rounds.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Stop after `rounds` rounds.
    pub fn with_max_rounds(mut self, rounds: Option<u64>) -> Self {
        self.max_rounds = rounds;
        self
    }

    /// The engine driving each round.
    pub fn engine(&self) -> &DiffEngine {
        &self.engine
    }

    /// The alert sink.
    pub fn alerts(&self) -> &A {
        &self.alerts
    }

    /// Run a single round and emit its events.
    pub fn run_once(&mut self, baseline: &mut Baseline) -> Result<RoundReport, MonitorError> {
        let report = self.engine.run_round(baseline)?;
        for event in &report.events {
            self.alerts.emit(event)?;
        }

        for warning in &report.stats.warnings {
            tracing::debug!(path = %warning.path.display(), kind = ?warning.kind, "{}", warning.message);
        }
        tracing::info!(
            files = report.stats.files_scanned,
            created = report.count(ChangeKind::Created),
            modified = report.count(ChangeKind::Modified),
            deleted = report.count(ChangeKind::Deleted),
            unreadable = report.stats.unreadable,
            elapsed_ms = report.stats.elapsed.as_millis() as u64,
            "Round complete"
        );

        Ok(report)
    }

    /// Run rounds until `cancel` fires, the round limit is reached, or a
    /// structural error occurs.
    pub async fn run(
        &mut self,
        baseline: &mut Baseline,
        cancel: CancellationToken,
    ) -> Result<MonitorSummary, MonitorError> {
        let mut summary = MonitorSummary::default();

        loop {
            if cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }

            let report = self.run_once(baseline)?;
            summary.rounds += 1;
            summary.events += report.events.len() as u64;

            if self.max_rounds.is_some_and(|max| summary.rounds >= max) {
                break;
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    summary.cancelled = true;
                    break;
                }
                _ = tokio::time::sleep(self.delay) => {}
            }
        }

        tracing::info!(
            rounds = summary.rounds,
            events = summary.events,
            cancelled = summary.cancelled,
            "Monitor stopped"
        );
        Ok(summary)
    }
}
