//! Baseline and diff engine for hashwatch.
//!
//! This crate walks a directory tree, fingerprints every file, and diffs
//! the result against a [`Baseline`] to detect created, modified and
//! deleted files.
//!
//! # Overview
//!
//! - **Digester** hashes file content (SHA3-512, SHA-512 or BLAKE3). Files
//!   that cannot be read or are not UTF-8 text fingerprint as
//!   [`Fingerprint::Unreadable`] instead of failing.
//! - **TreeWalker** enumerates files with jwalk, serially and sorted.
//! - **DiffEngine** builds or resumes a baseline and runs rounds.
//! - **Monitor** repeats rounds with a fixed delay until cancelled.
//!
//! # Example
//!
//! ```rust,no_run
//! use hashwatch_scan::{DiffEngine, MonitorConfig, StartMode};
//! use hashwatch_core::MemoryBaselineStore;
//!
//! let config = MonitorConfig::new("/path/to/watch");
//! let engine = DiffEngine::new(&config);
//! let mut store = MemoryBaselineStore::new();
//!
//! let (mut baseline, _) = engine.start(StartMode::Fresh, &mut store).unwrap();
//! let report = engine.run_round(&mut baseline).unwrap();
//!
//! for event in &report.events {
//!     print!("{}", event.alert_line());
//! }
//! ```
//!
//! # Polling
//!
//! ```rust,no_run
//! use hashwatch_scan::{DiffEngine, Monitor, MonitorConfig, StartMode};
//! use hashwatch_core::{MemoryBaselineStore, ScanEvent};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn watch() -> Result<(), hashwatch_core::MonitorError> {
//! let config = MonitorConfig::new(".");
//! let mut monitor = Monitor::new(&config, Vec::<ScanEvent>::new());
//! let (mut baseline, _) = monitor
//!     .engine()
//!     .start(StartMode::Resume, &mut MemoryBaselineStore::new())?;
//!
//! monitor.run(&mut baseline, CancellationToken::new()).await?;
//! # Ok(())
//! # }
//! ```

mod digest;
mod engine;
mod monitor;
mod report;
mod walker;

pub use digest::Digester;
pub use engine::{
    DiffEngine, FallbackReason, ResumeOutcome, StartMode, StartOutcome, apply_observations,
};
pub use monitor::{Monitor, MonitorSummary};
pub use report::{RoundReport, ScanStats};
pub use walker::{TreeWalker, WalkOutcome, ensure_root};

// Re-export core types for convenience
pub use hashwatch_core::{
    Baseline, ChangeKind, DigestAlgorithm, Fingerprint, MonitorConfig, MonitorError, ScanError,
    ScanEvent, ScanWarning, WarningKind,
};
