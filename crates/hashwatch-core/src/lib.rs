//! Core types and traits for hashwatch.
//!
//! This crate provides the data model shared by the rest of the workspace:
//! content fingerprints, the baseline of known files, scan events, the
//! monitor configuration, and the sink traits the engine writes through.

mod baseline;
mod config;
mod error;
mod event;
mod fingerprint;
mod sink;

pub use baseline::{Baseline, BaselineEntry, FileRecord, ParsedBaseline, encode_line, parse_baseline};
pub use config::{
    ConfigFileError, DEFAULT_CONFIG_FILE, DigestAlgorithm, MonitorConfig, MonitorConfigBuilder,
};
pub use error::{MonitorError, ScanError, ScanWarning, StoreError, WarningKind};
pub use event::{ChangeKind, ScanEvent};
pub use fingerprint::{ContentDigest, Fingerprint, ParseFingerprintError, UNREADABLE_MARKER};
pub use sink::{AlertSink, BaselineStore, LoadedBaseline, MemoryBaselineStore};
