//! Change events produced by a scan round.

use std::path::PathBuf;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Timestamp layout used in alert lines.
const ALERT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Kind of change detected for a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// Path was not in the baseline.
    Created,
    /// Fingerprint differs from the recorded one.
    Modified,
    /// Path in the baseline was not observed this round.
    Deleted,
}

/// A detected transition for a single path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanEvent {
    pub path: PathBuf,
    pub kind: ChangeKind,
    pub timestamp: DateTime<Local>,
}

impl ScanEvent {
    /// Create an event stamped with the current local time.
    pub fn now(path: impl Into<PathBuf>, kind: ChangeKind) -> Self {
        Self {
            path: path.into(),
            kind,
            timestamp: Local::now(),
        }
    }

    /// Render the alert line for this event, newline included.
    pub fn alert_line(&self) -> String {
        format!(
            "[{}]:\t{} has been {}.\n",
            self.timestamp.format(ALERT_TIMESTAMP_FORMAT),
            self.path.display(),
            self.kind
        )
    }
}
