//! Monitor configuration types.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

use crate::error::ScanError;

/// Name of the optional configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "hashwatch.toml";

/// Digest used to fingerprint file content.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    /// SHA3-512. Baselines written by earlier releases use it.
    #[default]
    #[strum(to_string = "sha3-512", serialize = "sha3_512", serialize = "sha3")]
    #[serde(rename = "sha3-512", alias = "sha3_512", alias = "sha3")]
    Sha3_512,
    /// SHA-512 from the SHA-2 family.
    Sha512,
    /// BLAKE3 with its standard 256-bit output.
    Blake3,
}

impl DigestAlgorithm {
    /// Length of the digest in bytes.
    pub fn output_len(&self) -> usize {
        match self {
            DigestAlgorithm::Sha3_512 | DigestAlgorithm::Sha512 => 64,
            DigestAlgorithm::Blake3 => 32,
        }
    }
}

/// Configuration for a monitor.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct MonitorConfig {
    /// Directory to watch.
    #[builder(default = "default_root()")]
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Where the baseline is persisted.
    #[builder(default = "default_baseline_path()")]
    #[serde(default = "default_baseline_path")]
    pub baseline_path: PathBuf,

    /// Where alerts are appended.
    #[builder(default = "default_alert_path()")]
    #[serde(default = "default_alert_path")]
    pub alert_path: PathBuf,

    /// Bare file names never scanned (exact, case-sensitive match).
    #[builder(default = "default_ignore()")]
    #[serde(default = "default_ignore")]
    pub ignore: Vec<String>,

    /// Seconds to wait between rounds.
    #[builder(default = "5")]
    #[serde(default = "default_round_delay_secs")]
    pub round_delay_secs: u64,

    /// Digest used for fingerprints.
    #[builder(default)]
    #[serde(default)]
    pub algorithm: DigestAlgorithm,

    /// Stop after this many rounds (None = run until cancelled).
    #[builder(default)]
    #[serde(default)]
    pub max_rounds: Option<u64>,

    /// Echo alerts to stdout as well as the alert log.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub mirror_alerts: bool,
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_baseline_path() -> PathBuf {
    PathBuf::from("baseline.txt")
}

fn default_alert_path() -> PathBuf {
    PathBuf::from("alert.log")
}

fn default_ignore() -> Vec<String> {
    [
        "baseline.txt",
        "alert.log",
        DEFAULT_CONFIG_FILE,
        ".DS_Store",
        "Thumbs.db",
        "desktop.ini",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_round_delay_secs() -> u64 {
    5
}

fn default_true() -> bool {
    true
}

impl MonitorConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref root) = self.root {
            if root.as_os_str().is_empty() {
                return Err("Root path cannot be empty".to_string());
            }
        }
        if self.round_delay_secs == Some(0) {
            return Err("Round delay must be positive".to_string());
        }
        Ok(())
    }
}

/// Errors reading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: ScanError,
    },
}

impl MonitorConfig {
    /// Create a new config builder.
    pub fn builder() -> MonitorConfigBuilder {
        MonitorConfigBuilder::default()
    }

    /// Create a config watching `root` with every other setting at its default.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            baseline_path: default_baseline_path(),
            alert_path: default_alert_path(),
            ignore: default_ignore(),
            round_delay_secs: default_round_delay_secs(),
            algorithm: DigestAlgorithm::default(),
            max_rounds: None,
            mirror_alerts: true,
        }
    }

    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Load and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigFileError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigFileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text).map_err(|source| ConfigFileError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate().map_err(|source| ConfigFileError::Invalid {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(config)
    }

    /// Check invariants that serde cannot express.
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.root.as_os_str().is_empty() {
            return Err(ScanError::InvalidConfig {
                message: "Root path cannot be empty".to_string(),
            });
        }
        if self.round_delay_secs == 0 {
            return Err(ScanError::InvalidConfig {
                message: "Round delay must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// Delay between rounds.
    pub fn round_delay(&self) -> Duration {
        Duration::from_secs(self.round_delay_secs)
    }

    /// The effective ignore set: configured names plus the bare names of
    /// the baseline and alert files.
    pub fn ignore_set(&self) -> HashSet<String> {
        let mut set: HashSet<String> = self.ignore.iter().cloned().collect();
        for control in [&self.baseline_path, &self.alert_path] {
            if let Some(name) = control.file_name() {
                set.insert(name.to_string_lossy().into_owned());
            }
        }
        set
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self::new(".")
    }
}
