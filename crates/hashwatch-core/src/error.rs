//! Error types for scanning and persistence.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while walking or fingerprinting a tree.
///
/// Per-file read failures never show up here; they become
/// [`Fingerprint::Unreadable`](crate::Fingerprint::Unreadable) instead.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Root path is not a directory.
    #[error("Root path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl ScanError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }
}

/// Errors raised by a baseline store or an alert sink.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to read or write the backing file.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write to the console mirror.
    #[error("Failed to write alert to console: {0}")]
    Console(#[source] std::io::Error),
}

impl StoreError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Any structural failure that stops the monitor.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// The tree could not be walked.
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// A sink could not be read or written.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Kind of scan warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// Permission was denied.
    PermissionDenied,
    /// Error reading a directory during the walk.
    ReadError,
    /// A file could not be opened or read for hashing.
    Unreadable,
}

/// Non-fatal warning encountered during a round.
#[derive(Debug, Clone, Serialize)]
pub struct ScanWarning {
    /// Path where the warning occurred.
    pub path: PathBuf,
    /// Human-readable message.
    pub message: String,
    /// Kind of warning.
    pub kind: WarningKind,
}

impl ScanWarning {
    /// Create a new scan warning.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>, kind: WarningKind) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind,
        }
    }

    /// Create a warning for a file that could not be hashed.
    pub fn unreadable(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        let path = path.into();
        let kind = if error.kind() == std::io::ErrorKind::PermissionDenied {
            WarningKind::PermissionDenied
        } else {
            WarningKind::Unreadable
        };
        Self {
            message: format!("Unable to open file: {} ({error})", path.display()),
            path,
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_error_io() {
        let err = ScanError::io(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, ScanError::PermissionDenied { .. }));

        let err = ScanError::io(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, ScanError::NotFound { .. }));
    }

    #[test]
    fn test_unreadable_warning() {
        let err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let warning = ScanWarning::unreadable("/test/secret", &err);
        assert_eq!(warning.kind, WarningKind::PermissionDenied);
        assert!(warning.message.contains("Unable to open file"));

        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let warning = ScanWarning::unreadable("/test/vanished", &err);
        assert_eq!(warning.kind, WarningKind::Unreadable);
    }

    #[test]
    fn test_warning_json() {
        let err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let warning = ScanWarning::unreadable("/test/secret", &err);

        let json = serde_json::to_value(&warning).unwrap();
        assert_eq!(json["kind"], "permission_denied");
        assert_eq!(json["path"], "/test/secret");
    }

    #[test]
    fn test_monitor_error_from_store() {
        let err: MonitorError = StoreError::io(
            "baseline.txt",
            std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        )
        .into();
        assert!(matches!(err, MonitorError::Store(_)));
        assert!(err.to_string().contains("baseline.txt"));
    }
}
