//! Append-only alert log.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use hashwatch_core::{AlertSink, ScanEvent, StoreError};

use crate::ensure_parent;

/// Appends one line per event to a log file, optionally echoing it to
/// stdout. The file is never truncated.
#[derive(Debug)]
pub struct AlertLog {
    path: PathBuf,
    mirror: bool,
    file: Option<File>,
}

impl AlertLog {
    /// Create an alert log at `path` that also writes to stdout.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            mirror: true,
            file: None,
        }
    }

    /// Enable or disable the stdout mirror.
    pub fn with_mirror(mut self, mirror: bool) -> Self {
        self.mirror = mirror;
        self
    }

    /// Location of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn file(&mut self) -> Result<&mut File, StoreError> {
        let file = match self.file.take() {
            Some(file) => file,
            None => {
                ensure_parent(&self.path).map_err(|e| StoreError::io(&self.path, e))?;
                OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&self.path)
                    .map_err(|e| StoreError::io(&self.path, e))?
            }
        };
        Ok(self.file.insert(file))
    }
}

impl AlertSink for AlertLog {
    fn emit(&mut self, event: &ScanEvent) -> Result<(), StoreError> {
        let line = event.alert_line();

        if self.mirror {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(line.as_bytes())
                .and_then(|()| stdout.flush())
                .map_err(StoreError::Console)?;
        }

        let path = self.path.clone();
        self.file()?
            .write_all(line.as_bytes())
            .map_err(|e| StoreError::io(path, e))
    }
}
