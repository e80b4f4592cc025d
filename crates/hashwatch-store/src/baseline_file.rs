//! Baseline persisted to a file.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use hashwatch_core::{
    BaselineEntry, BaselineStore, LoadedBaseline, StoreError, encode_line, parse_baseline,
};

use crate::ensure_parent;

/// Baseline store backed by a TAB separated text file.
///
/// Each appended entry is written straight to the file, so an interrupted
/// baseline build leaves every already-hashed line on disk.
#[derive(Debug)]
pub struct BaselineFile {
    path: PathBuf,
    writer: Option<File>,
}

impl BaselineFile {
    /// Create a store for `path`. Nothing is touched until first use.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writer: None,
        }
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open_append(&self) -> Result<File, StoreError> {
        ensure_parent(&self.path).map_err(|e| StoreError::io(&self.path, e))?;
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| StoreError::io(&self.path, e))
    }
}

impl BaselineStore for BaselineFile {
    fn reset(&mut self) -> Result<(), StoreError> {
        ensure_parent(&self.path).map_err(|e| StoreError::io(&self.path, e))?;
        let file = File::create(&self.path).map_err(|e| StoreError::io(&self.path, e))?;
        tracing::debug!(path = %self.path.display(), "Baseline file truncated");
        self.writer = Some(file);
        Ok(())
    }

    fn append(&mut self, entry: &BaselineEntry) -> Result<(), StoreError> {
        if self.writer.is_none() {
            self.writer = Some(self.open_append()?);
        }
        let line = encode_line(&entry.path, &entry.fingerprint);
        if let Some(writer) = self.writer.as_mut() {
            writer
                .write_all(&line)
                .map_err(|e| StoreError::io(&self.path, e))?;
        }
        Ok(())
    }

    fn load(&mut self) -> Result<LoadedBaseline, StoreError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(LoadedBaseline::Missing);
            }
            Err(err) => return Err(StoreError::io(&self.path, err)),
        };

        Ok(LoadedBaseline::Parsed(parse_baseline(&bytes)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hashwatch_core::{ContentDigest, Fingerprint, ParsedBaseline};
    use std::fs;
    use tempfile::TempDir;

    fn digest(byte: u8) -> Fingerprint {
        Fingerprint::Digest(ContentDigest::new(vec![byte; 64]))
    }

    #[test]
    fn test_missing_file() {
        let temp = TempDir::new().unwrap();
        let mut store = BaselineFile::new(temp.path().join("baseline.txt"));
        assert_eq!(store.load().unwrap(), LoadedBaseline::Missing);
    }

    #[test]
    fn test_reset_truncates() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("baseline.txt");
        fs::write(&path, "./old.txt\tERROR\n").unwrap();

        let mut store = BaselineFile::new(&path);
        store.reset().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
        assert_eq!(
            store.load().unwrap(),
            LoadedBaseline::Parsed(ParsedBaseline::Empty)
        );
    }

    #[test]
    fn test_append_writes_lines_immediately() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("state/baseline.txt");
        let mut store = BaselineFile::new(&path);

        store.reset().unwrap();
        store
            .append(&BaselineEntry::new("./a.txt", digest(0x01)))
            .unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 1);

        store
            .append(&BaselineEntry::new("./b.txt", Fingerprint::Unreadable))
            .unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.ends_with("./b.txt\tERROR\n"));

        match store.load().unwrap() {
            LoadedBaseline::Parsed(ParsedBaseline::Entries(entries)) => {
                assert_eq!(entries.len(), 2);
                assert_eq!(entries[0].fingerprint, digest(0x01));
            }
            other => panic!("unexpected load result: {other:?}"),
        }
    }

    #[test]
    fn test_append_without_reset_appends() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("baseline.txt");
        fs::write(&path, "./old.txt\tERROR\n").unwrap();

        let mut store = BaselineFile::new(&path);
        store
            .append(&BaselineEntry::new("./new.txt", Fingerprint::Unreadable))
            .unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 2);
    }

    #[test]
    fn test_invalid_utf8_fingerprint_is_corrupt() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("baseline.txt");
        fs::write(&path, b"./a.txt\tERROR\n./b.txt\tab\xff\n").unwrap();

        let mut store = BaselineFile::new(&path);
        assert!(matches!(
            store.load().unwrap(),
            LoadedBaseline::Parsed(ParsedBaseline::Corrupt { line: 2, .. })
        ));
    }
}
