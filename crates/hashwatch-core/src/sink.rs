//! Sinks the engine persists baselines and reports events through.

use std::borrow::Cow;

use crate::baseline::{BaselineEntry, ParsedBaseline, encode_line, parse_baseline};
use crate::error::StoreError;
use crate::event::ScanEvent;

/// What a store found when asked to load a baseline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadedBaseline {
    /// Nothing has been persisted yet.
    Missing,
    /// Stored contents, parsed.
    Parsed(ParsedBaseline),
}

/// Persistent home of the baseline.
///
/// A fresh baseline calls [`reset`](Self::reset) once and then
/// [`append`](Self::append) for each file as soon as it is hashed.
pub trait BaselineStore {
    /// Discard anything previously stored.
    fn reset(&mut self) -> Result<(), StoreError>;

    /// Append a single entry.
    fn append(&mut self, entry: &BaselineEntry) -> Result<(), StoreError>;

    /// Read the whole store.
    fn load(&mut self) -> Result<LoadedBaseline, StoreError>;
}

/// Destination for change events.
pub trait AlertSink {
    /// Report a single event.
    fn emit(&mut self, event: &ScanEvent) -> Result<(), StoreError>;
}

impl AlertSink for Vec<ScanEvent> {
    fn emit(&mut self, event: &ScanEvent) -> Result<(), StoreError> {
        self.push(event.clone());
        Ok(())
    }
}

impl<T: AlertSink + ?Sized> AlertSink for &mut T {
    fn emit(&mut self, event: &ScanEvent) -> Result<(), StoreError> {
        (**self).emit(event)
    }
}

impl<T: BaselineStore + ?Sized> BaselineStore for &mut T {
    fn reset(&mut self) -> Result<(), StoreError> {
        (**self).reset()
    }

    fn append(&mut self, entry: &BaselineEntry) -> Result<(), StoreError> {
        (**self).append(entry)
    }

    fn load(&mut self) -> Result<LoadedBaseline, StoreError> {
        (**self).load()
    }
}

/// A baseline store kept in memory using the on-disk line format.
#[derive(Debug, Clone, Default)]
pub struct MemoryBaselineStore {
    contents: Option<Vec<u8>>,
}

impl MemoryBaselineStore {
    /// Create a store with nothing persisted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already holding `contents`.
    pub fn with_contents(contents: impl Into<Vec<u8>>) -> Self {
        Self {
            contents: Some(contents.into()),
        }
    }

    /// Raw stored bytes, if anything was persisted.
    pub fn contents(&self) -> Option<&[u8]> {
        self.contents.as_deref()
    }

    /// Stored contents as text, lossily decoded.
    pub fn text(&self) -> Option<Cow<'_, str>> {
        self.contents.as_deref().map(String::from_utf8_lossy)
    }
}

impl BaselineStore for MemoryBaselineStore {
    fn reset(&mut self) -> Result<(), StoreError> {
        self.contents = Some(Vec::new());
        Ok(())
    }

    fn append(&mut self, entry: &BaselineEntry) -> Result<(), StoreError> {
        self.contents
            .get_or_insert_with(Vec::new)
            .extend_from_slice(&encode_line(&entry.path, &entry.fingerprint));
        Ok(())
    }

    fn load(&mut self) -> Result<LoadedBaseline, StoreError> {
        Ok(match &self.contents {
            Some(contents) => LoadedBaseline::Parsed(parse_baseline(contents)),
            None => LoadedBaseline::Missing,
        })
    }
}
