//! File-backed sinks for hashwatch.
//!
//! - [`BaselineFile`] persists the baseline as `<path>\t<fingerprint>` lines.
//! - [`AlertLog`] appends one line per event and can mirror it to stdout.
//!
//! Neither sink swallows write errors: a failed write surfaces as a
//! [`StoreError`] and stops the monitor.

mod alert_log;
mod baseline_file;

pub use alert_log::AlertLog;
pub use baseline_file::BaselineFile;

pub use hashwatch_core::StoreError;

/// Create the parent directory of `path` if it does not exist.
fn ensure_parent(path: &std::path::Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
        _ => Ok(()),
    }
}
