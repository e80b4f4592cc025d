//! The baseline of known files and its line format.
//!
//! A stored baseline is one `<path>\t<fingerprint>\n` line per file. The
//! path is written as the raw bytes of the OS string, so names that are
//! not UTF-8 or that carry surrounding whitespace load back unchanged.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::fingerprint::Fingerprint;

/// Separator between path and fingerprint in a baseline line.
const FIELD_SEPARATOR: u8 = b'\t';

/// What the baseline knows about a single path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Fingerprint recorded the last time the file was hashed.
    pub fingerprint: Fingerprint,
    /// Set when the path is observed during the current round.
    pub seen_this_round: bool,
}

impl FileRecord {
    /// Create a record that has not been seen this round.
    pub fn new(fingerprint: Fingerprint) -> Self {
        Self {
            fingerprint,
            seen_this_round: false,
        }
    }
}

/// A path and its fingerprint, as stored in the baseline sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaselineEntry {
    pub path: PathBuf,
    pub fingerprint: Fingerprint,
}

impl BaselineEntry {
    pub fn new(path: impl Into<PathBuf>, fingerprint: Fingerprint) -> Self {
        Self {
            path: path.into(),
            fingerprint,
        }
    }
}

/// Mapping from monitored paths to their records.
///
/// Iteration follows insertion order, which keeps the order of deletion
/// events stable between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Baseline {
    records: IndexMap<PathBuf, FileRecord>,
}

impl Baseline {
    /// Create an empty baseline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tracked paths.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if no paths are tracked.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up the record for a path.
    pub fn get(&self, path: &Path) -> Option<&FileRecord> {
        self.records.get(path)
    }

    /// Look up the record for a path mutably.
    pub fn get_mut(&mut self, path: &Path) -> Option<&mut FileRecord> {
        self.records.get_mut(path)
    }

    /// Get the recorded fingerprint for a path.
    pub fn fingerprint(&self, path: &Path) -> Option<&Fingerprint> {
        self.records.get(path).map(|r| &r.fingerprint)
    }

    /// Check if a path is tracked.
    pub fn contains(&self, path: &Path) -> bool {
        self.records.contains_key(path)
    }

    /// Insert or replace a record that has not been seen this round.
    pub fn insert(&mut self, path: impl Into<PathBuf>, fingerprint: Fingerprint) {
        self.records.insert(path.into(), FileRecord::new(fingerprint));
    }

    /// Insert or replace a record already marked as seen this round.
    pub fn insert_seen(&mut self, path: impl Into<PathBuf>, fingerprint: Fingerprint) {
        self.records.insert(
            path.into(),
            FileRecord {
                fingerprint,
                seen_this_round: true,
            },
        );
    }

    /// Iterate over paths and records in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&PathBuf, &FileRecord)> {
        self.records.iter()
    }

    /// Iterate over the baseline as sink entries.
    pub fn entries(&self) -> impl Iterator<Item = BaselineEntry> + '_ {
        self.records
            .iter()
            .map(|(path, record)| BaselineEntry::new(path.clone(), record.fingerprint.clone()))
    }

    /// Remove every record not seen this round and reset the flag on the
    /// survivors. Returns the removed paths in iteration order.
    pub fn sweep_unseen(&mut self) -> Vec<PathBuf> {
        let mut removed = Vec::new();
        self.records.retain(|path, record| {
            if record.seen_this_round {
                record.seen_this_round = false;
                true
            } else {
                removed.push(path.clone());
                false
            }
        });
        removed
    }
}

impl FromIterator<BaselineEntry> for Baseline {
    fn from_iter<I: IntoIterator<Item = BaselineEntry>>(iter: I) -> Self {
        let mut baseline = Baseline::new();
        for entry in iter {
            baseline.insert(entry.path, entry.fingerprint);
        }
        baseline
    }
}

/// Result of parsing the contents of a baseline sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedBaseline {
    /// No entries at all (empty text or only blank lines).
    Empty,
    /// A line did not hold a path and a fingerprint.
    Corrupt {
        /// 1-based line number.
        line: usize,
        /// The offending line, lossily decoded.
        content: String,
    },
    /// Every line parsed.
    Entries(Vec<BaselineEntry>),
}

/// Render one baseline line, newline included.
pub fn encode_line(path: &Path, fingerprint: &Fingerprint) -> Vec<u8> {
    let path = path.as_os_str().as_encoded_bytes();
    let fingerprint = fingerprint.to_string();

    let mut line = Vec::with_capacity(path.len() + fingerprint.len() + 2);
    line.extend_from_slice(path);
    line.push(FIELD_SEPARATOR);
    line.extend_from_slice(fingerprint.as_bytes());
    line.push(b'\n');
    line
}

/// Parse the full contents of a baseline sink.
///
/// Blank lines are only accepted at the very end. A corrupt line makes the
/// whole store unusable; partial results are never returned.
pub fn parse_baseline(data: impl AsRef<[u8]>) -> ParsedBaseline {
    let lines: Vec<&[u8]> = data
        .as_ref()
        .split(|&b| b == b'\n')
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
        .collect();

    let last_content = lines.iter().rposition(|line| !line.trim_ascii().is_empty());
    let Some(last_content) = last_content else {
        return ParsedBaseline::Empty;
    };

    let mut entries = Vec::with_capacity(last_content + 1);
    for (index, line) in lines[..=last_content].iter().enumerate() {
        match parse_line(line) {
            Some(entry) => entries.push(entry),
            None => {
                return ParsedBaseline::Corrupt {
                    line: index + 1,
                    content: String::from_utf8_lossy(line).into_owned(),
                };
            }
        }
    }

    ParsedBaseline::Entries(entries)
}

// The fingerprint never holds a tab, so the last one ends the path.
fn parse_line(line: &[u8]) -> Option<BaselineEntry> {
    let split = line.iter().rposition(|&b| b == FIELD_SEPARATOR)?;
    let (path, fingerprint) = (&line[..split], &line[split + 1..]);
    if path.is_empty() {
        return None;
    }
    let fingerprint = std::str::from_utf8(fingerprint).ok()?.trim().parse().ok()?;
    Some(BaselineEntry::new(path_from_bytes(path)?, fingerprint))
}

#[cfg(unix)]
fn path_from_bytes(bytes: &[u8]) -> Option<PathBuf> {
    use std::os::unix::ffi::OsStrExt;
    Some(PathBuf::from(std::ffi::OsStr::from_bytes(bytes)))
}

#[cfg(not(unix))]
fn path_from_bytes(bytes: &[u8]) -> Option<PathBuf> {
    std::str::from_utf8(bytes).ok().map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::ContentDigest;

    fn digest(byte: u8) -> Fingerprint {
        Fingerprint::Digest(ContentDigest::new(vec![byte; 4]))
    }

    #[test]
    fn test_encode_line() {
        let line = encode_line(Path::new("./a.txt"), &digest(0xab));
        assert_eq!(line, b"./a.txt\tabababab\n");

        let line = encode_line(Path::new("./b.txt"), &Fingerprint::Unreadable);
        assert_eq!(line, b"./b.txt\tERROR\n");
    }

    #[test]
    fn test_parse_entries() {
        let text = "./a.txt\tabababab\n./sub/b.txt\tERROR\n";
        let parsed = parse_baseline(text);
        assert_eq!(
            parsed,
            ParsedBaseline::Entries(vec![
                BaselineEntry::new("./a.txt", digest(0xab)),
                BaselineEntry::new("./sub/b.txt", Fingerprint::Unreadable),
            ])
        );
    }

    #[test]
    fn test_parse_tolerates_trailing_blank_lines_and_crlf() {
        let text = "./a.txt\tabababab\r\n\n\n";
        let parsed = parse_baseline(text);
        assert_eq!(
            parsed,
            ParsedBaseline::Entries(vec![BaselineEntry::new("./a.txt", digest(0xab))])
        );
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(parse_baseline(""), ParsedBaseline::Empty);
        assert_eq!(parse_baseline("\n\n"), ParsedBaseline::Empty);
    }

    #[test]
    fn test_parse_corrupt() {
        let parsed = parse_baseline("./a.txt\tabababab\nnot a baseline line\n");
        assert_eq!(
            parsed,
            ParsedBaseline::Corrupt {
                line: 2,
                content: "not a baseline line".to_string()
            }
        );

        // Extra field after the fingerprint
        assert!(matches!(
            parse_baseline("./a.txt\tabab\textra\n"),
            ParsedBaseline::Corrupt { line: 1, .. }
        ));

        // Blank line before more content
        assert!(matches!(
            parse_baseline("./a.txt\tabab\n\n./b.txt\tabab\n"),
            ParsedBaseline::Corrupt { line: 2, .. }
        ));

        // Fingerprint that is not hex
        assert!(matches!(
            parse_baseline("./a.txt\tnothex\n"),
            ParsedBaseline::Corrupt { line: 1, .. }
        ));
    }

    #[test]
    fn test_path_whitespace_and_tabs_survive() {
        for name in [" leading.txt", "trailing space ", "tab\tinside.txt"] {
            let path = PathBuf::from("./dir").join(name);
            let line = encode_line(&path, &digest(0xcd));
            assert_eq!(
                parse_baseline(&line),
                ParsedBaseline::Entries(vec![BaselineEntry::new(path, digest(0xcd))])
            );
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_path_survives() {
        use std::os::unix::ffi::OsStrExt;

        let path = PathBuf::from(std::ffi::OsStr::from_bytes(b"./bad\xff.txt"));
        let line = encode_line(&path, &Fingerprint::Unreadable);
        assert_eq!(line, b"./bad\xff.txt\tERROR\n");
        assert_eq!(
            parse_baseline(&line),
            ParsedBaseline::Entries(vec![BaselineEntry::new(path, Fingerprint::Unreadable)])
        );
    }

    #[test]
    fn test_sweep_unseen() {
        let mut baseline = Baseline::new();
        baseline.insert("a", digest(1));
        baseline.insert("b", digest(2));
        baseline.insert_seen("c", digest(3));
        if let Some(record) = baseline.get_mut(Path::new("a")) {
            record.seen_this_round = true;
        }

        let removed = baseline.sweep_unseen();
        assert_eq!(removed, vec![PathBuf::from("b")]);
        assert_eq!(baseline.len(), 2);
        assert!(baseline.iter().all(|(_, record)| !record.seen_this_round));
    }

    #[test]
    fn test_from_entries_resets_seen() {
        let baseline: Baseline = vec![
            BaselineEntry::new("a", digest(1)),
            BaselineEntry::new("b", Fingerprint::Unreadable),
        ]
        .into_iter()
        .collect();

        assert_eq!(baseline.len(), 2);
        assert_eq!(baseline.fingerprint(Path::new("b")), Some(&Fingerprint::Unreadable));
        assert!(baseline.iter().all(|(_, record)| !record.seen_this_round));
        assert_eq!(baseline.entries().count(), 2);
    }
}
