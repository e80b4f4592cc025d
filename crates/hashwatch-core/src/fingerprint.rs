//! Content fingerprints.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Text written to the baseline for a file that could not be read.
pub const UNREADABLE_MARKER: &str = "ERROR";

/// Older baselines wrote the marker with a trailing bang.
const LEGACY_UNREADABLE_MARKER: &str = "ERROR!";

/// Raw bytes of a cryptographic content digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentDigest(Vec<u8>);

impl ContentDigest {
    /// Create a new ContentDigest from raw bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Get the digest as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Parse a hex string. Returns `None` for odd lengths, empty input or
    /// non-hex characters.
    pub fn from_hex(hex: &str) -> Option<Self> {
        if hex.is_empty() || hex.len() % 2 != 0 {
            return None;
        }
        let bytes = hex
            .as_bytes()
            .chunks(2)
            .map(|pair| {
                let pair = std::str::from_utf8(pair).ok()?;
                u8::from_str_radix(pair, 16).ok()
            })
            .collect::<Option<Vec<u8>>>()?;
        Some(Self(bytes))
    }
}

/// The recorded state of a file's content.
///
/// A failed read is its own variant rather than a magic digest string, so
/// a real digest can never be mistaken for the marker. Two `Unreadable`
/// values compare equal: a file that stays unreadable is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Fingerprint {
    /// Digest of the full content at read time.
    Digest(ContentDigest),
    /// The file could not be opened or read.
    Unreadable,
}

impl Fingerprint {
    /// Check if this is the unreadable marker.
    pub fn is_unreadable(&self) -> bool {
        matches!(self, Fingerprint::Unreadable)
    }

    /// Get the digest, if the file was readable.
    pub fn digest(&self) -> Option<&ContentDigest> {
        match self {
            Fingerprint::Digest(digest) => Some(digest),
            Fingerprint::Unreadable => None,
        }
    }
}

impl From<ContentDigest> for Fingerprint {
    fn from(digest: ContentDigest) -> Self {
        Fingerprint::Digest(digest)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fingerprint::Digest(digest) => f.write_str(&digest.to_hex()),
            Fingerprint::Unreadable => f.write_str(UNREADABLE_MARKER),
        }
    }
}

/// A fingerprint field that is neither hex nor the unreadable marker.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid fingerprint: {0:?}")]
pub struct ParseFingerprintError(pub String);

impl FromStr for Fingerprint {
    type Err = ParseFingerprintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == UNREADABLE_MARKER || s == LEGACY_UNREADABLE_MARKER {
            return Ok(Fingerprint::Unreadable);
        }
        ContentDigest::from_hex(s)
            .map(Fingerprint::Digest)
            .ok_or_else(|| ParseFingerprintError(s.to_string()))
    }
}
