//! Content fingerprinting.
//!
//! Every file is hashed in full on every call. Content must be UTF-8
//! text. A file that cannot be opened, read or decoded does not fail the
//! caller; it fingerprints as [`Fingerprint::Unreadable`] and the failure
//! is logged.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use sha2::{Digest, Sha512};
use sha3::Sha3_512;

use hashwatch_core::{ContentDigest, DigestAlgorithm, Fingerprint, ScanWarning};

/// Read buffer size.
const BUFFER_SIZE: usize = 64 * 1024;

/// Computes fingerprints for files.
#[derive(Debug, Clone, Copy, Default)]
pub struct Digester {
    algorithm: DigestAlgorithm,
}

impl Digester {
    /// Create a digester for the given algorithm.
    pub fn new(algorithm: DigestAlgorithm) -> Self {
        Self { algorithm }
    }

    /// Fingerprint the file at `path`, degrading to `Unreadable` on failure.
    pub fn fingerprint(&self, path: &Path) -> Fingerprint {
        self.fingerprint_with_warning(path).0
    }

    /// Like [`fingerprint`](Self::fingerprint), also returning the warning
    /// describing a failed read.
    pub fn fingerprint_with_warning(&self, path: &Path) -> (Fingerprint, Option<ScanWarning>) {
        match self.digest_file(path) {
            Ok(digest) => (Fingerprint::Digest(digest), None),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "Unable to open file");
                (Fingerprint::Unreadable, Some(ScanWarning::unreadable(path, &err)))
            }
        }
    }

    /// Hash the full content of a file. One read attempt, no retries.
    ///
    /// Content that is not valid UTF-8 fails with `InvalidData`.
    pub fn digest_file(&self, path: &Path) -> io::Result<ContentDigest> {
        let file = File::open(path)?;
        self.digest_reader(file)
    }

    /// Hash everything a reader yields, requiring it to be UTF-8 text.
    pub fn digest_reader<R: Read>(&self, mut reader: R) -> io::Result<ContentDigest> {
        let mut hasher = ContentHasher::new(self.algorithm);
        let mut text = TextCheck::default();
        let mut buffer = vec![0u8; BUFFER_SIZE];

        loop {
            let bytes_read = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            };
            text.feed(&buffer[..bytes_read])?;
            hasher.update(&buffer[..bytes_read]);
        }

        text.finish()?;
        Ok(hasher.finalize())
    }

    /// Hash an in-memory buffer.
    pub fn digest_bytes(&self, bytes: &[u8]) -> ContentDigest {
        let mut hasher = ContentHasher::new(self.algorithm);
        hasher.update(bytes);
        hasher.finalize()
    }
}

/// Incremental UTF-8 validation across read boundaries.
///
/// Holds back the bytes of a multi-byte sequence split by the end of a
/// chunk until the next chunk completes it.
#[derive(Debug, Default)]
struct TextCheck {
    pending: Vec<u8>,
}

impl TextCheck {
    fn feed(&mut self, chunk: &[u8]) -> io::Result<()> {
        let joined;
        let bytes = if self.pending.is_empty() {
            chunk
        } else {
            self.pending.extend_from_slice(chunk);
            joined = std::mem::take(&mut self.pending);
            &joined[..]
        };

        match std::str::from_utf8(bytes) {
            Ok(_) => Ok(()),
            // Truncated sequence at the end: wait for more input
            Err(err) if err.error_len().is_none() => {
                self.pending = bytes[err.valid_up_to()..].to_vec();
                Ok(())
            }
            Err(_) => Err(not_text()),
        }
    }

    fn finish(self) -> io::Result<()> {
        if self.pending.is_empty() {
            Ok(())
        } else {
            Err(not_text())
        }
    }
}

fn not_text() -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, "content is not valid UTF-8 text")
}

enum ContentHasher {
    Sha3_512(Box<Sha3_512>),
    Sha512(Sha512),
    Blake3(Box<blake3::Hasher>),
}

impl ContentHasher {
    fn new(algorithm: DigestAlgorithm) -> Self {
        match algorithm {
            DigestAlgorithm::Sha3_512 => ContentHasher::Sha3_512(Box::new(Sha3_512::new())),
            DigestAlgorithm::Sha512 => ContentHasher::Sha512(Sha512::new()),
            DigestAlgorithm::Blake3 => ContentHasher::Blake3(Box::new(blake3::Hasher::new())),
        }
    }

    fn update(&mut self, bytes: &[u8]) {
        match self {
            ContentHasher::Sha3_512(hasher) => hasher.update(bytes),
            ContentHasher::Sha512(hasher) => hasher.update(bytes),
            ContentHasher::Blake3(hasher) => {
                hasher.update(bytes);
            }
        }
    }

    fn finalize(self) -> ContentDigest {
        match self {
            ContentHasher::Sha3_512(hasher) => ContentDigest::new(hasher.finalize().to_vec()),
            ContentHasher::Sha512(hasher) => ContentDigest::new(hasher.finalize().to_vec()),
            ContentHasher::Blake3(hasher) => ContentDigest::new(hasher.finalize().as_bytes().to_vec()),
        }
    }
}
