//! Integrity verification after a fetch.
//!
//! CRC-32 is the standard IEEE polynomial used by gzip and zip, so expected
//! values published next to datasets match byte for byte. Checksums are
//! computed on demand by the caller, never inline with the transfer.

use crate::error::Error;
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

const BUF_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChecksumAlgorithm {
    #[default]
    Crc32,
    Sha256,
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChecksumAlgorithm::Crc32 => write!(f, "crc32"),
            ChecksumAlgorithm::Sha256 => write!(f, "sha256"),
        }
    }
}

/// Expected and computed digests for one comparison. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecksumRecord {
    pub algorithm: ChecksumAlgorithm,
    pub expected: String,
    pub computed: String,
}

/// Outcome of comparing a local file against an expected digest.
#[derive(Debug)]
pub enum ChecksumOutcome {
    Match,
    /// The file was read but its content differs: a data-integrity failure.
    Mismatch(ChecksumRecord),
    /// The file could not be read at all: an environment failure.
    SourceUnavailable(Error),
}

impl ChecksumOutcome {
    pub fn is_match(&self) -> bool {
        matches!(self, ChecksumOutcome::Match)
    }
}

enum Hasher {
    Crc32(flate2::Crc),
    Sha256(Sha256),
}

impl Hasher {
    fn new(algorithm: ChecksumAlgorithm) -> Self {
        match algorithm {
            ChecksumAlgorithm::Crc32 => Hasher::Crc32(flate2::Crc::new()),
            ChecksumAlgorithm::Sha256 => Hasher::Sha256(Sha256::new()),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Hasher::Crc32(c) => c.update(data),
            Hasher::Sha256(h) => h.update(data),
        }
    }

    fn finish(self) -> String {
        match self {
            Hasher::Crc32(c) => format!("{:08x}", c.sum()),
            Hasher::Sha256(h) => hex::encode(h.finalize()),
        }
    }
}

/// Streams `path` through `algorithm` and returns the lowercase hex digest.
/// A missing file yields `Error::NotFound`; other read failures `Error::Io`.
pub fn digest_path(path: &Path, algorithm: ChecksumAlgorithm) -> Result<String, Error> {
    let mut f = File::open(path).map_err(|e| Error::from_read(path, e))?;
    let mut hasher = Hasher::new(algorithm);
    let mut buf = vec![0u8; BUF_SIZE];
    loop {
        let n = f.read(&mut buf).map_err(|e| Error::from_read(path, e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finish())
}

/// CRC-32 of a file as 8 lowercase, zero-padded hex characters.
pub fn crc32_path(path: &Path) -> Result<String, Error> {
    digest_path(path, ChecksumAlgorithm::Crc32)
}

/// SHA-256 of a file as lowercase hex.
pub fn sha256_path(path: &Path) -> Result<String, Error> {
    digest_path(path, ChecksumAlgorithm::Sha256)
}

/// Canonical form of a caller-supplied digest: trimmed, lowercase, no `0x`,
/// and for CRC-32 left-padded to 8 digits.
fn normalize_expected(algorithm: ChecksumAlgorithm, expected: &str) -> String {
    let trimmed = expected.trim();
    let bare = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed)
        .to_ascii_lowercase();
    match algorithm {
        ChecksumAlgorithm::Crc32 if bare.len() < 8 && bare.chars().all(|c| c.is_ascii_hexdigit()) => {
            format!("{:0>8}", bare)
        }
        _ => bare,
    }
}

/// Compares the digest of `path` to `expected`, case-insensitively.
pub fn compare_checksum(path: &Path, algorithm: ChecksumAlgorithm, expected: &str) -> ChecksumOutcome {
    let computed = match digest_path(path, algorithm) {
        Ok(c) => c,
        Err(e) => {
            tracing::debug!(path = %path.display(), "checksum source unavailable: {}", e);
            return ChecksumOutcome::SourceUnavailable(e);
        }
    };
    let expected = normalize_expected(algorithm, expected);
    if computed == expected {
        ChecksumOutcome::Match
    } else {
        tracing::debug!(
            path = %path.display(),
            %algorithm,
            %expected,
            %computed,
            "checksum mismatch"
        );
        ChecksumOutcome::Mismatch(ChecksumRecord {
            algorithm,
            expected,
            computed,
        })
    }
}

/// CRC-32 comparison against an 8-hex-digit expected value.
pub fn compare_crc32(path: &Path, expected: &str) -> ChecksumOutcome {
    compare_checksum(path, ChecksumAlgorithm::Crc32, expected)
}
