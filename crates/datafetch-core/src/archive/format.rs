//! Container detection from leading bytes (never from the file name).

use crate::error::ExtractErrorKind;

/// Bytes needed to see every signature we check (tar's `ustar` sits at 257).
pub(super) const SNIFF_LEN: usize = 512;

const GZIP: &[u8] = &[0x1f, 0x8b];
const ZIP: &[u8] = b"PK\x03\x04";
const ZIP_EMPTY: &[u8] = b"PK\x05\x06";
const BZIP2: &[u8] = b"BZh";
const XZ: &[u8] = &[0xfd, b'7', b'z', b'X', b'Z', 0x00];
const ZSTD: &[u8] = &[0x28, 0xb5, 0x2f, 0xfd];
const SEVEN_Z: &[u8] = &[b'7', b'z', 0xbc, 0xaf, 0x27, 0x1c];
const USTAR_OFFSET: usize = 257;
const USTAR: &[u8] = b"ustar";

/// Archive containers this crate can unpack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    TarGz,
    Tar,
}

/// Detects the container from the first `SNIFF_LEN` bytes of the file.
pub(super) fn detect(head: &[u8]) -> Result<ArchiveFormat, ExtractErrorKind> {
    if head.is_empty() {
        return Err(ExtractErrorKind::Truncated);
    }
    if head.starts_with(GZIP) {
        return Ok(ArchiveFormat::TarGz);
    }
    if head.get(USTAR_OFFSET..USTAR_OFFSET + USTAR.len()) == Some(USTAR) {
        return Ok(ArchiveFormat::Tar);
    }
    let unsupported = [
        (ZIP, "zip"),
        (ZIP_EMPTY, "zip"),
        (BZIP2, "bzip2"),
        (XZ, "xz"),
        (ZSTD, "zstd"),
        (SEVEN_Z, "7z"),
    ];
    for (magic, name) in unsupported {
        if head.starts_with(magic) {
            return Err(ExtractErrorKind::UnsupportedCompression(name));
        }
    }
    // A gzip magic split across a too-short file.
    if head.len() < GZIP.len() && GZIP.starts_with(head) {
        return Err(ExtractErrorKind::Truncated);
    }
    Err(ExtractErrorKind::UnrecognizedFormat)
}
