//! Archive Unpacker: expand a downloaded archive under a target directory
//! and report which member files resulted.
//!
//! Members are unpacked into a hidden staging directory inside the target
//! and moved into place only once the whole archive has been read, so a
//! truncated, corrupt or hostile archive leaves no members behind.

mod format;
mod member;

pub use format::ArchiveFormat;

use crate::error::{ExtractError, ExtractErrorKind};
use flate2::read::MultiGzDecoder;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

const STAGING_PREFIX: &str = ".datafetch-extract-";
const BACKUP_PREFIX: &str = ".datafetch-replaced-";

/// Member files produced by one extraction, in archive order.
///
/// A view of what now exists on disk: the files belong to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionResult {
    target_dir: PathBuf,
    members: Vec<PathBuf>,
}

impl ExtractionResult {
    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    /// Non-directory members, relative to `target_dir`.
    pub fn members(&self) -> &[PathBuf] {
        &self.members
    }

    /// Members joined onto `target_dir`.
    pub fn paths(&self) -> impl Iterator<Item = PathBuf> + '_ {
        self.members.iter().map(|m| self.target_dir.join(m))
    }

    /// First member whose file name is `name`, as a full path.
    pub fn find(&self, name: &str) -> Option<PathBuf> {
        self.members
            .iter()
            .find(|m| m.file_name().is_some_and(|f| f == name))
            .map(|m| self.target_dir.join(m))
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Reads the leading bytes of `archive` and reports its container.
pub fn detect_format(archive: &Path) -> Result<ArchiveFormat, ExtractError> {
    let file = open(archive)?;
    sniff(file, archive).map(|(format, _)| format)
}

/// Expands `archive` under `target_dir` (created if absent).
///
/// Supports gzip-compressed and plain tar, detected by signature. Fails
/// without writing any member if the archive is truncated, malformed, uses
/// an unsupported compression, or any member would escape `target_dir`.
/// Files a member replaces are restored if moving members into place fails.
/// The source archive is left in place.
pub fn extract(
    archive: impl AsRef<Path>,
    target_dir: impl AsRef<Path>,
) -> Result<ExtractionResult, ExtractError> {
    let archive = archive.as_ref();
    let target_dir = target_dir.as_ref();
    let io_err = |e: io::Error| ExtractError::new(ExtractErrorKind::Io, archive).with_source(e);

    let (format, file) = sniff(open(archive)?, archive)?;
    tracing::debug!(
        archive = %archive.display(),
        target = %target_dir.display(),
        ?format,
        "extract start"
    );

    fs::create_dir_all(target_dir).map_err(io_err)?;
    let staging = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .tempdir_in(target_dir)
        .map_err(io_err)?;

    let reader = BufReader::new(file);
    let unpacked = match format {
        ArchiveFormat::TarGz => unpack_tar(MultiGzDecoder::new(reader), staging.path(), archive)?,
        ArchiveFormat::Tar => unpack_tar(reader, staging.path(), archive)?,
    };

    let backup = tempfile::Builder::new()
        .prefix(BACKUP_PREFIX)
        .tempdir_in(target_dir)
        .map_err(io_err)?;
    commit(staging.path(), backup.path(), target_dir, &unpacked).map_err(io_err)?;
    tracing::info!(
        archive = %archive.display(),
        target = %target_dir.display(),
        members = unpacked.files.len(),
        "extracted"
    );
    Ok(ExtractionResult {
        target_dir: target_dir.to_path_buf(),
        members: unpacked.files,
    })
}

fn open(archive: &Path) -> Result<File, ExtractError> {
    File::open(archive).map_err(|e| {
        let kind = if e.kind() == io::ErrorKind::NotFound {
            ExtractErrorKind::NotFound
        } else {
            ExtractErrorKind::Io
        };
        ExtractError::new(kind, archive).with_source(e)
    })
}

/// Detects the format and rewinds the file for reading.
fn sniff(mut file: File, archive: &Path) -> Result<(ArchiveFormat, File), ExtractError> {
    let io_err = |e: io::Error| ExtractError::new(ExtractErrorKind::Io, archive).with_source(e);
    let mut head = Vec::with_capacity(format::SNIFF_LEN);
    (&mut file)
        .take(format::SNIFF_LEN as u64)
        .read_to_end(&mut head)
        .map_err(io_err)?;
    let format = format::detect(&head).map_err(|kind| ExtractError::new(kind, archive))?;
    file.seek(SeekFrom::Start(0)).map_err(io_err)?;
    Ok((format, file))
}

/// What landed in the staging directory, in archive order.
#[derive(Debug, Default)]
struct Unpacked {
    dirs: Vec<PathBuf>,
    files: Vec<PathBuf>,
}

impl Unpacked {
    /// A member listed twice keeps only its last position, like `tar -x`.
    fn push_file(&mut self, relative: PathBuf) {
        self.files.retain(|f| f != &relative);
        self.files.push(relative);
    }
}

fn unpack_tar<R: Read>(reader: R, staging: &Path, archive: &Path) -> Result<Unpacked, ExtractError> {
    let from_io = |e: io::Error| ExtractError::from_io(archive, e);
    let traversal =
        |p: &Path| ExtractError::new(ExtractErrorKind::PathTraversal(p.to_path_buf()), archive);

    let mut tar = tar::Archive::new(reader);
    tar.set_overwrite(true);
    let mut unpacked = Unpacked::default();
    let mut links: HashSet<PathBuf> = HashSet::new();

    for entry in tar.entries().map_err(from_io)? {
        let mut entry = entry.map_err(from_io)?;
        let entry_type = entry.header().entry_type();
        if entry_type.is_pax_global_extensions()
            || entry_type.is_pax_local_extensions()
            || entry_type.is_gnu_longname()
            || entry_type.is_gnu_longlink()
        {
            continue;
        }
        let raw = entry.path().map_err(from_io)?.into_owned();
        let relative = member::sanitize(&raw).ok_or_else(|| traversal(&raw))?;
        // Writing through a staged link would leave the member behind once links move.
        if member::passes_through(&relative, &links) {
            return Err(traversal(&raw));
        }

        if entry_type.is_dir() {
            if !relative.as_os_str().is_empty() {
                fs::create_dir_all(staging.join(&relative)).map_err(from_io)?;
                unpacked.dirs.push(relative);
            }
            continue;
        }
        if relative.as_os_str().is_empty() {
            return Err(ExtractError::new(ExtractErrorKind::Malformed, archive));
        }
        if entry_type.is_symlink() || entry_type.is_hard_link() {
            let target = entry
                .link_name()
                .map_err(from_io)?
                .ok_or_else(|| ExtractError::new(ExtractErrorKind::Malformed, archive))?
                .into_owned();
            let inside = if entry_type.is_symlink() {
                member::symlink_stays_inside(&relative, &target)
            } else {
                member::sanitize(&target)
                    .is_some_and(|t| !t.as_os_str().is_empty() && !member::passes_through(&t, &links))
            };
            if !inside {
                return Err(traversal(&raw));
            }
        }

        // `unpack_in` re-checks containment and resolves hard links against `staging`.
        if !entry.unpack_in(staging).map_err(from_io)? {
            return Err(traversal(&raw));
        }
        if entry_type.is_symlink() {
            links.insert(relative.clone());
        } else {
            links.remove(&relative);
        }
        unpacked.push_file(relative);
    }

    // The tar reader stops at the end-of-archive blocks; drain the rest so a
    // compressed stream's trailer (CRC and length) is read and checked.
    io::copy(&mut tar.into_inner(), &mut io::sink()).map_err(from_io)?;
    Ok(unpacked)
}

/// A member moved into `target`, and where the file it replaced was parked.
struct Placed {
    path: PathBuf,
    replaced: Option<PathBuf>,
}

/// Moves staged members into `target`.
///
/// Existing files a member replaces are parked in `backup` until every member
/// is in place. On failure, moved members are removed and parked files put back.
fn commit(staging: &Path, backup: &Path, target: &Path, unpacked: &Unpacked) -> io::Result<()> {
    for dir in &unpacked.dirs {
        fs::create_dir_all(target.join(dir))?;
    }
    let mut placed: Vec<Placed> = Vec::with_capacity(unpacked.files.len());
    for rel in &unpacked.files {
        if let Err(e) = place_member(staging, backup, target, rel, &mut placed) {
            roll_back(placed);
            return Err(e);
        }
    }
    Ok(())
}

fn place_member(
    staging: &Path,
    backup: &Path,
    target: &Path,
    rel: &Path,
    placed: &mut Vec<Placed>,
) -> io::Result<()> {
    let to = target.join(rel);
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)?;
    }
    let replaced = match fs::symlink_metadata(&to) {
        Ok(meta) if !meta.is_dir() => {
            let parked = backup.join(rel);
            if let Some(parent) = parked.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::rename(&to, &parked)?;
            Some(parked)
        }
        _ => None,
    };
    if let Err(e) = fs::rename(staging.join(rel), &to) {
        if let Some(parked) = &replaced {
            restore(parked, &to);
        }
        return Err(e);
    }
    placed.push(Placed { path: to, replaced });
    Ok(())
}

fn roll_back(placed: Vec<Placed>) {
    for p in placed.into_iter().rev() {
        if let Err(e) = fs::remove_file(&p.path) {
            tracing::warn!(path = %p.path.display(), "rollback: could not remove member: {}", e);
        }
        if let Some(parked) = &p.replaced {
            restore(parked, &p.path);
        }
    }
}

fn restore(parked: &Path, original: &Path) {
    if let Err(e) = fs::rename(parked, original) {
        tracing::warn!(
            path = %original.display(),
            "rollback: could not restore replaced file: {}",
            e
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;

    fn tar_gz(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let enc = GzEncoder::new(Vec::new(), Compression::default());
        let mut builder = tar::Builder::new(enc);
        for (name, body) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(body.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, *body).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap()
    }

    /// Writes a raw member name, bypassing `tar::Builder`'s own path checks.
    fn hostile_tar_gz(first: (&str, &[u8]), evil_name: &str) -> Vec<u8> {
        let enc = GzEncoder::new(Vec::new(), Compression::default());
        let mut builder = tar::Builder::new(enc);
        let mut header = tar::Header::new_gnu();
        header.set_size(first.1.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, first.0, first.1).unwrap();

        let body = b"pwned";
        let mut header = tar::Header::new_old();
        {
            let name = &mut header.as_old_mut().name;
            name[..evil_name.len()].copy_from_slice(evil_name.as_bytes());
        }
        header.set_size(body.len() as u64);
        header.set_mode(0o644);
        header.set_entry_type(tar::EntryType::Regular);
        header.set_cksum();
        builder.append(&header, &body[..]).unwrap();
        builder.into_inner().unwrap().finish().unwrap()
    }

    fn write_archive(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
        let p = dir.join(name);
        fs::write(&p, bytes).unwrap();
        p
    }

    fn visible_entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn extracts_members_in_archive_order() {
        let dir = tempfile::tempdir().unwrap();
        let archive = write_archive(
            dir.path(),
            "USCensus1990.tar.gz",
            &tar_gz(&[
                ("USCensus1990.csv", b"caseid,dAge\n10000,5\n"),
                ("USCensus1990_centroids.csv", b"cluster,dAge\n0,3\n"),
            ]),
        );
        let out = dir.path().join("out");
        let result = extract(&archive, &out).unwrap();

        assert_eq!(
            result.members(),
            &[
                PathBuf::from("USCensus1990.csv"),
                PathBuf::from("USCensus1990_centroids.csv")
            ]
        );
        assert_eq!(fs::read(out.join("USCensus1990.csv")).unwrap(), b"caseid,dAge\n10000,5\n");
        assert_eq!(
            result.find("USCensus1990_centroids.csv"),
            Some(out.join("USCensus1990_centroids.csv"))
        );
        assert!(archive.exists(), "source archive is kept");
        // Staging directory is gone.
        assert_eq!(
            visible_entries(&out),
            vec!["USCensus1990.csv", "USCensus1990_centroids.csv"]
        );
    }

    #[test]
    fn nested_members_create_directories() {
        let dir = tempfile::tempdir().unwrap();
        let archive = write_archive(
            dir.path(),
            "nested.tgz",
            &tar_gz(&[("set/train/a.csv", b"1\n"), ("set/test/b.csv", b"2\n")]),
        );
        let result = extract(&archive, dir.path().join("x")).unwrap();
        let paths: Vec<PathBuf> = result.paths().collect();
        assert_eq!(
            paths,
            vec![
                dir.path().join("x/set/train/a.csv"),
                dir.path().join("x/set/test/b.csv")
            ]
        );
        assert!(paths.iter().all(|p| p.is_file()));
    }

    #[test]
    fn detection_ignores_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let archive = write_archive(dir.path(), "data.bin", &tar_gz(&[("a.csv", b"a")]));
        assert_eq!(detect_format(&archive).unwrap(), ArchiveFormat::TarGz);
        let result = extract(&archive, dir.path()).unwrap();
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn plain_tar_is_supported() {
        let dir = tempfile::tempdir().unwrap();
        let mut builder = tar::Builder::new(Vec::new());
        let mut header = tar::Header::new_ustar();
        header.set_size(3);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, "b.csv", &b"1,2"[..]).unwrap();
        let bytes = builder.into_inner().unwrap();
        let archive = write_archive(dir.path(), "b.tar.gz", &bytes);
        assert_eq!(detect_format(&archive).unwrap(), ArchiveFormat::Tar);
        let result = extract(&archive, dir.path().join("t")).unwrap();
        assert_eq!(result.members(), &[PathBuf::from("b.csv")]);
    }

    #[test]
    fn parent_traversal_aborts_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let archive = write_archive(
            dir.path(),
            "evil.tar.gz",
            &hostile_tar_gz(("a.csv", b"fine"), "../evil.csv"),
        );
        let out = dir.path().join("out");
        let err = extract(&archive, &out).unwrap_err();
        assert_eq!(
            err.kind,
            ExtractErrorKind::PathTraversal(PathBuf::from("../evil.csv"))
        );
        assert!(!dir.path().join("evil.csv").exists());
        assert!(!out.join("a.csv").exists(), "earlier members are not kept");
        assert!(visible_entries(&out).is_empty());
    }

    #[test]
    fn absolute_member_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let archive = write_archive(
            dir.path(),
            "abs.tar.gz",
            &hostile_tar_gz(("a.csv", b"fine"), "/tmp/datafetch-evil.csv"),
        );
        let out = dir.path().join("out");
        let err = extract(&archive, &out).unwrap_err();
        assert!(matches!(err.kind, ExtractErrorKind::PathTraversal(_)));
        assert!(visible_entries(&out).is_empty());
    }

    #[test]
    fn escaping_symlink_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let enc = GzEncoder::new(Vec::new(), Compression::default());
        let mut builder = tar::Builder::new(enc);
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Symlink);
        header.set_size(0);
        header.set_mode(0o777);
        builder
            .append_link(&mut header, "link.csv", "../../outside.csv")
            .unwrap();
        let bytes = builder.into_inner().unwrap().finish().unwrap();
        let archive = write_archive(dir.path(), "link.tar.gz", &bytes);
        let err = extract(&archive, dir.path().join("out")).unwrap_err();
        assert!(matches!(err.kind, ExtractErrorKind::PathTraversal(_)));
    }

    #[test]
    fn truncated_archive_fails_without_members() {
        let dir = tempfile::tempdir().unwrap();
        let body: Vec<u8> = (0..200_000u32).flat_map(|i| i.to_le_bytes()).collect();
        let full = tar_gz(&[("small.csv", b"ok"), ("big.bin", &body)]);
        let archive = write_archive(dir.path(), "cut.tar.gz", &full[..full.len() / 2]);
        let out = dir.path().join("out");
        let err = extract(&archive, &out).unwrap_err();
        assert!(
            matches!(err.kind, ExtractErrorKind::Truncated | ExtractErrorKind::Malformed),
            "unexpected kind {:?}",
            err.kind
        );
        assert!(visible_entries(&out).is_empty());
    }

    #[test]
    fn unsupported_and_missing() {
        let dir = tempfile::tempdir().unwrap();
        let zip = write_archive(dir.path(), "a.tar.gz", b"PK\x03\x04not really");
        let err = extract(&zip, dir.path()).unwrap_err();
        assert_eq!(err.kind, ExtractErrorKind::UnsupportedCompression("zip"));

        let text = write_archive(dir.path(), "iris.csv", b"5.1,3.5,1.4,0.2\n");
        let err = extract(&text, dir.path()).unwrap_err();
        assert_eq!(err.kind, ExtractErrorKind::UnrecognizedFormat);

        let err = extract(dir.path().join("absent.tar.gz"), dir.path()).unwrap_err();
        assert_eq!(err.kind, ExtractErrorKind::NotFound);
    }

    #[test]
    fn re_extraction_overwrites_members() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        fs::create_dir_all(&out).unwrap();
        fs::write(out.join("a.csv"), b"stale").unwrap();
        let archive = write_archive(dir.path(), "a.tar.gz", &tar_gz(&[("a.csv", b"fresh")]));
        extract(&archive, &out).unwrap();
        assert_eq!(fs::read(out.join("a.csv")).unwrap(), b"fresh");
    }

    fn dir_entry(builder: &mut tar::Builder<GzEncoder<Vec<u8>>>, name: &str) {
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Directory);
        header.set_size(0);
        header.set_mode(0o755);
        builder.append_data(&mut header, name, io::empty()).unwrap();
    }

    fn symlink_entry(builder: &mut tar::Builder<GzEncoder<Vec<u8>>>, name: &str, target: &str) {
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Symlink);
        header.set_size(0);
        header.set_mode(0o777);
        builder.append_link(&mut header, name, target).unwrap();
    }

    fn file_entry(builder: &mut tar::Builder<GzEncoder<Vec<u8>>>, name: &str, body: &[u8]) {
        let mut header = tar::Header::new_gnu();
        header.set_size(body.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, body).unwrap();
    }

    #[test]
    fn missing_gzip_trailer_is_truncated() {
        let dir = tempfile::tempdir().unwrap();
        let full = tar_gz(&[("a.csv", b"1,2\n")]);
        let archive = write_archive(dir.path(), "a.tar.gz", &full[..full.len() - 8]);
        let out = dir.path().join("out");
        let err = extract(&archive, &out).unwrap_err();
        assert_eq!(err.kind, ExtractErrorKind::Truncated);
        assert!(visible_entries(&out).is_empty());
    }

    #[test]
    fn corrupt_gzip_trailer_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut bytes = tar_gz(&[("a.csv", b"1,2\n")]);
        let crc_at = bytes.len() - 8;
        bytes[crc_at] ^= 0xff;
        let archive = write_archive(dir.path(), "a.tar.gz", &bytes);
        let out = dir.path().join("out");
        assert!(extract(&archive, &out).is_err());
        assert!(visible_entries(&out).is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn member_below_a_staged_link_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
        dir_entry(&mut builder, "sub/");
        symlink_entry(&mut builder, "d", "sub");
        file_entry(&mut builder, "d/x.csv", b"x");
        let bytes = builder.into_inner().unwrap().finish().unwrap();
        let archive = write_archive(dir.path(), "linked.tar.gz", &bytes);
        let out = dir.path().join("out");

        let err = extract(&archive, &out).unwrap_err();
        assert_eq!(err.kind, ExtractErrorKind::PathTraversal(PathBuf::from("d/x.csv")));
        assert!(visible_entries(&out).is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn every_reported_member_exists() {
        let dir = tempfile::tempdir().unwrap();
        let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
        dir_entry(&mut builder, "sub/");
        file_entry(&mut builder, "sub/x.csv", b"x,y\n");
        symlink_entry(&mut builder, "latest.csv", "sub/x.csv");
        let bytes = builder.into_inner().unwrap().finish().unwrap();
        let archive = write_archive(dir.path(), "linked.tar.gz", &bytes);
        let out = dir.path().join("out");

        let result = extract(&archive, &out).unwrap();
        assert_eq!(
            result.members(),
            &[PathBuf::from("sub/x.csv"), PathBuf::from("latest.csv")]
        );
        assert!(result.paths().all(|p| p.exists()));
        assert_eq!(fs::read(out.join("latest.csv")).unwrap(), b"x,y\n");
    }

    #[test]
    fn duplicate_member_keeps_last_copy() {
        let dir = tempfile::tempdir().unwrap();
        let archive = write_archive(
            dir.path(),
            "dup.tar.gz",
            &tar_gz(&[("a.csv", b"one"), ("b.csv", b"b"), ("a.csv", b"two")]),
        );
        let result = extract(&archive, dir.path().join("out")).unwrap();
        assert_eq!(result.members(), &[PathBuf::from("b.csv"), PathBuf::from("a.csv")]);
        assert!(result.paths().all(|p| p.exists()));
        assert_eq!(fs::read(dir.path().join("out/a.csv")).unwrap(), b"two");
    }

    #[test]
    fn failed_commit_restores_replaced_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        fs::create_dir_all(out.join("b.csv")).unwrap();
        fs::write(out.join("b.csv/keep"), b"keep").unwrap();
        fs::write(out.join("a.csv"), b"stale").unwrap();
        let archive = write_archive(
            dir.path(),
            "ab.tar.gz",
            &tar_gz(&[("a.csv", b"fresh"), ("b.csv", b"b")]),
        );

        // `b.csv` cannot replace a non-empty directory, so the commit fails after `a.csv` moved.
        let err = extract(&archive, &out).unwrap_err();
        assert_eq!(err.kind, ExtractErrorKind::Io);
        assert_eq!(fs::read(out.join("a.csv")).unwrap(), b"stale");
        assert_eq!(fs::read(out.join("b.csv/keep")).unwrap(), b"keep");
        assert_eq!(visible_entries(&out), vec!["a.csv", "b.csv"]);
    }
}
