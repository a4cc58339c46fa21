//! In-memory tar.gz builders for test fixtures.

use flate2::write::GzEncoder;
use flate2::Compression;

pub fn tar_gz(entries: &[(&str, &[u8])]) -> Vec<u8> {
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

/// A tar.gz whose second member is named verbatim `evil_name` (e.g. `../x`).
#[allow(dead_code)]
pub fn tar_gz_with_raw_name(first: (&str, &[u8]), evil_name: &str) -> Vec<u8> {
    let enc = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(enc);
    let mut header = tar::Header::new_gnu();
    header.set_size(first.1.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder.append_data(&mut header, first.0, first.1).unwrap();

    let body = b"escaped";
    let mut header = tar::Header::new_old();
    header.as_old_mut().name[..evil_name.len()].copy_from_slice(evil_name.as_bytes());
    header.set_size(body.len() as u64);
    header.set_mode(0o644);
    header.set_entry_type(tar::EntryType::Regular);
    header.set_cksum();
    builder.append(&header, &body[..]).unwrap();
    builder.into_inner().unwrap().finish().unwrap()
}
