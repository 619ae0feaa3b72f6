//! Package fixtures
//!
//! Builds real ZIP archives in memory and wraps them in CRX headers, so the
//! inspector is exercised against the same byte layout it sees in the wild.

#![allow(dead_code)]

use serde_json::json;
use std::io::{Cursor, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Build a ZIP archive from `(name, content)` pairs
pub fn zip_bytes(files: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();

    for (name, content) in files {
        writer.start_file(*name, options).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }

    writer.finish().unwrap().into_inner()
}

/// Wrap a ZIP archive in a CRX3-style header
///
/// The header bytes are arbitrary; the inspector only looks for the magic and
/// the first ZIP signature.
pub fn crx_bytes(zip: &[u8]) -> Vec<u8> {
    let header = b"\x08\x12\x0a\x00fake-signature-and-key-material";
    let mut data = Vec::new();
    data.extend_from_slice(b"Cr24");
    data.extend_from_slice(&3u32.to_le_bytes());
    data.extend_from_slice(&(header.len() as u32).to_le_bytes());
    data.extend_from_slice(header);
    data.extend_from_slice(zip);
    data
}

/// manifest.json text with the given version and permissions
pub fn manifest_json(version: &str, permissions: &[&str]) -> String {
    json!({
        "manifest_version": 3,
        "name": "Test Extension",
        "version": version,
        "permissions": permissions,
    })
    .to_string()
}

/// A ZIP package holding only manifest.json
pub fn package_zip(version: &str, permissions: &[&str]) -> Vec<u8> {
    zip_bytes(&[("manifest.json", &manifest_json(version, permissions))])
}

/// A CRX package holding only manifest.json
pub fn package_crx(version: &str, permissions: &[&str]) -> Vec<u8> {
    crx_bytes(&package_zip(version, permissions))
}

/// Write `data` to a temporary file with the given suffix
pub fn temp_package(data: &[u8], suffix: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .prefix("nixext-test-")
        .suffix(suffix)
        .tempfile()
        .unwrap();
    file.write_all(data).unwrap();
    file.flush().unwrap();
    file
}

/// Count files in `dir` whose name starts with `prefix`
pub fn count_with_prefix(dir: &Path, prefix: &str) -> usize {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .filter(|e| e.file_name().to_string_lossy().starts_with(prefix))
                .count()
        })
        .unwrap_or(0)
}
