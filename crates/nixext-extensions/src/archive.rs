//! Extension package inspection
//!
//! Firefox packages (XPI) are plain ZIP archives. Chromium packages (CRX) wrap
//! a ZIP archive in a small header:
//!
//! ```text
//! [Cr24][version][header length][header (keys, signatures)][PK\x03\x04 ...]
//! ```
//!
//! The header layout changed between CRX2 and CRX3, so instead of decoding it
//! the inspector scans for the first ZIP local-file signature and treats
//! everything from there on as the archive.

use crate::error::InspectError;
use serde_json::Value;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;
use tracing::debug;
use zip::result::ZipError;
use zip::ZipArchive;

/// CRX magic: "Cr24"
pub const CRX_MAGIC: [u8; 4] = *b"Cr24";

/// ZIP local file header signature: "PK\x03\x04"
pub const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

/// Manifest location inside the archive
const MANIFEST_PATH: &str = "manifest.json";

/// Metadata read from an extension's manifest.json
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestInfo {
    pub version: String,
    pub permissions: Vec<String>,
}

/// Read version and permissions from a CRX or XPI file
pub fn inspect(path: &Path) -> Result<ManifestInfo, InspectError> {
    let data = fs::read(path)?;

    if data.len() < CRX_MAGIC.len() {
        return Err(InspectError::Truncated { len: data.len() });
    }

    if data[..4] != CRX_MAGIC {
        debug!("{} is a bare ZIP archive", path.display());
        return read_manifest(File::open(path)?);
    }

    let offset = find_pattern(&data, &ZIP_MAGIC).ok_or(InspectError::ArchiveNotFound)?;
    debug!(
        "{} is a CRX package, ZIP archive starts at byte {}",
        path.display(),
        offset
    );

    // Removed when dropped
    let mut zip_file = tempfile::Builder::new()
        .prefix("nixext-")
        .suffix(".zip")
        .tempfile()?;
    zip_file.write_all(&data[offset..])?;
    zip_file.flush()?;

    read_manifest(zip_file.reopen()?)
}

/// Index of the first occurrence of `pattern` in `data`
pub fn find_pattern(data: &[u8], pattern: &[u8]) -> Option<usize> {
    if pattern.is_empty() || data.len() < pattern.len() {
        return None;
    }
    data.windows(pattern.len()).position(|window| window == pattern)
}

fn read_manifest(file: File) -> Result<ManifestInfo, InspectError> {
    let mut archive = ZipArchive::new(file)?;

    let mut entry = match archive.by_name(MANIFEST_PATH) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => return Err(InspectError::ManifestNotFound),
        Err(e) => return Err(e.into()),
    };

    let mut content = String::new();
    entry.read_to_string(&mut content)?;

    parse_manifest(&content)
}

/// Extract version and permissions from manifest.json text
pub fn parse_manifest(content: &str) -> Result<ManifestInfo, InspectError> {
    // Some packers prepend a UTF-8 BOM
    let manifest: Value = serde_json::from_str(content.trim_start_matches('\u{feff}'))?;

    let version = non_empty_str(&manifest, "version")
        .or_else(|| non_empty_str(&manifest, "version_name"))
        .ok_or(InspectError::VersionNotFound)?
        .to_string();

    let mut permissions = string_array(&manifest, "permissions");

    // optional_permissions only stands in for host access when
    // host_permissions is absent, not when it is present but empty
    match manifest.get("host_permissions") {
        Some(Value::Array(hosts)) => permissions.extend(strings(hosts)),
        _ => {
            if let Some(Value::Array(optional)) = manifest.get("optional_permissions") {
                permissions.extend(strings(optional).filter(|p| is_url_pattern(p)));
            }
        }
    }

    Ok(ManifestInfo {
        version,
        permissions,
    })
}

fn non_empty_str<'a>(manifest: &'a Value, key: &str) -> Option<&'a str> {
    manifest
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

fn string_array(manifest: &Value, key: &str) -> Vec<String> {
    match manifest.get(key) {
        Some(Value::Array(items)) => strings(items).collect(),
        _ => Vec::new(),
    }
}

fn strings(items: &[Value]) -> impl Iterator<Item = String> + '_ {
    items.iter().filter_map(Value::as_str).map(str::to_string)
}

fn is_url_pattern(permission: &str) -> bool {
    permission.contains('/') || permission.contains('*')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_pattern() {
        assert_eq!(find_pattern(b"xxPK\x03\x04yy", &ZIP_MAGIC), Some(2));
        assert_eq!(find_pattern(b"PK\x03\x04", &ZIP_MAGIC), Some(0));
        assert_eq!(find_pattern(b"PK\x03", &ZIP_MAGIC), None);
        assert_eq!(find_pattern(b"", &ZIP_MAGIC), None);
    }

    #[test]
    fn test_find_pattern_returns_first_occurrence() {
        let data = b"Cr24..PK\x03\x04..PK\x03\x04";
        assert_eq!(find_pattern(data, &ZIP_MAGIC), Some(6));
    }

    #[test]
    fn test_version_name_fallback() {
        let info = parse_manifest(r#"{"version": "", "version_name": "2.0 beta"}"#).unwrap();
        assert_eq!(info.version, "2.0 beta");

        let info = parse_manifest(r#"{"version_name": "3.1"}"#).unwrap();
        assert_eq!(info.version, "3.1");
    }

    #[test]
    fn test_missing_version_is_error() {
        let result = parse_manifest(r#"{"name": "x", "version": 5}"#);
        assert!(matches!(result, Err(InspectError::VersionNotFound)));
    }

    #[test]
    fn test_invalid_json_is_error() {
        let result = parse_manifest("{ not json");
        assert!(matches!(result, Err(InspectError::InvalidManifest(_))));
    }

    #[test]
    fn test_host_permissions_appended_after_permissions() {
        let info = parse_manifest(
            r#"{
                "version": "1.0",
                "permissions": ["storage"],
                "host_permissions": ["https://example.com/*"],
                "optional_permissions": ["*://*/*"]
            }"#,
        )
        .unwrap();

        assert_eq!(info.permissions, vec!["storage", "https://example.com/*"]);
    }

    #[test]
    fn test_optional_permissions_fallback_filters_url_patterns() {
        let info = parse_manifest(
            r#"{"version": "1.0", "optional_permissions": ["*://*/*", "notifications"]}"#,
        )
        .unwrap();

        assert_eq!(info.permissions, vec!["*://*/*"]);
    }

    #[test]
    fn test_empty_host_permissions_suppresses_fallback() {
        let info = parse_manifest(
            r#"{"version": "1.0", "host_permissions": [], "optional_permissions": ["*://*/*"]}"#,
        )
        .unwrap();

        assert!(info.permissions.is_empty());
    }

    #[test]
    fn test_non_string_permissions_skipped_and_duplicates_kept() {
        let info = parse_manifest(
            r#"{"version": "1.0", "permissions": ["tabs", {"fileSystem": ["write"]}, 3, "tabs"]}"#,
        )
        .unwrap();

        assert_eq!(info.permissions, vec!["tabs", "tabs"]);
    }

    #[test]
    fn test_manifest_with_bom() {
        let info = parse_manifest("\u{feff}{\"version\": \"4.2\"}").unwrap();
        assert_eq!(info.version, "4.2");
    }
}
