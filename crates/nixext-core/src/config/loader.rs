//! Extension list loading (TOML)
//!
//! ```toml
//! [config.sources.github-releases]
//! owner = "someone"
//! repo = "extensions"
//!
//! [[extensions]]
//! id = "cjpalhdlnbpafiamejdnhcphjbkeiagm"
//! name = "uBlock Origin"
//!
//! [[extensions]]
//! id = "my-ext"
//! source = "github-releases"
//! condition = "cfg.enableExtras"
//! ```

use crate::error::{Error, Result};
use crate::types::{ExtensionDescriptor, ReleaseLookupConfig, SourceKind};
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use tracing::warn;

#[derive(Debug, Default, Deserialize)]
struct RawFile {
    #[serde(default)]
    config: RawConfig,

    #[serde(default)]
    extensions: Vec<toml::Value>,
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    sources: RawSources,
}

#[derive(Debug, Default, Deserialize)]
struct RawSources {
    #[serde(default, rename = "github-releases")]
    github_releases: ReleaseLookupConfig,
}

#[derive(Debug, Deserialize)]
struct RawExtension {
    id: Option<String>,
    name: Option<String>,
    source: Option<String>,
    url: Option<String>,
    condition: Option<String>,
    owner: Option<String>,
    repo: Option<String>,
    pattern: Option<String>,
    version: Option<String>,
}

/// Parsed extension list
#[derive(Debug, Clone)]
pub struct ExtensionsFile {
    /// Path the list was read from
    pub path: Utf8PathBuf,

    /// Declared extensions, in file order, malformed and repeated entries removed
    pub extensions: Vec<ExtensionDescriptor>,

    /// Run-level defaults for the github-releases source
    pub release_config: ReleaseLookupConfig,
}

impl ExtensionsFile {
    /// Load and parse an extension list from disk
    pub fn load(path: &Utf8Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::config_not_found(path.as_str())
            } else {
                Error::Io(e)
            }
        })?;

        let mut file = Self::parse(&content)?;
        file.path = path.to_owned();
        Ok(file)
    }

    /// Parse an extension list from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let raw: RawFile = toml::from_str(content)?;
        let mut seen = HashSet::new();

        let extensions = raw
            .extensions
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| parse_extension(index, value, &mut seen))
            .collect();

        Ok(Self {
            path: Utf8PathBuf::new(),
            extensions,
            release_config: raw.config.sources.github_releases,
        })
    }

    /// Whether any extension carries an inclusion condition
    pub fn has_conditions(&self) -> bool {
        self.extensions.iter().any(|e| e.is_conditional())
    }
}

/// The first entry for an id wins; later ones are dropped
fn parse_extension(
    index: usize,
    value: toml::Value,
    seen: &mut HashSet<String>,
) -> Option<ExtensionDescriptor> {
    let raw: RawExtension = match value.try_into() {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Extension entry #{} is malformed, skipping: {}", index + 1, e);
            return None;
        }
    };

    let id = match raw.id.filter(|id| !id.is_empty()) {
        Some(id) => id,
        None => {
            warn!("Extension missing 'id' field, skipping");
            return None;
        }
    };

    if !seen.insert(id.clone()) {
        warn!("Duplicate extension '{}' (entry #{}), skipping", id, index + 1);
        return None;
    }

    let source = match raw.source.as_deref() {
        None => SourceKind::ChromeStore,
        Some(s) => s.parse().unwrap_or_else(|_| {
            warn!(
                "Unknown source '{}' for extension '{}', defaulting to chrome-store",
                s, id
            );
            SourceKind::ChromeStore
        }),
    };

    Some(ExtensionDescriptor {
        id,
        name: raw.name,
        source,
        url: raw.url,
        condition: raw.condition,
        owner: raw.owner,
        repo: raw.repo,
        pattern: raw.pattern,
        version: raw.version,
    })
}
