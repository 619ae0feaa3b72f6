//! Extension descriptor, source, and browser types

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Target browser family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    Chromium,
    Firefox,
}

impl Browser {
    /// Package file extension used by this browser family
    pub fn file_extension(&self) -> &'static str {
        match self {
            Browser::Chromium => "crx",
            Browser::Firefox => "xpi",
        }
    }

    /// Whether extensions from `source` can be installed in this browser
    pub fn supports(&self, source: SourceKind) -> bool {
        match source {
            SourceKind::ChromeStore => *self == Browser::Chromium,
            SourceKind::Amo => *self == Browser::Firefox,
            SourceKind::Bpc | SourceKind::Url | SourceKind::GithubReleases => true,
        }
    }
}

impl fmt::Display for Browser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Browser::Chromium => write!(f, "chromium"),
            Browser::Firefox => write!(f, "firefox"),
        }
    }
}

impl FromStr for Browser {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chromium" => Ok(Browser::Chromium),
            "firefox" => Ok(Browser::Firefox),
            _ => Err(Error::invalid_browser(s)),
        }
    }
}

/// Where a download URL for an extension comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    /// Chrome Web Store update service
    ChromeStore,

    /// addons.mozilla.org API
    Amo,

    /// Bypass Paywalls Clean uploads mirror
    Bpc,

    /// Literal URL from the descriptor
    Url,

    /// GitHub release asset
    GithubReleases,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::ChromeStore => write!(f, "chrome-store"),
            SourceKind::Amo => write!(f, "amo"),
            SourceKind::Bpc => write!(f, "bpc"),
            SourceKind::Url => write!(f, "url"),
            SourceKind::GithubReleases => write!(f, "github-releases"),
        }
    }
}

impl FromStr for SourceKind {
    type Err = Error;

    /// Case-insensitive, hyphens ignored (`chrome-store`, `ChromeStore`, `chromestore`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-')
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "chromestore" => Ok(SourceKind::ChromeStore),
            "amo" => Ok(SourceKind::Amo),
            "bpc" => Ok(SourceKind::Bpc),
            "url" => Ok(SourceKind::Url),
            "githubreleases" => Ok(SourceKind::GithubReleases),
            _ => Err(Error::invalid_config(format!("Unknown source '{}'", s))),
        }
    }
}

/// A declared extension to resolve and pin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionDescriptor {
    /// Store id, AMO slug, or asset name; unique within a run
    pub id: String,

    /// Display name
    pub name: Option<String>,

    pub source: SourceKind,

    /// Download URL (required for `url` source)
    pub url: Option<String>,

    /// Nix boolean expression gating inclusion; emitted verbatim
    pub condition: Option<String>,

    /// GitHub owner (github-releases only)
    pub owner: Option<String>,

    /// GitHub repository (github-releases only)
    pub repo: Option<String>,

    /// Asset path pattern with `{version}`, `{name}`, `{id}` placeholders
    pub pattern: Option<String>,

    /// Release version, or "latest"
    pub version: Option<String>,
}

impl ExtensionDescriptor {
    /// Create a descriptor with only an id and source
    pub fn new(id: impl Into<String>, source: SourceKind) -> Self {
        Self {
            id: id.into(),
            name: None,
            source,
            url: None,
            condition: None,
            owner: None,
            repo: None,
            pattern: None,
            version: None,
        }
    }

    /// Name for display, falling back to the id
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.id)
    }

    /// The inclusion condition, if present and non-empty
    pub fn condition(&self) -> Option<&str> {
        self.condition.as_deref().filter(|c| !c.is_empty())
    }

    pub fn is_conditional(&self) -> bool {
        self.condition().is_some()
    }
}

/// Run-level defaults for the github-releases source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseLookupConfig {
    pub owner: Option<String>,
    pub repo: Option<String>,
    pub pattern: Option<String>,
}
