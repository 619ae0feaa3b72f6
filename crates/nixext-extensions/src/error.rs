//! Error types for nixext-extensions

use nixext_core::types::{Browser, SourceKind};
use nixext_core::ProcessError;
use thiserror::Error;

/// Failure to turn a descriptor into a download URL
#[derive(Error, Debug)]
pub enum ResolveError {
    /// Source cannot serve this browser
    #[error("Source '{kind}' is not supported for {browser} browser")]
    UnsupportedSource { kind: SourceKind, browser: Browser },

    /// `url` source without a `url`
    #[error("Extension '{id}' has source 'url' but no 'url' field specified")]
    MissingUrl { id: String },

    /// GitHub release source without owner/repo after fallback
    #[error("GitHub release source requires '{field}' field")]
    MissingReleaseField { field: &'static str },

    /// Chrome Web Store answered without a redirect
    #[error("Chrome Web Store did not redirect to a package (status {status})")]
    StoreRedirect { status: u16 },

    /// `git ls-remote` produced no commit
    #[error("Failed to get latest commit for BPC")]
    EmptyCommit,

    /// Latest release had neither a tag nor a name
    #[error("Failed to get latest release version from GitHub API")]
    ReleaseVersionNotFound,

    /// Upstream API answered with a non-success status
    #[error("Request to {url} failed with status {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ResolveError {
    pub fn unsupported_source(kind: SourceKind, browser: Browser) -> Self {
        Self::UnsupportedSource { kind, browser }
    }

    pub fn missing_url(id: impl Into<String>) -> Self {
        Self::MissingUrl { id: id.into() }
    }
}

/// Failure to fetch a package
#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

/// Failure to compute a content hash
#[derive(Error, Debug)]
pub enum HashError {
    #[error("Failed to read file for hashing: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Process(#[from] ProcessError),
}

/// Failure to read version and permissions out of a package
#[derive(Error, Debug)]
pub enum InspectError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File too short to carry a format magic
    #[error("Extension package is truncated ({len} bytes)")]
    Truncated { len: usize },

    /// CRX wrapper without an embedded ZIP
    #[error("Could not find ZIP archive within CRX file")]
    ArchiveNotFound,

    #[error("Corrupt extension archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("manifest.json not found in extension archive")]
    ManifestNotFound,

    #[error("Invalid manifest.json: {0}")]
    InvalidManifest(#[from] serde_json::Error),

    #[error("Could not extract version from manifest")]
    VersionNotFound,
}

/// Failure writing or checking the generated Nix file
#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// nixfmt failed
    #[error("Failed to format generated file: {0}")]
    Format(#[source] ProcessError),

    /// nix-instantiate rejected the file
    #[error("Generated nix file is invalid: {0}")]
    Invalid(#[source] ProcessError),
}
