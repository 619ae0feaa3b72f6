//! Token and browser version discovery
//!
//! Both are looked up from the environment or from external tools, so they sit
//! behind traits and can be replaced in tests.

use async_trait::async_trait;
use nixext_core::CommandRunner;
use std::sync::Arc;
use tracing::{debug, warn};

/// Environment variable checked first for a GitHub token
pub const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Prefix of OAuth tokens issued by the GitHub CLI
const GH_TOKEN_PREFIX: &str = "gho_";

const CHROMIUM_VERSION_EXPR: &str =
    "eval --impure --expr 'with import <nixpkgs> {}; lib.getVersion chromium'";

/// Supplies an optional GitHub API token
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn token(&self) -> Option<String>;
}

/// Reads `GITHUB_TOKEN`, then falls back to `gh auth token`
pub struct GitHubTokenProvider {
    runner: Arc<dyn CommandRunner>,
}

impl GitHubTokenProvider {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl TokenProvider for GitHubTokenProvider {
    async fn token(&self) -> Option<String> {
        if let Ok(token) = std::env::var(GITHUB_TOKEN_ENV) {
            if !token.is_empty() {
                debug!("Using GitHub token from {}", GITHUB_TOKEN_ENV);
                return Some(token);
            }
        }

        match self.runner.run("gh", "auth token").await {
            Ok(output) => {
                let token = output.trim();
                if token.starts_with(GH_TOKEN_PREFIX) {
                    debug!("Using GitHub token from gh CLI");
                    Some(token.to_string())
                } else {
                    None
                }
            }
            Err(e) => {
                debug!("gh auth token unavailable: {}", e);
                None
            }
        }
    }
}

/// A fixed token (or none)
#[derive(Debug, Clone, Default)]
pub struct StaticTokenProvider(pub Option<String>);

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn token(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Supplies the browser major version sent to the Chrome Web Store
#[async_trait]
pub trait BrowserVersionProvider: Send + Sync {
    async fn major_version(&self) -> String;
}

/// Asks nixpkgs for the packaged Chromium version
pub struct NixChromiumVersionProvider {
    runner: Arc<dyn CommandRunner>,
    fallback: String,
}

impl NixChromiumVersionProvider {
    pub fn new(runner: Arc<dyn CommandRunner>, fallback: impl Into<String>) -> Self {
        Self {
            runner,
            fallback: fallback.into(),
        }
    }
}

#[async_trait]
impl BrowserVersionProvider for NixChromiumVersionProvider {
    async fn major_version(&self) -> String {
        match self.runner.run("nix", CHROMIUM_VERSION_EXPR).await {
            Ok(output) => match parse_major_version(&output) {
                Some(major) => {
                    debug!("Detected Chromium major version {}", major);
                    major
                }
                None => {
                    warn!(
                        "Could not parse Chromium version from '{}', using fallback {}",
                        output.trim(),
                        self.fallback
                    );
                    self.fallback.clone()
                }
            },
            Err(e) => {
                warn!(
                    "Failed to get Chromium version from nixpkgs: {}. Using fallback {}",
                    e, self.fallback
                );
                self.fallback.clone()
            }
        }
    }
}

/// A fixed version
#[derive(Debug, Clone)]
pub struct StaticVersionProvider(pub String);

#[async_trait]
impl BrowserVersionProvider for StaticVersionProvider {
    async fn major_version(&self) -> String {
        self.0.clone()
    }
}

/// `"143.0.7499.40"\n` -> `143`
pub fn parse_major_version(output: &str) -> Option<String> {
    let version = output.trim().replace('"', "");
    let major = version.split('.').next()?;
    major.parse::<u32>().ok().map(|m| m.to_string())
}
