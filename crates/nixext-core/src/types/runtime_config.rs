//! Runtime configuration types for operational parameters
//!
//! These types control network behavior, upstream endpoints, and the
//! fallbacks used when version discovery fails.

use serde::{Deserialize, Serialize};

/// Complete runtime configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RuntimeConfig {
    /// Network and HTTP configuration
    #[serde(default)]
    pub network: NetworkConfig,

    /// Upstream endpoints for each extension source
    #[serde(default)]
    pub sources: SourceEndpoints,

    /// Chromium-specific settings
    #[serde(default)]
    pub chromium: ChromiumConfig,
}

/// Network and HTTP configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NetworkConfig {
    /// Maximum number of extensions processed concurrently
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// HTTP timeout in seconds; unset leaves the client default
    #[serde(default)]
    pub http_timeout_secs: Option<u64>,

    /// User agent string for HTTP requests
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            http_timeout_secs: None,
            user_agent: default_user_agent(),
        }
    }
}

fn default_max_concurrent() -> usize {
    5
}
fn default_user_agent() -> String {
    "BrowserExtensionsUpdater".to_string()
}

/// Base URLs for the upstream services each source talks to
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SourceEndpoints {
    /// Chrome Web Store update endpoint (answers with a redirect)
    #[serde(default = "default_chrome_store_url")]
    pub chrome_store_url: String,

    /// addons.mozilla.org API base
    #[serde(default = "default_amo_api_url")]
    pub amo_api_url: String,

    /// GitHub REST API base
    #[serde(default = "default_github_api_url")]
    pub github_api_url: String,

    /// GitHub web base, used for release asset URLs
    #[serde(default = "default_github_url")]
    pub github_url: String,

    /// Git remote of the Bypass Paywalls Clean uploads repository
    #[serde(default = "default_bpc_repo")]
    pub bpc_repo: String,

    /// Raw blob endpoint of the Bypass Paywalls Clean uploads repository
    #[serde(default = "default_bpc_raw_url")]
    pub bpc_raw_url: String,
}

impl Default for SourceEndpoints {
    fn default() -> Self {
        Self {
            chrome_store_url: default_chrome_store_url(),
            amo_api_url: default_amo_api_url(),
            github_api_url: default_github_api_url(),
            github_url: default_github_url(),
            bpc_repo: default_bpc_repo(),
            bpc_raw_url: default_bpc_raw_url(),
        }
    }
}

fn default_chrome_store_url() -> String {
    "https://clients2.google.com/service/update2/crx".to_string()
}
fn default_amo_api_url() -> String {
    "https://addons.mozilla.org/api/v5".to_string()
}
fn default_github_api_url() -> String {
    "https://api.github.com".to_string()
}
fn default_github_url() -> String {
    "https://github.com".to_string()
}
fn default_bpc_repo() -> String {
    "https://gitflic.ru/project/magnolia1234/bpc_uploads.git".to_string()
}
fn default_bpc_raw_url() -> String {
    "https://gitflic.ru/project/magnolia1234/bpc_uploads/blob/raw".to_string()
}

/// Chromium-specific settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ChromiumConfig {
    /// Major version sent to the store when nixpkgs cannot be queried.
    /// Drifts as the store evolves; bump alongside nixpkgs.
    #[serde(default = "default_fallback_version")]
    pub fallback_version: String,
}

impl Default for ChromiumConfig {
    fn default() -> Self {
        Self {
            fallback_version: default_fallback_version(),
        }
    }
}

fn default_fallback_version() -> String {
    "143".to_string()
}
