//! GitHub releases lookup

use crate::error::ResolveError;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::Deserialize;
use tracing::debug;

const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";

/// The parts of a GitHub release we read
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Release {
    /// Release tag (e.g., "v1.4.0")
    #[serde(default)]
    pub tag_name: Option<String>,

    /// Release name
    #[serde(default)]
    pub name: Option<String>,
}

impl Release {
    /// Non-empty tag, else non-empty name, with leading `v`s removed
    pub fn version(&self) -> Option<String> {
        [self.tag_name.as_deref(), self.name.as_deref()]
            .into_iter()
            .flatten()
            .find(|s| !s.is_empty())
            .map(strip_version_prefix)
    }
}

/// Latest-release client for one GitHub API base URL
pub struct ReleaseClient {
    client: reqwest::Client,
    api_url: String,
}

impl ReleaseClient {
    pub fn new(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into(),
        }
    }

    /// Get the latest release of `owner/repo`
    pub async fn get_latest(
        &self,
        owner: &str,
        repo: &str,
        token: Option<&str>,
    ) -> Result<Release, ResolveError> {
        let url = format!(
            "{}/repos/{}/{}/releases/latest",
            self.api_url.trim_end_matches('/'),
            owner,
            repo
        );

        debug!("Fetching latest release from: {}", url);

        let mut request = self.client.get(&url).header(ACCEPT, GITHUB_ACCEPT);
        if let Some(token) = token {
            request = request.header(AUTHORIZATION, format!("token {}", token));
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(ResolveError::HttpStatus {
                url,
                status: response.status().as_u16(),
            });
        }

        Ok(response.json().await?)
    }

    /// Version string of the latest release
    pub async fn latest_version(
        &self,
        owner: &str,
        repo: &str,
        token: Option<&str>,
    ) -> Result<String, ResolveError> {
        self.get_latest(owner, repo, token)
            .await?
            .version()
            .ok_or(ResolveError::ReleaseVersionNotFound)
    }
}

/// `vv1.2` -> `1.2`
pub fn strip_version_prefix(version: &str) -> String {
    version.trim_start_matches('v').to_string()
}
