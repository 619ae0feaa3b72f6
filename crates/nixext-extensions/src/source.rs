//! Download URL resolution per source kind

use crate::credentials::TokenProvider;
use crate::error::ResolveError;
use crate::http::HttpClients;
use crate::releases::{strip_version_prefix, ReleaseClient};
use nixext_core::types::{
    Browser, ChromiumConfig, ExtensionDescriptor, ReleaseLookupConfig, SourceEndpoints, SourceKind,
};
use nixext_core::CommandRunner;
use reqwest::header::LOCATION;
use reqwest::StatusCode;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, warn};
use url::Url;

const BPC_CHROMIUM_FILE: &str = "bypass-paywalls-chrome-clean-latest.crx";
const BPC_FIREFOX_FILE: &str = "bypass_paywalls_clean-latest.xpi";

/// Turns extension descriptors into download URLs
pub struct ExtensionSourceResolver {
    clients: HttpClients,
    endpoints: SourceEndpoints,
    runner: Arc<dyn CommandRunner>,
    tokens: Arc<dyn TokenProvider>,
    fallback_version: String,

    /// Looked up at most once per run
    token: OnceCell<Option<String>>,
}

impl ExtensionSourceResolver {
    pub fn new(
        clients: HttpClients,
        endpoints: SourceEndpoints,
        runner: Arc<dyn CommandRunner>,
        tokens: Arc<dyn TokenProvider>,
    ) -> Self {
        Self {
            clients,
            endpoints,
            runner,
            tokens,
            fallback_version: ChromiumConfig::default().fallback_version,
            token: OnceCell::new(),
        }
    }

    /// Chromium major version used when the caller passes no hint
    pub fn with_fallback_version(mut self, version: impl Into<String>) -> Self {
        self.fallback_version = version.into();
        self
    }

    /// Resolve `descriptor` to a download URL for `browser`
    ///
    /// `Ok(None)` means the source had nothing to offer; the AMO lookup
    /// reports its failures that way.
    pub async fn resolve(
        &self,
        descriptor: &ExtensionDescriptor,
        browser: Browser,
        release_config: &ReleaseLookupConfig,
        browser_version: Option<&str>,
    ) -> Result<Option<String>, ResolveError> {
        if !browser.supports(descriptor.source) {
            return Err(ResolveError::unsupported_source(descriptor.source, browser));
        }

        debug!(
            "Resolving {} from {} for {}",
            descriptor.id, descriptor.source, browser
        );

        match descriptor.source {
            SourceKind::ChromeStore => {
                let version = browser_version.unwrap_or(&self.fallback_version);
                self.chrome_store_url(&descriptor.id, version).await.map(Some)
            }
            SourceKind::Amo => Ok(self.amo_url(&descriptor.id).await),
            SourceKind::Bpc => self.bpc_url(browser).await.map(Some),
            SourceKind::Url => match non_empty(&descriptor.url) {
                Some(url) => Ok(Some(url.to_string())),
                None => Err(ResolveError::missing_url(&descriptor.id)),
            },
            SourceKind::GithubReleases => self
                .github_release_url(descriptor, browser, release_config)
                .await
                .map(Some),
        }
    }

    async fn chrome_store_url(&self, id: &str, version: &str) -> Result<String, ResolveError> {
        let url = chrome_store_query(&self.endpoints.chrome_store_url, id, version)?;
        debug!("Querying Chrome Web Store: {}", url);

        let response = self.clients.no_redirect.get(url).send().await?;
        let status = response.status();

        if status == StatusCode::MOVED_PERMANENTLY || status == StatusCode::FOUND {
            if let Some(location) = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .filter(|v| !v.is_empty())
            {
                return Ok(location.to_string());
            }
        }

        Err(ResolveError::StoreRedirect {
            status: status.as_u16(),
        })
    }

    async fn amo_url(&self, slug: &str) -> Option<String> {
        let url = format!(
            "{}/addons/addon/{}/",
            self.endpoints.amo_api_url.trim_end_matches('/'),
            slug
        );

        match self.fetch_amo_file_url(&url).await {
            Ok(Some(file_url)) => Some(file_url),
            Ok(None) => {
                warn!("No download URL in AMO response for {}", slug);
                None
            }
            Err(e) => {
                warn!("Failed to get AMO download URL for {}: {}", slug, e);
                None
            }
        }
    }

    async fn fetch_amo_file_url(&self, url: &str) -> Result<Option<String>, ResolveError> {
        let response = self.clients.general.get(url).send().await?;

        if !response.status().is_success() {
            return Err(ResolveError::HttpStatus {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let body: Value = response.json().await?;
        Ok(body
            .pointer("/current_version/file/url")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string))
    }

    async fn bpc_url(&self, browser: Browser) -> Result<String, ResolveError> {
        let output = self
            .runner
            .run("git", &format!("ls-remote {} HEAD", self.endpoints.bpc_repo))
            .await?;

        let commit = output.split('\t').next().unwrap_or_default().trim();
        if commit.is_empty() {
            return Err(ResolveError::EmptyCommit);
        }

        let file = match browser {
            Browser::Chromium => BPC_CHROMIUM_FILE,
            Browser::Firefox => BPC_FIREFOX_FILE,
        };

        Ok(format!(
            "{}?file={}&inline=false&commit={}",
            self.endpoints.bpc_raw_url, file, commit
        ))
    }

    async fn github_release_url(
        &self,
        descriptor: &ExtensionDescriptor,
        browser: Browser,
        release_config: &ReleaseLookupConfig,
    ) -> Result<String, ResolveError> {
        let owner = non_empty(&descriptor.owner)
            .or_else(|| non_empty(&release_config.owner))
            .ok_or(ResolveError::MissingReleaseField { field: "owner" })?;
        let repo = non_empty(&descriptor.repo)
            .or_else(|| non_empty(&release_config.repo))
            .ok_or(ResolveError::MissingReleaseField { field: "repo" })?;

        let version = match non_empty(&descriptor.version) {
            Some(v) if v != "latest" => strip_version_prefix(v),
            _ => {
                let token = self.token().await;
                ReleaseClient::new(
                    self.clients.general.clone(),
                    self.endpoints.github_api_url.as_str(),
                )
                .latest_version(owner, repo, token)
                .await?
            }
        };

        let base = self.endpoints.github_url.trim_end_matches('/');
        let pattern = non_empty(&descriptor.pattern).or_else(|| non_empty(&release_config.pattern));

        Ok(match pattern {
            Some(pattern) => format!(
                "{}/{}/{}/{}",
                base,
                owner,
                repo,
                expand_pattern(pattern, &version, &descriptor.id)
            ),
            None => format!(
                "{}/{}/{}/releases/download/v{}/{}.{}",
                base,
                owner,
                repo,
                version,
                descriptor.id,
                browser.file_extension()
            ),
        })
    }

    async fn token(&self) -> Option<&str> {
        self.token
            .get_or_init(|| async { self.tokens.token().await })
            .await
            .as_deref()
    }
}

/// Build the store update URL that redirects to the CRX
pub fn chrome_store_query(base: &str, id: &str, version: &str) -> Result<Url, ResolveError> {
    let mut url = Url::parse(base)?;
    url.query_pairs_mut()
        .append_pair("response", "redirect")
        .append_pair("acceptformat", "crx2,crx3")
        .append_pair("prodversion", version)
        .append_pair("x", &format!("id={}&installsource=ondemand&uc", id));
    Ok(url)
}

/// Substitute `{version}`, `{name}` and `{id}`; the latter two both take the id
pub fn expand_pattern(pattern: &str, version: &str, id: &str) -> String {
    pattern
        .replace("{version}", version)
        .replace("{name}", id)
        .replace("{id}", id)
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chrome_store_query_encodes_x() {
        let url = chrome_store_query(
            "https://clients2.google.com/service/update2/crx",
            "abcdefghijklmnop",
            "143",
        )
        .unwrap();

        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        assert_eq!(pairs[0], ("response".into(), "redirect".into()));
        assert_eq!(pairs[1], ("acceptformat".into(), "crx2,crx3".into()));
        assert_eq!(pairs[2], ("prodversion".into(), "143".into()));
        assert_eq!(
            pairs[3],
            (
                "x".into(),
                "id=abcdefghijklmnop&installsource=ondemand&uc".into()
            )
        );
        assert!(url
            .as_str()
            .contains("x=id%3Dabcdefghijklmnop%26installsource%3Dondemand%26uc"));
    }

    #[test]
    fn test_expand_pattern() {
        assert_eq!(
            expand_pattern("releases/download/v{version}/{name}-{version}.xpi", "1.2", "ext"),
            "releases/download/v1.2/ext-1.2.xpi"
        );
        assert_eq!(expand_pattern("{id}/{id}", "1", "x"), "x/x");
        assert_eq!(expand_pattern("static.crx", "1", "x"), "static.crx");
    }

    #[test]
    fn test_invalid_store_base_is_error() {
        assert!(matches!(
            chrome_store_query("not a url", "id", "1"),
            Err(ResolveError::InvalidUrl(_))
        ));
    }
}
