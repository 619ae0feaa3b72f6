//! Shared HTTP clients

use nixext_core::types::NetworkConfig;
use reqwest::redirect::Policy;
use std::time::Duration;

/// The two clients shared by every worker
///
/// `reqwest::Client` is reference counted internally, so cloning this is cheap
/// and all clones share one connection pool.
#[derive(Debug, Clone)]
pub struct HttpClients {
    /// Follows redirects; used for APIs and downloads
    pub general: reqwest::Client,

    /// Never follows redirects; used to read the store's `Location` header
    pub no_redirect: reqwest::Client,
}

impl HttpClients {
    /// Build both clients from network settings
    pub fn new(network: &NetworkConfig) -> reqwest::Result<Self> {
        let general = Self::builder(network).build()?;
        let no_redirect = Self::builder(network).redirect(Policy::none()).build()?;

        Ok(Self {
            general,
            no_redirect,
        })
    }

    fn builder(network: &NetworkConfig) -> reqwest::ClientBuilder {
        let builder = reqwest::Client::builder().user_agent(&network.user_agent);

        match network.http_timeout_secs {
            Some(secs) => builder.timeout(Duration::from_secs(secs)),
            None => builder,
        }
    }
}
