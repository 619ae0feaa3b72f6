//! Bounded-parallel resolve, download, hash, inspect and render
//!
//! Every descriptor yields exactly one [`ExtensionOutcome`]. Failures, panics
//! included, stay inside their own outcome and never abort the batch.

use crate::archive::{self, ManifestInfo};
use crate::download::download_to_temp;
use crate::error::InspectError;
use crate::hash::ContentHasher;
use crate::render::render_entry;
use crate::source::ExtensionSourceResolver;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use nixext_core::types::{Browser, ExtensionDescriptor, ReleaseLookupConfig};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

/// Default number of extensions processed at once
pub const DEFAULT_MAX_CONCURRENT: usize = 5;

/// Progress milestones of a single extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Resolving,
    UrlResolved,
    Downloaded,
    Hashed,
    Inspected,
}

impl Stage {
    /// Share of the 100-unit progress bar this stage completes
    pub fn increment(&self) -> u64 {
        match self {
            Stage::Resolving => 10,
            Stage::UrlResolved => 20,
            Stage::Downloaded => 40,
            Stage::Hashed => 20,
            Stage::Inspected => 10,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Stage::Resolving => "Resolving download URL...",
            Stage::UrlResolved => "Downloading...",
            Stage::Downloaded => "Computing hash...",
            Stage::Hashed => "Reading manifest...",
            Stage::Inspected => "Rendering...",
        }
    }
}

/// Observes pipeline progress; never affects results
pub trait ProgressReporter: Send + Sync {
    fn started(&self, _descriptor: &ExtensionDescriptor) {}

    fn advance(&self, descriptor: &ExtensionDescriptor, stage: Stage);

    fn finished(&self, _outcome: &ExtensionOutcome) {}
}

/// Discards progress
#[derive(Debug, Clone, Default)]
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn advance(&self, _descriptor: &ExtensionDescriptor, _stage: Stage) {}
}

/// Run-wide inputs shared by every descriptor
#[derive(Debug, Clone)]
pub struct RunContext {
    pub browser: Browser,
    pub release_config: ReleaseLookupConfig,

    /// Chromium major version for the store query
    pub browser_version: Option<String>,
}

impl RunContext {
    pub fn new(browser: Browser) -> Self {
        Self {
            browser,
            release_config: ReleaseLookupConfig::default(),
            browser_version: None,
        }
    }

    pub fn with_release_config(mut self, release_config: ReleaseLookupConfig) -> Self {
        self.release_config = release_config;
        self
    }

    pub fn with_browser_version(mut self, version: impl Into<String>) -> Self {
        self.browser_version = Some(version.into());
        self
    }
}

/// Everything learned about a successfully processed extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedExtension {
    pub url: String,
    pub hash: String,
    pub version: String,
    pub permissions: Vec<String>,

    /// Rendered Nix expression
    pub entry: String,
}

/// Result of processing one descriptor
#[derive(Debug, Clone)]
pub struct ExtensionOutcome {
    pub descriptor: ExtensionDescriptor,
    pub result: Result<ProcessedExtension, String>,
}

impl ExtensionOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn error(&self) -> Option<&str> {
        self.result.as_ref().err().map(String::as_str)
    }

    pub fn processed(&self) -> Option<&ProcessedExtension> {
        self.result.as_ref().ok()
    }
}

/// Processes descriptors with at most `max_concurrent` in flight
pub struct ExtensionPipeline {
    resolver: Arc<ExtensionSourceResolver>,
    client: reqwest::Client,
    hasher: Arc<dyn ContentHasher>,
    progress: Arc<dyn ProgressReporter>,
    max_concurrent: usize,
}

impl ExtensionPipeline {
    /// `client` is used for package downloads
    pub fn new(
        resolver: Arc<ExtensionSourceResolver>,
        client: reqwest::Client,
        hasher: Arc<dyn ContentHasher>,
    ) -> Self {
        Self {
            resolver,
            client,
            hasher,
            progress: Arc::new(NoopProgress),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    /// Values below 1 are raised to 1
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    /// Process every descriptor; outcomes arrive in completion order
    pub async fn process(
        &self,
        descriptors: Vec<ExtensionDescriptor>,
        context: &RunContext,
    ) -> Vec<ExtensionOutcome> {
        let semaphore = Semaphore::new(self.max_concurrent);
        let mut futures = FuturesUnordered::new();
        let mut outcomes = Vec::with_capacity(descriptors.len());

        for descriptor in descriptors {
            let semaphore = &semaphore;

            futures.push(async move {
                let _permit = semaphore.acquire().await.ok();
                self.progress.started(&descriptor);

                let result = AssertUnwindSafe(self.process_one(&descriptor, context))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|panic| Err(panic_message(&*panic)));

                if let Err(e) = &result {
                    warn!("{} failed: {}", descriptor.display_name(), e);
                }

                ExtensionOutcome { descriptor, result }
            });
        }

        while let Some(outcome) = futures.next().await {
            self.progress.finished(&outcome);
            outcomes.push(outcome);
        }

        outcomes
    }

    async fn process_one(
        &self,
        descriptor: &ExtensionDescriptor,
        context: &RunContext,
    ) -> Result<ProcessedExtension, String> {
        let browser = context.browser;

        self.progress.advance(descriptor, Stage::Resolving);
        let url = self
            .resolver
            .resolve(
                descriptor,
                browser,
                &context.release_config,
                context.browser_version.as_deref(),
            )
            .await
            .map_err(|e| e.to_string())?
            .filter(|url| !url.is_empty())
            .ok_or_else(|| "Failed to get download URL".to_string())?;

        self.progress.advance(descriptor, Stage::UrlResolved);
        let package = download_to_temp(&self.client, &url, browser)
            .await
            .map_err(|e| format!("Failed to download: {}", e))?;

        self.progress.advance(descriptor, Stage::Downloaded);
        let hash = self
            .hasher
            .hash_file(package.path())
            .await
            .map_err(|e| e.to_string())?;

        self.progress.advance(descriptor, Stage::Hashed);
        let manifest = inspect_blocking(package.path().to_path_buf())
            .await
            .map_err(|e| e.to_string())?;

        self.progress.advance(descriptor, Stage::Inspected);
        let entry = render_entry(
            descriptor,
            &url,
            &hash,
            &manifest.version,
            &manifest.permissions,
            browser,
        );

        debug!("Processed {} v{}", descriptor.id, manifest.version);

        Ok(ProcessedExtension {
            url,
            hash,
            version: manifest.version,
            permissions: manifest.permissions,
            entry,
        })
    }
}

async fn inspect_blocking(path: PathBuf) -> Result<ManifestInfo, InspectError> {
    tokio::task::spawn_blocking(move || archive::inspect(&path))
        .await
        .map_err(|e| InspectError::Io(std::io::Error::other(e)))?
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    let detail = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    format!("Unexpected error: {}", detail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_increments_total_100() {
        let total: u64 = [
            Stage::Resolving,
            Stage::UrlResolved,
            Stage::Downloaded,
            Stage::Hashed,
            Stage::Inspected,
        ]
        .iter()
        .map(Stage::increment)
        .sum();
        assert_eq!(total, 100);
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "Unexpected error: boom");

        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "Unexpected error: bang");

        let payload: Box<dyn Any + Send> = Box::new(42);
        assert_eq!(panic_message(payload.as_ref()), "Unexpected error: unknown panic");
    }

    #[test]
    fn test_outcome_accessors() {
        let descriptor = ExtensionDescriptor::new("x", nixext_core::types::SourceKind::Url);
        let failed = ExtensionOutcome {
            descriptor,
            result: Err("nope".to_string()),
        };
        assert!(!failed.is_success());
        assert_eq!(failed.error(), Some("nope"));
        assert!(failed.processed().is_none());
    }

    #[test]
    fn test_run_context_builder() {
        let ctx = RunContext::new(Browser::Firefox).with_browser_version("1");
        assert_eq!(ctx.browser_version.as_deref(), Some("1"));
    }
}
