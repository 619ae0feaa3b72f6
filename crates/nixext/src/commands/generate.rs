//! Resolve every extension in the input file and write the Nix file

use anyhow::{Context, Result};
use nixext_core::types::{Browser, RuntimeConfig};
use nixext_core::{CommandRunner, ExtensionsFile, HierarchicalConfigLoader, SystemCommandRunner};
use nixext_extensions::{
    BrowserVersionProvider, ContentHasher, ExtensionOutcome, ExtensionPipeline,
    ExtensionSourceResolver, GitHubTokenProvider, HttpClients, LocalSriHasher,
    NixChromiumVersionProvider, NixCliTooling, NixFileGenerator, NixSriHasher, NixTooling,
    RunContext,
};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::cli::{GenerateArgs, HashMode};
use crate::output::{self, TerminalProgress};

pub async fn run(args: GenerateArgs, quiet: bool) -> Result<ExitCode> {
    let file = ExtensionsFile::load(&args.input)?;
    let browser: Browser = args.browser.parse()?;

    if file.extensions.is_empty() {
        output::warning("No extensions found in config file");
        return Ok(ExitCode::SUCCESS);
    }

    let output_path = args.output_path();
    let runtime_config = load_runtime_config(&args)?;
    let runner: Arc<dyn CommandRunner> = Arc::new(SystemCommandRunner::new());

    if !quiet {
        output::header(&format!("Updating {} extensions", browser));
        output::kv("Input", args.input.as_str());
        output::kv("Output", output_path.as_str());
        output::kv("Extensions", &file.extensions.len().to_string());
    }

    let mut context = RunContext::new(browser).with_release_config(file.release_config.clone());
    if browser == Browser::Chromium {
        let provider: Arc<dyn BrowserVersionProvider> = Arc::new(NixChromiumVersionProvider::new(
            runner.clone(),
            runtime_config.chromium.fallback_version.clone(),
        ));
        let version = chromium_version(provider.as_ref(), quiet).await;
        context = context.with_browser_version(version);
    }

    let progress = Arc::new(TerminalProgress::new(file.extensions.len(), quiet));
    let pipeline = build_pipeline(&args, &runtime_config, runner.clone())?.with_progress(progress);
    let outcomes = pipeline.process(file.extensions.clone(), &context).await;

    let failures: Vec<&ExtensionOutcome> = outcomes.iter().filter(|o| !o.is_success()).collect();
    if !failures.is_empty() {
        report_failures(&failures);
        return Ok(ExitCode::FAILURE);
    }

    let generator = NixFileGenerator::new(browser).with_config_param(file.has_conditions());
    let content = generator.render(&outcomes);
    generator
        .write(output_path.as_std_path(), &content)
        .await
        .with_context(|| format!("Failed to write {}", output_path))?;

    if args.skip_format {
        debug!("Skipping format and validation");
    } else {
        let tooling = NixCliTooling::new(runner);
        tooling.format(output_path.as_std_path()).await?;
        tooling.validate(output_path.as_std_path()).await?;
    }

    output::success(&format!(
        "Generated {} with {} extensions",
        output_path,
        outcomes.len()
    ));

    Ok(ExitCode::SUCCESS)
}

/// Runtime config with CLI overrides applied last
fn load_runtime_config(args: &GenerateArgs) -> Result<RuntimeConfig> {
    let mut config = HierarchicalConfigLoader::new()
        .context("Failed to create config loader")?
        .load_runtime_config()
        .context("Failed to load runtime config")?;

    if let Some(concurrency) = args.concurrency {
        if concurrency == 0 {
            anyhow::bail!("--concurrency must be at least 1");
        }
        config.network.max_concurrent = concurrency;
    }

    Ok(config)
}

async fn chromium_version(provider: &dyn BrowserVersionProvider, quiet: bool) -> String {
    let spinner = (!quiet).then(|| output::spinner("Getting Chromium version from nixpkgs..."));

    let version = provider.major_version().await;

    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
        output::info(&format!("Using Chromium version: {}", version));
    }

    version
}

fn build_pipeline(
    args: &GenerateArgs,
    config: &RuntimeConfig,
    runner: Arc<dyn CommandRunner>,
) -> Result<ExtensionPipeline> {
    let clients = HttpClients::new(&config.network).context("Failed to create HTTP client")?;

    let resolver = ExtensionSourceResolver::new(
        clients.clone(),
        config.sources.clone(),
        runner.clone(),
        Arc::new(GitHubTokenProvider::new(runner.clone())),
    )
    .with_fallback_version(config.chromium.fallback_version.clone());

    let hasher: Arc<dyn ContentHasher> = match args.hash_mode {
        HashMode::Nix => Arc::new(NixSriHasher::new(runner)),
        HashMode::Local => Arc::new(LocalSriHasher),
    };

    Ok(ExtensionPipeline::new(Arc::new(resolver), clients.general, hasher)
        .with_max_concurrent(config.network.max_concurrent))
}

fn report_failures(failures: &[&ExtensionOutcome]) {
    warn!("{} extension(s) failed", failures.len());
    output::error(&format!("Failed to process {} extension(s):", failures.len()));
    for outcome in failures {
        output::failure(
            outcome.descriptor.display_name(),
            outcome.error().unwrap_or_default(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nixext_extensions::StaticVersionProvider;

    #[tokio::test]
    async fn test_chromium_version_comes_from_provider() {
        let provider = StaticVersionProvider("150".to_string());
        assert_eq!(chromium_version(&provider, true).await, "150");
    }
}
