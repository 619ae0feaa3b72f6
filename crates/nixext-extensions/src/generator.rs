//! Nix file assembly, formatting and validation

use crate::error::GenerateError;
use crate::pipeline::ExtensionOutcome;
use crate::render::escape;
use async_trait::async_trait;
use nixext_core::types::{Browser, ExtensionDescriptor};
use nixext_core::CommandRunner;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

pub const HEADER: &str = "# This file is auto-generated by an update script\n# DO NOT edit manually\n";

/// Assembles rendered entries into one Nix file
#[derive(Debug, Clone)]
pub struct NixFileGenerator {
    browser: Browser,
    config_param: bool,
}

impl NixFileGenerator {
    pub fn new(browser: Browser) -> Self {
        Self {
            browser,
            config_param: false,
        }
    }

    /// Add `config` to the function arguments (any descriptor had a condition)
    pub fn with_config_param(mut self, enabled: bool) -> Self {
        self.config_param = enabled;
        self
    }

    /// Render the file from successful outcomes; failures are ignored
    pub fn render(&self, outcomes: &[ExtensionOutcome]) -> String {
        let mut unconditional: Vec<(&ExtensionDescriptor, &str)> = Vec::new();
        let mut conditional: Vec<(&ExtensionDescriptor, &str)> = Vec::new();

        for outcome in outcomes {
            let Some(processed) = outcome.processed() else {
                continue;
            };
            let item = (&outcome.descriptor, processed.entry.as_str());
            if outcome.descriptor.is_conditional() {
                conditional.push(item);
            } else {
                unconditional.push(item);
            }
        }

        unconditional.sort_by(|a, b| a.0.id.cmp(&b.0.id));
        conditional.sort_by(|a, b| a.0.id.cmp(&b.0.id));

        let mut out = String::from(HEADER);
        match self.browser {
            Browser::Chromium => self.render_chromium(&mut out, &unconditional, &conditional),
            Browser::Firefox => self.render_firefox(&mut out, &unconditional, &conditional),
        }
        out
    }

    fn render_chromium(
        &self,
        out: &mut String,
        unconditional: &[(&ExtensionDescriptor, &str)],
        conditional: &[(&ExtensionDescriptor, &str)],
    ) {
        out.push_str("{\n  pkgs,\n");
        if self.config_param {
            out.push_str("  config,\n");
        }
        out.push_str("  lib,\n  ...\n}:\nlib.flatten [\n");

        for (_, entry) in unconditional {
            out.push_str(entry);
            out.push('\n');
        }

        for (descriptor, entry) in conditional {
            out.push_str(&format!("  (lib.optionals ({}) [\n", guard(descriptor)));
            out.push_str(entry);
            out.push_str("\n  ])\n");
        }

        out.push_str("]\n");
    }

    fn render_firefox(
        &self,
        out: &mut String,
        unconditional: &[(&ExtensionDescriptor, &str)],
        conditional: &[(&ExtensionDescriptor, &str)],
    ) {
        out.push_str("{\n  buildFirefoxXpiAddon,\n  fetchurl,\n  lib,\n  stdenv,\n");
        if self.config_param {
            out.push_str("  config,\n");
        }
        out.push_str("}:\n{\n");

        for (descriptor, entry) in unconditional {
            out.push_str(&addon_binding(descriptor, entry));
        }
        out.push('}');

        for (descriptor, entry) in conditional {
            out.push_str(&format!(
                "\n// lib.optionalAttrs ({}) {{\n{}}}",
                guard(descriptor),
                addon_binding(descriptor, entry)
            ));
        }

        out.push('\n');
    }

    /// Write `content` to `path`, creating parent directories
    pub async fn write(&self, path: &Path, content: &str) -> Result<(), GenerateError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, content).await?;
        info!("Wrote {}", path.display());
        Ok(())
    }
}

fn guard(descriptor: &ExtensionDescriptor) -> String {
    escape(descriptor.condition().unwrap_or_default())
}

fn addon_binding(descriptor: &ExtensionDescriptor, entry: &str) -> String {
    format!(
        "  \"{}\" = buildFirefoxXpiAddon {};\n",
        escape(&descriptor.id),
        entry
    )
}

/// Formats and parse-checks a generated file
#[async_trait]
pub trait NixTooling: Send + Sync {
    async fn format(&self, path: &Path) -> Result<(), GenerateError>;

    async fn validate(&self, path: &Path) -> Result<(), GenerateError>;
}

/// `nixfmt` via `nix run`, then `nix-instantiate --parse`
pub struct NixCliTooling {
    runner: Arc<dyn CommandRunner>,
}

impl NixCliTooling {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl NixTooling for NixCliTooling {
    async fn format(&self, path: &Path) -> Result<(), GenerateError> {
        debug!("Formatting {}", path.display());
        self.runner
            .run("nix", &format!("run nixpkgs#nixfmt -- '{}'", path.display()))
            .await
            .map_err(GenerateError::Format)?;
        Ok(())
    }

    async fn validate(&self, path: &Path) -> Result<(), GenerateError> {
        debug!("Validating {}", path.display());
        self.runner
            .run("nix-instantiate", &format!("--parse '{}'", path.display()))
            .await
            .map_err(GenerateError::Invalid)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ProcessedExtension;
    use nixext_core::types::SourceKind;

    fn success(id: &str, condition: Option<&str>, entry: &str) -> ExtensionOutcome {
        let mut descriptor = ExtensionDescriptor::new(id, SourceKind::Url);
        descriptor.condition = condition.map(str::to_string);
        ExtensionOutcome {
            descriptor,
            result: Ok(ProcessedExtension {
                url: String::new(),
                hash: String::new(),
                version: "1".to_string(),
                permissions: Vec::new(),
                entry: entry.to_string(),
            }),
        }
    }

    fn failure(id: &str) -> ExtensionOutcome {
        ExtensionOutcome {
            descriptor: ExtensionDescriptor::new(id, SourceKind::Url),
            result: Err("broken".to_string()),
        }
    }

    #[test]
    fn test_header_always_first() {
        for browser in [Browser::Chromium, Browser::Firefox] {
            let text = NixFileGenerator::new(browser).render(&[]);
            assert!(text.starts_with(HEADER));
        }
    }

    #[test]
    fn test_chromium_layout_and_ordering() {
        let outcomes = vec![
            success("zeta", None, "  ZETA"),
            success("beta", Some("cfg.b"), "  BETA"),
            success("alpha", None, "  ALPHA"),
            success("able", Some("cfg.a"), "  ABLE"),
            failure("broken"),
        ];

        let text = NixFileGenerator::new(Browser::Chromium)
            .with_config_param(true)
            .render(&outcomes);

        assert!(text.contains("  pkgs,\n  config,\n  lib,\n  ...\n}:\nlib.flatten [\n"));
        assert!(text.contains("  (lib.optionals (cfg.a) [\n  ABLE\n  ])"));
        assert!(text.trim_end().ends_with(']'));
        assert!(!text.contains("broken"));

        let order: Vec<usize> = ["ALPHA", "ZETA", "ABLE", "BETA"]
            .iter()
            .map(|m| text.find(m).unwrap())
            .collect();
        assert!(order.windows(2).all(|w| w[0] < w[1]), "{text}");
    }

    #[test]
    fn test_config_param_omitted_without_conditions() {
        let text = NixFileGenerator::new(Browser::Chromium).render(&[success("a", None, "A")]);
        assert!(!text.contains("config"));

        let text = NixFileGenerator::new(Browser::Firefox).render(&[success("a", None, "A")]);
        assert!(!text.contains("config"));
    }

    #[test]
    fn test_firefox_layout() {
        let outcomes = vec![
            success("b@x", None, "{ B }"),
            success("a@x", None, "{ A }"),
            success("c@x", Some("config.extras"), "{ C }"),
        ];

        let text = NixFileGenerator::new(Browser::Firefox)
            .with_config_param(true)
            .render(&outcomes);

        assert!(text.contains("  stdenv,\n  config,\n}:\n{\n"));
        assert!(text.contains("  \"a@x\" = buildFirefoxXpiAddon { A };\n  \"b@x\" = buildFirefoxXpiAddon { B };\n}"));
        assert!(text.contains(
            "\n// lib.optionalAttrs (config.extras) {\n  \"c@x\" = buildFirefoxXpiAddon { C };\n}"
        ));
    }

    #[test]
    fn test_condition_is_escaped() {
        let text = NixFileGenerator::new(Browser::Chromium)
            .with_config_param(true)
            .render(&[success("a", Some(r#"x == "$y""#), "A")]);
        assert!(text.contains(r#"(lib.optionals (x == \"\$y\") ["#));
    }

    #[tokio::test]
    async fn test_write_creates_parent_directories() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested/deeper/extensions.nix");

        NixFileGenerator::new(Browser::Firefox)
            .write(&path, "{ }\n")
            .await
            .unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ }\n");
    }
}
