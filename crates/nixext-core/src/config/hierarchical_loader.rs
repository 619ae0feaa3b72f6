//! Hierarchical runtime configuration loader with precedence
//!
//! Loads configuration from multiple sources with the following precedence (low to high):
//! 1. Embedded defaults (built into binary)
//! 2. User runtime config (~/.nixext/runtime.yaml)
//! 3. Environment variables (NIXEXT_* prefix)
//! 4. CLI flags (handled by caller)

use crate::error::{Error, Result};
use crate::types::RuntimeConfig;
use crate::utils::get_home_dir;
use camino::{Utf8Path, Utf8PathBuf};
use rust_embed::RustEmbed;
use serde::de::DeserializeOwned;
use serde_yaml_ng::Value;
use std::env;
use std::fs;
use tracing::debug;

/// Embedded configuration files
#[derive(RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/../../embedded/config/"]
#[prefix = ""]
struct EmbeddedConfigs;

/// Name of the user runtime config file inside the config directory
const RUNTIME_CONFIG_FILE: &str = "runtime.yaml";

/// Configuration hierarchy loader
pub struct HierarchicalConfigLoader {
    /// Base directory for configuration files
    config_dir: Utf8PathBuf,
}

impl HierarchicalConfigLoader {
    /// Create a loader rooted at ~/.nixext
    pub fn new() -> Result<Self> {
        let config_dir = Self::get_config_dir()?;
        Ok(Self { config_dir })
    }

    /// Create a loader with a custom config directory
    pub fn with_dir(config_dir: Utf8PathBuf) -> Self {
        Self { config_dir }
    }

    fn get_config_dir() -> Result<Utf8PathBuf> {
        let home = get_home_dir().map_err(|e| Error::invalid_config(e.to_string()))?;
        let home = Utf8PathBuf::from_path_buf(home).map_err(|p| {
            Error::invalid_config(format!("Home directory is not valid UTF-8: {}", p.display()))
        })?;

        Ok(home.join(".nixext"))
    }

    /// Load runtime configuration with hierarchical precedence
    pub fn load_runtime_config(&self) -> Result<RuntimeConfig> {
        let mut merged = Self::load_embedded_config::<Value>("runtime-defaults.yaml")?;

        let runtime_config_path = self.config_dir.join(RUNTIME_CONFIG_FILE);
        if runtime_config_path.exists() {
            debug!("Loading runtime config from {}", runtime_config_path);
            let overlay = self.load_yaml_file::<Value>(&runtime_config_path)?;
            Self::merge_runtime_config(&mut merged, overlay);
        }

        let config: RuntimeConfig = serde_yaml_ng::from_value(merged)
            .map_err(|e| Error::invalid_config(format!("Invalid runtime config: {}", e)))?;

        Self::apply_env_overrides(config)
    }

    /// Merge `overlay` into `base` key by key; keys absent from the overlay keep the base value
    fn merge_runtime_config(base: &mut Value, overlay: Value) {
        match (base, overlay) {
            (_, Value::Null) => {}
            (Value::Mapping(base), Value::Mapping(overlay)) => {
                for (key, value) in overlay {
                    match base.get_mut(&key) {
                        Some(existing) => Self::merge_runtime_config(existing, value),
                        None => {
                            base.insert(key, value);
                        }
                    }
                }
            }
            (base, overlay) => *base = overlay,
        }
    }

    fn load_embedded_config<T: DeserializeOwned>(filename: &str) -> Result<T> {
        let embedded_file = EmbeddedConfigs::get(filename).ok_or_else(|| {
            Error::invalid_config(format!("Embedded config not found: {}", filename))
        })?;

        let content = std::str::from_utf8(&embedded_file.data).map_err(|_| {
            Error::invalid_config(format!("Invalid UTF-8 in embedded config: {}", filename))
        })?;

        serde_yaml_ng::from_str(content).map_err(|e| {
            Error::invalid_config(format!(
                "Failed to parse embedded config {}: {}",
                filename, e
            ))
        })
    }

    fn load_yaml_file<T: DeserializeOwned>(&self, path: &Utf8Path) -> Result<T> {
        let content = fs::read_to_string(path)?;
        serde_yaml_ng::from_str(&content)
            .map_err(|e| Error::invalid_config(format!("Failed to parse {}: {}", path, e)))
    }

    fn apply_env_overrides(mut config: RuntimeConfig) -> Result<RuntimeConfig> {
        if let Ok(val) = env::var("NIXEXT_MAX_CONCURRENT") {
            config.network.max_concurrent = val
                .parse()
                .ok()
                .filter(|n: &usize| *n > 0)
                .ok_or_else(|| {
                    Error::invalid_config("NIXEXT_MAX_CONCURRENT must be a positive number")
                })?;
        }

        if let Ok(val) = env::var("NIXEXT_HTTP_TIMEOUT_SECS") {
            config.network.http_timeout_secs = Some(val.parse().map_err(|_| {
                Error::invalid_config("NIXEXT_HTTP_TIMEOUT_SECS must be a valid number")
            })?);
        }

        if let Ok(val) = env::var("NIXEXT_USER_AGENT") {
            config.network.user_agent = val;
        }

        if let Ok(val) = env::var("NIXEXT_CHROMIUM_FALLBACK_VERSION") {
            config.chromium.fallback_version = val;
        }

        Ok(config)
    }
}
