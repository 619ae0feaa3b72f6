//! Error types for nixext-core

use thiserror::Error;

/// Result type alias using nixext-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for nixext
#[derive(Error, Debug)]
pub enum Error {
    /// Input file not found
    #[error("Input file not found: {path}")]
    ConfigNotFound { path: String },

    /// Invalid configuration format
    #[error("Invalid configuration format: {message}")]
    InvalidConfig { message: String },

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Unknown browser
    #[error("Invalid browser type: {browser}. Must be 'chromium' or 'firefox'.")]
    InvalidBrowser { browser: String },
}

impl Error {
    /// Create a config not found error
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an invalid browser error
    pub fn invalid_browser(browser: impl Into<String>) -> Self {
        Self::InvalidBrowser {
            browser: browser.into(),
        }
    }
}
