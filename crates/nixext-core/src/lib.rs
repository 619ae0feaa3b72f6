//! # nixext-core
//!
//! Core library for the nixext CLI providing:
//! - Extension list parsing (TOML)
//! - Browser and source type definitions
//! - Runtime configuration with hierarchical precedence
//! - Subprocess execution for external tools (nix, git, gh)

pub mod config;
pub mod error;
pub mod process;
pub mod types;
pub mod utils;

pub use config::{ExtensionsFile, HierarchicalConfigLoader};
pub use error::{Error, Result};
pub use process::{CommandRunner, ProcessError, SystemCommandRunner};
pub use utils::get_home_dir;
