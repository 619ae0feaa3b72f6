//! Type definitions for extension lists and runtime configuration

mod extension_types;
mod runtime_config;

pub use extension_types::*;
pub use runtime_config::*;
