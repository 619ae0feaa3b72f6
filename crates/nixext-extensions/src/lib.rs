//! Extension resolution, inspection and Nix generation for nixext
//!
//! This crate provides:
//! - Download URL resolution for each extension source
//! - CRX/XPI manifest inspection
//! - Content hashing into SRI form
//! - The bounded-parallel processing pipeline
//! - Nix entry rendering and file assembly

pub mod archive;
pub mod credentials;
pub mod download;
pub mod error;
pub mod generator;
pub mod hash;
pub mod http;
pub mod pipeline;
pub mod releases;
pub mod render;
pub mod source;

pub use archive::{inspect, ManifestInfo};
pub use credentials::{
    BrowserVersionProvider, GitHubTokenProvider, NixChromiumVersionProvider, StaticTokenProvider,
    StaticVersionProvider, TokenProvider,
};
pub use download::download_to_temp;
pub use error::{DownloadError, GenerateError, HashError, InspectError, ResolveError};
pub use generator::{NixCliTooling, NixFileGenerator, NixTooling};
pub use hash::{ContentHasher, LocalSriHasher, NixSriHasher};
pub use http::HttpClients;
pub use pipeline::{
    ExtensionOutcome, ExtensionPipeline, NoopProgress, ProcessedExtension, ProgressReporter,
    RunContext, Stage,
};
pub use render::{escape, render_entry};
pub use source::ExtensionSourceResolver;
