//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::{Args, Parser, ValueEnum};

/// nixext - Resolve, download and pin browser extensions for Nix
#[derive(Parser, Debug)]
#[command(name = "nixext")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(flatten)]
    pub generate: GenerateArgs,
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// TOML file listing the extensions
    #[arg(short, long)]
    pub input: Utf8PathBuf,

    /// Generated Nix file (default: input path with a .nix extension)
    #[arg(short, long)]
    pub output: Option<Utf8PathBuf>,

    /// Target browser: chromium or firefox
    #[arg(short, long)]
    pub browser: String,

    /// Maximum extensions processed at once (overrides runtime config)
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// How package hashes are computed
    #[arg(long, value_enum, default_value_t = HashMode::Nix)]
    pub hash_mode: HashMode,

    /// Skip nixfmt and nix-instantiate on the generated file
    #[arg(long)]
    pub skip_format: bool,
}

impl GenerateArgs {
    /// Explicit output path, else the input path with a `.nix` extension
    pub fn output_path(&self) -> Utf8PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.input.with_extension("nix"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum HashMode {
    /// SHA-256 converted by `nix hash to-sri`
    Nix,
    /// SHA-256 encoded to SRI in process
    Local,
}
