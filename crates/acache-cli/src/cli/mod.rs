//! CLI for the acache asset cache.

mod commands;

use anyhow::Result;
use acache_core::config;
use acache_core::AssetCache;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use commands::{run_checksum, run_fetch, run_list, run_path, run_resolve};

/// Top-level CLI for the acache asset cache.
#[derive(Debug, Parser)]
#[command(name = "acache")]
#[command(about = "acache: resolve, download and verify static assets", long_about = None)]
pub struct Cli {
    /// Asset manifest to use instead of the one named in config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub manifest: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Show what an asset id or URI resolves to, without downloading.
    Resolve {
        /// Manifest id, or an absolute URI (http:, https:, file:, data:).
        asset: String,
    },

    /// Ensure assets are available locally, downloading and verifying as needed.
    Fetch {
        /// Manifest ids and/or URIs.
        #[arg(required = true, num_args = 1..)]
        assets: Vec<String>,
    },

    /// Print the best currently-known source for an asset (local if cached).
    Path {
        asset: String,
    },

    /// List assets in the manifest.
    List,

    /// Compute the content hash of a file.
    Checksum {
        /// Path to the file.
        path: String,

        /// md5 or sha256 (default: the configured hash algorithm).
        #[arg(long, value_name = "ALG")]
        algorithm: Option<String>,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let mut cfg = config::load_or_init()?;
        if let Some(manifest) = cli.manifest {
            cfg.manifest = Some(manifest);
        }
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Resolve { asset } => {
                let cache = AssetCache::from_config(&cfg)?;
                run_resolve(&cache, &asset)?;
            }
            CliCommand::Fetch { assets } => {
                let cache = AssetCache::from_config(&cfg)?;
                run_fetch(&cache, &assets).await?;
            }
            CliCommand::Path { asset } => {
                let cache = AssetCache::from_config(&cfg)?;
                run_path(&cache, &asset)?;
            }
            CliCommand::List => run_list(&cfg)?,
            CliCommand::Checksum { path, algorithm } => {
                let algorithm = match algorithm {
                    Some(a) => a.parse()?,
                    None => cfg.hash_algorithm,
                };
                run_checksum(Path::new(&path), algorithm).await?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
