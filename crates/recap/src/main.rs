//! Recap CLI - cross-check generated image captions and correct them.
//!
//! Recap sends an image and the caption a local model produced for it to an
//! external vision service, and prints the caption to use. When the service
//! is unavailable or unsure, the original caption is kept.
//!
//! # Usage
//!
//! ```bash
//! # Check a single caption
//! recap enhance photo.jpg --caption "a man in a red shirt"
//!
//! # Check a JSONL manifest of {"image", "caption"} lines
//! recap batch captions.jsonl --output checked.jsonl
//!
//! # View configuration
//! recap config show
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;
mod logging;

/// Recap - cross-check generated image captions against the image.
#[derive(Parser, Debug)]
#[command(name = "recap")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file to use instead of the default location (TOML or JSON)
    #[arg(short, long, global = true, env = "RECAP_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Check one caption against its image
    Enhance(cli::enhance::EnhanceArgs),

    /// Check every caption in a JSONL manifest
    Batch(cli::batch::BatchArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref().map(cli::expand_path);

    // Logging isn't initialized yet, so config warnings go through eprintln.
    let loaded = match &config_path {
        Some(path) => recap_core::Config::load_from(path),
        None => recap_core::Config::load(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `recap config path`."
            );
            recap_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Recap v{}", recap_core::VERSION);

    match cli.command {
        Commands::Enhance(args) => cli::enhance::execute(args, &config).await,
        Commands::Batch(args) => cli::batch::execute(args, &config).await,
        Commands::Config(args) => cli::config::execute(args, &config, config_path).await,
    }
}
