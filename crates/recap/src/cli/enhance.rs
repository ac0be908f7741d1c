//! The `recap enhance` command: check a single caption.

use super::{build_enhancer, expand_path};
use clap::Args;
use recap_core::{Config, ImageSource};
use std::path::PathBuf;

/// Arguments for the `enhance` command.
#[derive(Args, Debug)]
pub struct EnhanceArgs {
    /// Image the caption describes
    pub image: PathBuf,

    /// Caption produced by the local model
    #[arg(short, long)]
    pub caption: String,

    /// Model name (overrides `service.model`)
    #[arg(long)]
    pub model: Option<String>,

    /// Print the full result record as JSON instead of just the caption
    #[arg(long)]
    pub json: bool,
}

/// Execute the enhance command.
pub async fn execute(args: EnhanceArgs, config: &Config) -> anyhow::Result<()> {
    let enhancer = build_enhancer(config, args.model.as_deref())?;
    let image = ImageSource::Path(expand_path(&args.image));

    let result = enhancer.enhance(&image, &args.caption).await?;
    tracing::info!(
        outcome = ?result.outcome,
        corrected = result.used_enhancement,
        "Caption checked"
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", result.caption);
    }
    Ok(())
}
