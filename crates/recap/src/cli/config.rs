//! The `recap config` command for configuration management.

use clap::{Args, Subcommand};
use recap_core::Config;
use std::path::PathBuf;

/// Arguments for the `config` command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Subcommands for configuration management.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Display the effective configuration
    Show,

    /// Show config file path
    Path,

    /// Initialize a new config file with defaults
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

/// Execute the config command.
///
/// `path` is the `--config` override; without it the default location is used.
pub async fn execute(
    args: ConfigArgs,
    config: &Config,
    path: Option<PathBuf>,
) -> anyhow::Result<()> {
    let path = path.unwrap_or_else(Config::default_path);

    match args.command {
        ConfigCommand::Show => {
            println!("{}", redacted(config).to_toml()?);
        }

        ConfigCommand::Path => {
            println!("{}", path.display());
        }

        ConfigCommand::Init { force } => {
            write_default(&path, force)?;
            tracing::info!("Config file created at: {}", path.display());
            println!("Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

/// Copy of `config` safe to print: a literal `api_key` is masked, while
/// `${VAR}` references and empty values are shown as written.
fn redacted(config: &Config) -> Config {
    let mut config = config.clone();
    let key = config.service.api_key.trim();
    let is_env_ref = key.starts_with("${") && key.ends_with('}');
    if !key.is_empty() && !is_env_ref {
        config.service.api_key = "<redacted>".to_string();
    }
    config
}

fn write_default(path: &std::path::Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists at: {}\nUse --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let body = if is_json {
        serde_json::to_string_pretty(&Config::default())?
    } else {
        Config::default().to_toml()?
    };
    std::fs::write(path, body)?;
    Ok(())
}
