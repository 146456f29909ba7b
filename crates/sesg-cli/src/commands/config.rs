use std::path::PathBuf;

use anyhow::{Context, bail};
use serde::Serialize;
use sesg_config::{LOCAL_CONFIG_FILE, SesgConfig};

use crate::cli::GlobalFlags;
use crate::cli::subcommands::ConfigCommands;
use crate::output::output;

#[derive(Debug, Serialize)]
struct ConfigInitResponse {
    path: String,
    written: bool,
}

/// Handle `sesg config`. `init` works even when the existing files do not
/// parse.
pub fn handle(action: &ConfigCommands, flags: &GlobalFlags) -> anyhow::Result<()> {
    match action {
        ConfigCommands::Init { global, force } => {
            let path = target_path(*global, flags)?;
            if path.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
            SesgConfig::default().write_toml(&path)?;
            tracing::info!(path = %path.display(), "default configuration written");
            output(
                &ConfigInitResponse {
                    path: path.display().to_string(),
                    written: true,
                },
                flags.format,
            )
        }
        ConfigCommands::Show => {
            let config = crate::bootstrap::load_config(flags)?;
            output(&masked(&config), flags.format)
        }
    }
}

fn target_path(global: bool, flags: &GlobalFlags) -> anyhow::Result<PathBuf> {
    if global {
        return SesgConfig::global_config_path().context("no user configuration directory on this platform");
    }
    Ok(flags
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(LOCAL_CONFIG_FILE)))
}

/// The configuration with every API key reduced to its last four characters.
fn masked(config: &SesgConfig) -> SesgConfig {
    let mut shown = config.clone();
    for key in &mut shown.scopus.api_keys {
        let chars: Vec<char> = key.chars().collect();
        let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
        *key = format!("****{tail}");
    }
    shown
}
