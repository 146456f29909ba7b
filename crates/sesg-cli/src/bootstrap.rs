use anyhow::Context;

use crate::cli::GlobalFlags;

/// Load `.env`, then the layered configuration.
pub fn load_config(flags: &GlobalFlags) -> anyhow::Result<sesg_config::SesgConfig> {
    load_dotenv(flags)?;
    sesg_config::SesgConfig::load(flags.config.as_deref()).map_err(anyhow::Error::from)
}

/// Prefer a `.env` next to an explicit `--config` file, else the usual
/// lookup from the current directory upwards.
fn load_dotenv(flags: &GlobalFlags) -> anyhow::Result<()> {
    if let Some(dir) = flags.config.as_deref().and_then(std::path::Path::parent) {
        let env_path = dir.join(".env");
        if env_path.exists() {
            dotenvy::from_path(&env_path)
                .with_context(|| format!("failed to load dotenv file at {}", env_path.display()))?;
            return Ok(());
        }
    }
    dotenvy::dotenv().ok();
    Ok(())
}
