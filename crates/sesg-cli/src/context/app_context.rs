use anyhow::Context;
use sesg_config::SesgConfig;
use sesg_db::service::SesgService;

/// Shared application resources initialized once at startup.
pub struct AppContext {
    pub service: SesgService,
    pub config: SesgConfig,
}

impl AppContext {
    /// Open the configured database, creating the schema if needed.
    pub async fn init(config: SesgConfig) -> anyhow::Result<Self> {
        if !config.database.is_configured() {
            return Err(sesg_config::ConfigError::NotConfigured {
                section: "database".into(),
            }
            .into());
        }
        let service = SesgService::new_local(&config.database.path)
            .await
            .with_context(|| format!("cannot open database '{}'", config.database.path))?;
        Ok(Self { service, config })
    }
}
