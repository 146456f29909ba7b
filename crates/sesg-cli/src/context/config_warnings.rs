use sesg_config::SesgConfig;

/// Warn about `SESG_*` variables that look like section overrides but were
/// not picked up, usually because of a single underscore.
pub fn warn_unconfigured(config: &SesgConfig) {
    for warning in collect_unconfigured_warnings(config, std::env::vars()) {
        tracing::warn!("{warning}");
    }
}

fn collect_unconfigured_warnings<I>(config: &SesgConfig, env: I) -> Vec<String>
where
    I: IntoIterator<Item = (String, String)>,
{
    let env_keys = env.into_iter().map(|(key, _)| key).collect::<Vec<_>>();

    let mut warnings = Vec::new();

    if !config.scopus.is_configured() && has_single_underscore_key(&env_keys, "SESG_SCOPUS") {
        warnings.push(
            "No Scopus API keys configured while SESG_SCOPUS* env vars exist. Use double underscores (example: SESG_SCOPUS__API_KEYS='[\"key\"]')."
                .to_string(),
        );
    }

    if config.database.path == "sesg.db" && has_single_underscore_key(&env_keys, "SESG_DATABASE") {
        warnings.push(
            "Database path is the default while SESG_DATABASE* env vars exist. Use double underscores (example: SESG_DATABASE__PATH)."
                .to_string(),
        );
    }

    warnings
}

fn has_single_underscore_key(keys: &[String], prefix: &str) -> bool {
    let nested = format!("{prefix}__");
    keys.iter()
        .any(|key| key.starts_with(prefix) && !key.starts_with(&nested))
}
