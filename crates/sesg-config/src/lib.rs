//! # sesg-config
//!
//! Layered configuration loading for the search-string experiment runner
//! using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`SESG_*` prefix, `__` as separator)
//! 2. Project-level `./config.toml`, or the path given with `--config`
//! 3. User-level `~/.config/sesg/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `SESG_SCOPUS__N_CLIENTS` -> `scopus.n_clients`,
//! `SESG_DATABASE__PATH` -> `database.path`, etc. List values use figment's
//! inline syntax: `SESG_SCOPUS__API_KEYS='["k1","k2"]'`.
//!
//! # Usage
//!
//! ```no_run
//! use sesg_config::SesgConfig;
//!
//! let config = SesgConfig::load_with_dotenv(None).expect("config");
//! config.validate().expect("valid config");
//!
//! if config.scopus.is_configured() {
//!     println!("{} Scopus clients", config.scopus.n_clients);
//! }
//! ```

mod database;
mod error;
mod experiment;
mod general;
mod params;
mod providers;
mod scopus;

pub use database::DatabaseConfig;
pub use error::ConfigError;
pub use experiment::{ExperimentConfig, MetricsConfig};
pub use general::GeneralConfig;
pub use params::{BertopicParamsConfig, FormulationParamsConfig, LdaParamsConfig};
pub use providers::ProvidersConfig;
pub use scopus::ScopusConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default project-local config file name.
pub const LOCAL_CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SesgConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub scopus: ScopusConfig,
    #[serde(default)]
    pub formulation_params: FormulationParamsConfig,
    #[serde(default)]
    pub lda_params: LdaParamsConfig,
    #[serde(default)]
    pub bertopic_params: BertopicParamsConfig,
    #[serde(default)]
    pub experiment: ExperimentConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub general: GeneralConfig,
}

impl SesgConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// `local` replaces `./config.toml` as the project-level file. Does NOT
    /// call `dotenvy`; use [`Self::load_with_dotenv`] for `.env` loading.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Figment`] if a source cannot be parsed or a
    /// value has the wrong type.
    pub fn load(local: Option<&Path>) -> Result<Self, ConfigError> {
        Self::figment(local).extract().map_err(ConfigError::from)
    }

    /// Load configuration with `.env` file support.
    ///
    /// # Errors
    ///
    /// See [`Self::load`].
    pub fn load_with_dotenv(local: Option<&Path>) -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load(local)
    }

    /// Build the figment provider chain.
    ///
    /// Public so tests can inspect the figment directly or add providers on
    /// top.
    pub fn figment(local: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Layer 1: User-global config
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        // Layer 2: Project-local config. An explicit path is merged even when
        // missing so figment reports it.
        match local {
            Some(path) => figment = figment.merge(Toml::file_exact(path)),
            None => {
                let local_path = PathBuf::from(LOCAL_CONFIG_FILE);
                if local_path.exists() {
                    figment = figment.merge(Toml::file(local_path));
                }
            }
        }

        // Layer 3: Environment variables (highest priority)
        figment.merge(Env::prefixed("SESG_").split("__"))
    }

    /// Path to the user-global config file.
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("sesg").join("config.toml"))
    }

    /// Check every value the sweep and the metrics depend on.
    ///
    /// Runs before any work so a bad configuration never leaves partial rows
    /// behind.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError::InvalidValue`] or
    /// [`ConfigError::NotConfigured`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.database.is_configured() {
            return Err(ConfigError::NotConfigured {
                section: "database".into(),
            });
        }

        non_empty(
            "formulation_params.n_similar_words_per_word",
            &self.formulation_params.n_similar_words_per_word,
        )?;
        positive_list(
            "formulation_params.n_words_per_topic",
            &self.formulation_params.n_words_per_topic,
        )?;
        positive_list("lda_params.n_topics", &self.lda_params.n_topics)?;
        non_empty(
            "lda_params.min_document_frequency",
            &self.lda_params.min_document_frequency,
        )?;
        if let Some(bad) = self
            .lda_params
            .min_document_frequency
            .iter()
            .find(|f| !(**f > 0.0 && **f <= 1.0))
        {
            return Err(ConfigError::invalid(
                "lda_params.min_document_frequency",
                format!("{bad} is outside (0, 1]"),
            ));
        }
        positive_list(
            "bertopic_params.kmeans_n_clusters",
            &self.bertopic_params.kmeans_n_clusters,
        )?;
        positive_list(
            "bertopic_params.umap_n_neighbors",
            &self.bertopic_params.umap_n_neighbors,
        )?;

        let threshold = self.metrics.similarity_threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(ConfigError::invalid(
                "metrics.similarity_threshold",
                format!("{threshold} is outside (0, 1]"),
            ));
        }
        if self.experiment.qgs_size_divisor == 0 {
            return Err(ConfigError::invalid(
                "experiment.qgs_size_divisor",
                "must be positive",
            ));
        }
        if self.scopus.n_clients == 0 {
            return Err(ConfigError::invalid("scopus.n_clients", "must be positive"));
        }
        if self.scopus.page_size == 0 {
            return Err(ConfigError::invalid("scopus.page_size", "must be positive"));
        }
        Ok(())
    }

    /// [`Self::validate`] plus the requirements of a search run.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotConfigured`] when no API key is present.
    pub fn validate_for_search(&self) -> Result<(), ConfigError> {
        self.validate()?;
        if !self.scopus.is_configured() {
            return Err(ConfigError::NotConfigured {
                section: "scopus".into(),
            });
        }
        Ok(())
    }

    /// Render the configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Render`] if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Write the configuration as TOML to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be written.
    pub fn write_toml(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }
}

fn non_empty<T>(field: &str, values: &[T]) -> Result<(), ConfigError> {
    if values.is_empty() {
        return Err(ConfigError::invalid(field, "list must not be empty"));
    }
    Ok(())
}

fn positive_list(field: &str, values: &[u32]) -> Result<(), ConfigError> {
    non_empty(field, values)?;
    if values.contains(&0) {
        return Err(ConfigError::invalid(field, "values must be positive"));
    }
    Ok(())
}
