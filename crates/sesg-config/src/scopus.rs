//! Scopus search API configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

fn default_base_url() -> String {
    String::from("https://api.elsevier.com/content/search/scopus")
}

const fn default_n_clients() -> u32 {
    1
}

const fn default_timeout_retries() -> u32 {
    10
}

const fn default_backoff_base_ms() -> u64 {
    500
}

const fn default_backoff_max_ms() -> u64 {
    10_000
}

const fn default_request_timeout_secs() -> u64 {
    30
}

const fn default_page_size() -> u32 {
    25
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScopusConfig {
    /// API keys shared by every client. A key reported as expired is never
    /// handed out again during the run.
    #[serde(default)]
    pub api_keys: Vec<String>,

    /// Search endpoint.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Number of concurrent clients the pending strings are partitioned across.
    #[serde(default = "default_n_clients")]
    pub n_clients: u32,

    /// Consecutive timeouts a client tolerates before the run is aborted.
    #[serde(default = "default_timeout_retries")]
    pub timeout_retries: u32,

    /// Delay before the first retry of a timed-out page, doubled per attempt.
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Upper bound of the retry delay.
    #[serde(default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,

    /// Per-request HTTP timeout. Hitting it counts as a retryable timeout.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Entries requested per page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for ScopusConfig {
    fn default() -> Self {
        Self {
            api_keys: Vec::new(),
            base_url: default_base_url(),
            n_clients: default_n_clients(),
            timeout_retries: default_timeout_retries(),
            backoff_base_ms: default_backoff_base_ms(),
            backoff_max_ms: default_backoff_max_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            page_size: default_page_size(),
        }
    }
}

impl ScopusConfig {
    /// At least one non-blank API key is present.
    pub fn is_configured(&self) -> bool {
        self.api_keys.iter().any(|k| !k.trim().is_empty())
    }

    /// Non-blank keys, trimmed, in configured order.
    pub fn usable_keys(&self) -> Vec<String> {
        self.api_keys
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub const fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    pub const fn backoff_max(&self) -> Duration {
        Duration::from_millis(self.backoff_max_ms)
    }

    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_not_configured() {
        let config = ScopusConfig::default();
        assert!(!config.is_configured());
        assert_eq!(config.n_clients, 1);
        assert_eq!(config.timeout_retries, 10);
        assert_eq!(config.page_size, 25);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn blank_keys_do_not_count() {
        let config = ScopusConfig {
            api_keys: vec!["   ".into()],
            ..Default::default()
        };
        assert!(!config.is_configured());

        let config = ScopusConfig {
            api_keys: vec!["   ".into(), "key-1".into()],
            ..Default::default()
        };
        assert!(config.is_configured());
        assert_eq!(config.usable_keys(), vec!["key-1".to_string()]);
    }
}
