//! External collaborator bridges: topic extraction, `bert` word expansion
//! (subprocess), and `llm` word expansion (Ollama-compatible HTTP).

use serde::{Deserialize, Serialize};

fn default_topic_command() -> Vec<String> {
    vec!["sesg-bridge".into(), "topics".into()]
}

fn default_bert_command() -> Vec<String> {
    vec!["sesg-bridge".into(), "similar-words".into()]
}

fn default_ollama_url() -> String {
    String::from("http://localhost:11434")
}

fn default_ollama_model() -> String {
    String::from("mistral")
}

const fn default_llm_n_synonyms() -> u32 {
    5
}

const fn default_llm_retries() -> u32 {
    3
}

const fn default_request_timeout_secs() -> u64 {
    120
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProvidersConfig {
    /// Program and arguments of the topic-extraction bridge. Receives one JSON
    /// request on stdin and answers with JSON on stdout.
    #[serde(default = "default_topic_command")]
    pub topic_command: Vec<String>,

    /// Program and arguments of the `bert` similar-word bridge.
    #[serde(default = "default_bert_command")]
    pub bert_command: Vec<String>,

    /// Base URL of the Ollama-compatible server used by the `llm` strategy.
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,

    #[serde(default = "default_ollama_model")]
    pub ollama_model: String,

    /// Synonyms requested from the model per word.
    #[serde(default = "default_llm_n_synonyms")]
    pub llm_n_synonyms: u32,

    /// Attempts per word when the model answers with malformed JSON.
    #[serde(default = "default_llm_retries")]
    pub llm_retries: u32,

    /// Timeout of one bridge invocation or model request.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            topic_command: default_topic_command(),
            bert_command: default_bert_command(),
            ollama_url: default_ollama_url(),
            ollama_model: default_ollama_model(),
            llm_n_synonyms: default_llm_n_synonyms(),
            llm_retries: default_llm_retries(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}
