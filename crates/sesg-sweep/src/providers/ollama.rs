//! `llm` word expansion over an Ollama-compatible chat endpoint.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use sesg_config::ProvidersConfig;

use crate::error::ProviderError;
use crate::providers::SimilarWordProvider;

const SYSTEM_PROMPT: &str = "You are a helpful synonym generator. Answer with a JSON object \
     and nothing more. Follow this example: {\"synonyms\": [\"house\", \"home\"]}";

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    format: &'static str,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: String,
}

pub struct OllamaSimilarWords {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    n_synonyms: u32,
    attempts: u32,
    enrichment_text: String,
}

impl OllamaSimilarWords {
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &ProvidersConfig, enrichment_text: &str) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .user_agent("sesg/0.1")
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            endpoint: format!("{}/api/chat", config.ollama_url.trim_end_matches('/')),
            model: config.ollama_model.clone(),
            n_synonyms: config.llm_n_synonyms,
            attempts: config.llm_retries.max(1),
            enrichment_text: enrichment_text.to_string(),
        })
    }

    /// First sentence of the enrichment text mentioning `word`.
    fn context(&self, word: &str) -> String {
        let needle = word.to_lowercase();
        self.enrichment_text
            .split('.')
            .find(|sentence| sentence.to_lowercase().contains(&needle))
            .map(|sentence| format!("{}.", sentence.trim()))
            .unwrap_or_default()
    }

    fn prompt(&self, word: &str) -> String {
        format!(
            "Given the following context: {}. Generate this amount of synonyms: {} for this topic: {word}.",
            self.context(word),
            self.n_synonyms
        )
    }

    async fn ask(&self, word: &str) -> Result<Vec<String>, ProviderError> {
        let prompt = self.prompt(word);
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            format: "json",
            stream: false,
        };
        let resp = self
            .http
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?
            .error_for_status()?;
        let reply: ChatResponse = resp.json().await?;
        parse_synonyms(&reply.message.content, word)
    }
}

/// Extract the word list from the model's JSON answer: the `synonyms` key,
/// or else the first list-valued key. The source word itself is dropped.
fn parse_synonyms(content: &str, word: &str) -> Result<Vec<String>, ProviderError> {
    let value: serde_json::Value = serde_json::from_str(content)
        .map_err(|e| ProviderError::Protocol(format!("model answer is not JSON: {e}")))?;
    let object = value
        .as_object()
        .ok_or_else(|| ProviderError::Protocol("model answer is not a JSON object".into()))?;
    let list = object
        .get("synonyms")
        .and_then(serde_json::Value::as_array)
        .or_else(|| object.values().find_map(serde_json::Value::as_array))
        .ok_or_else(|| ProviderError::Protocol(format!("no word list in model answer: {content}")))?;

    Ok(list
        .iter()
        .filter_map(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|w| !w.is_empty() && !w.eq_ignore_ascii_case(word))
        .map(ToString::to_string)
        .collect())
}

impl SimilarWordProvider for OllamaSimilarWords {
    async fn similar_words(&self, word: &str) -> Result<Vec<String>, ProviderError> {
        let mut attempt = 1;
        loop {
            match self.ask(word).await {
                Ok(words) => return Ok(words),
                Err(ProviderError::Protocol(reason)) if attempt < self.attempts => {
                    tracing::warn!(word, attempt, %reason, "malformed model answer; asking again");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
