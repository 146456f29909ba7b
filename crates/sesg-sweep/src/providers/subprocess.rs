//! JSON-over-stdio bridge to an external model process.
//!
//! One process per request. The request is written to stdin as a single
//! JSON document and stdin is closed; the process answers with one JSON
//! document on stdout and exits 0.

use std::process::Stdio;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use sesg_core::entities::ModelParams;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::error::ProviderError;
use crate::providers::{SimilarWordProvider, TopicExtractor};

fn split_command(command: Vec<String>, role: &str) -> Result<(String, Vec<String>), ProviderError> {
    let mut parts = command.into_iter();
    let program = parts
        .next()
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| ProviderError::NotConfigured(role.to_string()))?;
    Ok((program, parts.collect()))
}

/// Used until [`SubprocessTopicExtractor::with_timeout`] or
/// [`SubprocessSimilarWords::with_timeout`] says otherwise.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Run `program args…` with `request` on stdin and parse stdout. The process
/// is killed if it outlives `timeout`.
async fn call<Req, Resp>(
    program: &str,
    args: &[String],
    request: &Req,
    timeout: Duration,
) -> Result<Resp, ProviderError>
where
    Req: Serialize + Sync,
    Resp: DeserializeOwned,
{
    let spawn_err = |source| ProviderError::Spawn {
        command: program.to_string(),
        source,
    };
    let payload =
        serde_json::to_vec(request).map_err(|e| ProviderError::Protocol(e.to_string()))?;

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(spawn_err)?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(&payload).await.map_err(spawn_err)?;
    }
    let output = tokio::time::timeout(timeout, child.wait_with_output())
        .await
        .map_err(|_| ProviderError::TimedOut {
            command: program.to_string(),
            secs: timeout.as_secs(),
        })?
        .map_err(spawn_err)?;

    if !output.status.success() {
        return Err(ProviderError::Exit {
            command: program.to_string(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    serde_json::from_slice(&output.stdout).map_err(|e| {
        ProviderError::Protocol(format!("{program}: {e}"))
    })
}

#[derive(Serialize)]
struct TopicsRequest<'a> {
    documents: &'a [String],
    #[serde(flatten)]
    params: &'a ModelParams,
}

#[derive(serde::Deserialize)]
struct TopicsResponse {
    topics: Vec<Vec<String>>,
}

/// Topic extraction through the bridge. The request carries the documents
/// and the model parameters tagged with their `family`.
pub struct SubprocessTopicExtractor {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl SubprocessTopicExtractor {
    /// # Errors
    ///
    /// Returns [`ProviderError::NotConfigured`] if `command` is empty.
    pub fn new(command: Vec<String>) -> Result<Self, ProviderError> {
        let (program, args) = split_command(command, "providers.topic_command")?;
        Ok(Self {
            program,
            args,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl TopicExtractor for SubprocessTopicExtractor {
    async fn extract_topics(
        &self,
        documents: &[String],
        params: &ModelParams,
    ) -> Result<Vec<Vec<String>>, ProviderError> {
        let response: TopicsResponse = call(
            &self.program,
            &self.args,
            &TopicsRequest { documents, params },
            self.timeout,
        )
        .await?;
        tracing::debug!(
            family = %params.family(),
            topics = response.topics.len(),
            "topics extracted"
        );
        Ok(response.topics)
    }
}

#[derive(Serialize)]
struct SimilarWordsRequest<'a> {
    word: &'a str,
    enrichment_text: &'a str,
}

#[derive(serde::Deserialize)]
struct SimilarWordsResponse {
    similar_words: Vec<String>,
}

/// `bert` word expansion through the bridge.
pub struct SubprocessSimilarWords {
    program: String,
    args: Vec<String>,
    enrichment_text: String,
    timeout: Duration,
}

impl SubprocessSimilarWords {
    /// # Errors
    ///
    /// Returns [`ProviderError::NotConfigured`] if `command` is empty.
    pub fn new(command: Vec<String>, enrichment_text: &str) -> Result<Self, ProviderError> {
        let (program, args) = split_command(command, "providers.bert_command")?;
        Ok(Self {
            program,
            args,
            enrichment_text: enrichment_text.to_string(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl SimilarWordProvider for SubprocessSimilarWords {
    async fn similar_words(&self, word: &str) -> Result<Vec<String>, ProviderError> {
        let response: SimilarWordsResponse = call(
            &self.program,
            &self.args,
            &SimilarWordsRequest {
                word,
                enrichment_text: &self.enrichment_text,
            },
            self.timeout,
        )
        .await?;
        Ok(response.similar_words)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use pretty_assertions::assert_eq;
    use sesg_core::entities::LdaParams;

    use super::*;

    fn sh(script: &str) -> Vec<String> {
        vec!["sh".into(), "-c".into(), script.into()]
    }

    #[tokio::test]
    async fn topics_roundtrip_through_process() {
        let extractor = SubprocessTopicExtractor::new(sh(
            r#"cat > /dev/null; echo '{"topics": [["testing", "mutation"], ["flaky"]]}'"#,
        ))
        .unwrap();
        let params = ModelParams::Lda(LdaParams {
            id: "lda-1".into(),
            n_topics: 2,
            min_document_frequency: 0.1,
        });
        let topics = extractor
            .extract_topics(&["doc one".into()], &params)
            .await
            .unwrap();
        assert_eq!(topics, vec![vec!["testing", "mutation"], vec!["flaky"]]);
    }

    #[tokio::test]
    async fn request_reaches_stdin() {
        let provider = SubprocessSimilarWords::new(
            sh(r#"grep -q '"word":"probe"' && echo '{"similar_words": ["found"]}'"#),
            "context",
        )
        .unwrap();
        assert_eq!(provider.similar_words("probe").await.unwrap(), vec!["found"]);
        assert!(provider.similar_words("other").await.is_err());
    }

    #[tokio::test]
    async fn failing_process_reports_stderr() {
        let provider =
            SubprocessSimilarWords::new(sh("echo boom >&2; exit 3"), "context").unwrap();
        let err = provider.similar_words("x").await.unwrap_err();
        assert!(matches!(err, ProviderError::Exit { ref stderr, .. } if stderr == "boom"));
    }

    #[tokio::test]
    async fn garbage_output_is_a_protocol_error() {
        let provider = SubprocessSimilarWords::new(sh("echo not-json"), "context").unwrap();
        assert!(matches!(
            provider.similar_words("x").await.unwrap_err(),
            ProviderError::Protocol(_)
        ));
    }

    #[tokio::test]
    async fn slow_process_times_out() {
        let provider = SubprocessSimilarWords::new(sh("sleep 5"), "context")
            .unwrap()
            .with_timeout(Duration::from_millis(100));
        assert!(matches!(
            provider.similar_words("x").await.unwrap_err(),
            ProviderError::TimedOut { .. }
        ));
    }

    #[test]
    fn empty_command_is_not_configured() {
        assert!(matches!(
            SubprocessTopicExtractor::new(Vec::new()),
            Err(ProviderError::NotConfigured(_))
        ));
    }
}
