//! Search-string formulation.
//!
//! Turns extracted topics into a boolean query. The formulation asks the
//! word provider for expansions; callers pass the cached provider so every
//! word is expanded at most once per experiment.

use sesg_core::entities::{FormulationParams, Review};

use crate::error::ProviderError;
use crate::providers::SimilarWordProvider;

/// Builds a query from topics.
#[allow(async_fn_in_trait)]
pub trait Formulation {
    async fn formulate<W: SimilarWordProvider>(
        &self,
        topics: &[Vec<String>],
        words: &W,
        params: &FormulationParams,
    ) -> Result<String, ProviderError>;
}

/// `("w1" OR "w1-similar" OR "w2") AND ("w3" OR …)`: the first
/// `n_words_per_topic` words of each topic, each followed by up to
/// `n_similar_words_per_word` expansions, OR-ed within a topic and AND-ed
/// across topics. Duplicate terms within a topic are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanFormulation;

fn quote(term: &str) -> Option<String> {
    let cleaned = term.replace('"', " ");
    let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    (!cleaned.is_empty()).then(|| format!("\"{cleaned}\""))
}

impl Formulation for BooleanFormulation {
    async fn formulate<W: SimilarWordProvider>(
        &self,
        topics: &[Vec<String>],
        words: &W,
        params: &FormulationParams,
    ) -> Result<String, ProviderError> {
        let n_words = params.n_words_per_topic as usize;
        let n_similar = params.n_similar_words_per_word as usize;

        let mut groups = Vec::new();
        for topic in topics {
            let mut terms: Vec<String> = Vec::new();
            for word in topic.iter().take(n_words) {
                let mut candidates = vec![word.clone()];
                if n_similar > 0 {
                    candidates.extend(words.similar_words(word).await?.into_iter().take(n_similar));
                }
                for term in candidates.iter().filter_map(|c| quote(c)) {
                    if !terms.contains(&term) {
                        terms.push(term);
                    }
                }
            }
            if !terms.is_empty() {
                groups.push(format!("({})", terms.join(" OR ")));
            }
        }

        if groups.is_empty() {
            return Err(ProviderError::Protocol(
                "topic extraction produced no usable words".into(),
            ));
        }
        Ok(groups.join(" AND "))
    }
}

/// Restrict a formulated string to titles, abstracts, and keywords, and to
/// the review's publication years (both bounds inclusive).
#[must_use]
pub fn scope_to_review(formulated: &str, review: &Review) -> String {
    let mut string = format!("TITLE-ABS-KEY({formulated})");
    if let Some(min) = review.min_publication_year {
        string.push_str(&format!(" AND PUBYEAR > {}", min - 1));
    }
    if let Some(max) = review.max_publication_year {
        string.push_str(&format!(" AND PUBYEAR < {}", max + 1));
    }
    string
}
