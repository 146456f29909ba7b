//! Scopus Search API client.

use sesg_config::ScopusConfig;

use crate::client::{Entry, Page, SearchClient};
use crate::error::{ClientError, PageFailure};
use crate::http::{check_response, classify_transport};

/// Scopus refuses offsets past this many results.
pub const MAX_RESULTS: u64 = 5000;

#[derive(serde::Deserialize)]
struct SearchResponse {
    #[serde(rename = "search-results")]
    results: SearchResults,
}

#[derive(serde::Deserialize)]
struct SearchResults {
    #[serde(rename = "opensearch:totalResults", default)]
    total_results: Option<String>,
    #[serde(default)]
    entry: Vec<RawEntry>,
}

/// An entry without a title is the API's "Result set was empty" marker.
#[derive(serde::Deserialize)]
struct RawEntry {
    #[serde(rename = "dc:title")]
    title: Option<String>,
    #[serde(rename = "prism:doi")]
    doi: Option<String>,
    eid: Option<String>,
}

pub struct ScopusClient {
    http: reqwest::Client,
    base_url: String,
    page_size: u32,
}

impl ScopusClient {
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &ScopusConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .user_agent("sesg/0.1")
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            page_size: config.page_size.max(1),
        })
    }

    fn page_url(&self, query: &str, page: u32) -> String {
        let start = u64::from(page.saturating_sub(1)) * u64::from(self.page_size);
        format!(
            "{}?query={}&start={start}&count={}",
            self.base_url,
            urlencoding::encode(query),
            self.page_size
        )
    }

    fn to_page(&self, number: u32, data: SearchResponse) -> Page {
        let total_results = data
            .results
            .total_results
            .and_then(|t| t.trim().parse::<u64>().ok())
            .unwrap_or(0);
        let reachable = total_results.min(MAX_RESULTS);
        let n_pages = u32::try_from(reachable.div_ceil(u64::from(self.page_size))).unwrap_or(u32::MAX);
        let entries = data
            .results
            .entry
            .into_iter()
            .filter_map(|raw| {
                raw.title.map(|title| Entry {
                    title,
                    doi: raw.doi,
                    eid: raw.eid,
                })
            })
            .collect();
        Page {
            number,
            n_pages,
            total_results,
            entries,
        }
    }
}

impl SearchClient for ScopusClient {
    async fn fetch_page(&self, query: &str, page: u32, api_key: &str) -> Result<Page, PageFailure> {
        let url = self.page_url(query, page);
        let resp = self
            .http
            .get(&url)
            .header("X-ELS-APIKey", api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| classify_transport(&e))?;
        let resp = check_response(resp)?;

        let data: SearchResponse = resp.json().await.map_err(|e| {
            tracing::warn!(%e, page, "unreadable search response; retrying");
            PageFailure::Timeout
        })?;
        let page = self.to_page(page, data);
        tracing::debug!(
            page = page.number,
            n_pages = page.n_pages,
            entries = page.entries.len(),
            "page received"
        );
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const FIXTURE: &str = r#"{
        "search-results": {
            "opensearch:totalResults": "53",
            "opensearch:startIndex": "25",
            "opensearch:itemsPerPage": "25",
            "entry": [
                {
                    "dc:title": "Mutation testing at scale",
                    "prism:doi": "10.1000/mt",
                    "eid": "2-s2.0-1"
                },
                {
                    "dc:title": "Flaky test detection",
                    "eid": "2-s2.0-2"
                }
            ]
        }
    }"#;

    const EMPTY: &str = r#"{
        "search-results": {
            "opensearch:totalResults": "0",
            "entry": [{"@_fa": "true", "error": "Result set was empty"}]
        }
    }"#;

    fn client() -> ScopusClient {
        ScopusClient::new(&ScopusConfig::default()).unwrap()
    }

    #[test]
    fn parses_entries_and_page_count() {
        let data: SearchResponse = serde_json::from_str(FIXTURE).unwrap();
        let page = client().to_page(2, data);
        assert_eq!(page.total_results, 53);
        assert_eq!(page.n_pages, 3);
        assert_eq!(page.entries.len(), 2);
        assert_eq!(page.entries[0].doi.as_deref(), Some("10.1000/mt"));
        assert_eq!(page.entries[1].doi, None);
        assert!(!page.is_final());
    }

    #[test]
    fn empty_result_marker_yields_no_entries() {
        let data: SearchResponse = serde_json::from_str(EMPTY).unwrap();
        let page = client().to_page(1, data);
        assert!(page.entries.is_empty());
        assert_eq!(page.n_pages, 0);
        assert!(page.is_final());
    }

    #[test]
    fn page_count_is_capped() {
        let data: SearchResponse = serde_json::from_str(
            r#"{"search-results": {"opensearch:totalResults": "120000", "entry": []}}"#,
        )
        .unwrap();
        assert_eq!(client().to_page(1, data).n_pages, 200);
    }

    #[test]
    fn url_encodes_query_and_offset() {
        let url = client().page_url("TITLE-ABS-KEY(\"a b\")", 3);
        assert!(url.starts_with("https://api.elsevier.com/content/search/scopus?query="));
        assert!(url.contains("TITLE-ABS-KEY%28%22a%20b%22%29"));
        assert!(url.ends_with("&start=50&count=25"));
    }
}
