//! The remote search seam.

use serde::{Deserialize, Serialize};

use crate::error::PageFailure;

/// One search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub title: String,
    pub doi: Option<String>,
    pub eid: Option<String>,
}

/// One page of results. Pages are numbered from 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub number: u32,
    pub n_pages: u32,
    pub total_results: u64,
    pub entries: Vec<Entry>,
}

impl Page {
    /// No further page should be requested after this one.
    #[must_use]
    pub fn is_final(&self) -> bool {
        self.number >= self.n_pages || self.entries.is_empty()
    }
}

/// A remote search backend, driven one page at a time.
///
/// Implementations hold no per-search state; the caller owns the page
/// cursor and the API key.
#[allow(async_fn_in_trait)]
pub trait SearchClient: Send + Sync {
    /// Fetch page `page` (1-based) of `query` with `api_key`.
    async fn fetch_page(&self, query: &str, page: u32, api_key: &str)
    -> Result<Page, PageFailure>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(number: u32, n_pages: u32, n_entries: usize) -> Page {
        Page {
            number,
            n_pages,
            total_results: 0,
            entries: (0..n_entries)
                .map(|i| Entry {
                    title: format!("t{i}"),
                    doi: None,
                    eid: None,
                })
                .collect(),
        }
    }

    #[test]
    fn final_page_detection() {
        assert!(!page(1, 3, 25).is_final());
        assert!(page(3, 3, 10).is_final());
        assert!(page(1, 0, 0).is_final());
        // an empty page ends the search even if more were announced
        assert!(page(2, 5, 0).is_final());
    }
}
