//! Driving a `SearchClient` through a full paged search with a rotating
//! credential pool.

use std::sync::Mutex;

use pretty_assertions::assert_eq;

use sesg_scopus::{CredentialPool, Entry, Page, PageFailure, SearchClient};

/// Three pages of two entries; rejects `key-0` as expired.
struct Fake {
    calls: Mutex<Vec<(u32, String)>>,
}

impl SearchClient for Fake {
    async fn fetch_page(&self, query: &str, page: u32, api_key: &str) -> Result<Page, PageFailure> {
        self.calls.lock().unwrap().push((page, api_key.to_string()));
        if api_key == "key-0" {
            return Err(PageFailure::KeyExpired);
        }
        Ok(Page {
            number: page,
            n_pages: 3,
            total_results: 6,
            entries: (0..2)
                .map(|i| Entry {
                    title: format!("{query} p{page} e{i}"),
                    doi: None,
                    eid: None,
                })
                .collect(),
        })
    }
}

#[tokio::test]
async fn paged_search_with_rotation() {
    let client = Fake {
        calls: Mutex::new(Vec::new()),
    };
    let pool = CredentialPool::new(vec!["key-0".into(), "key-1".into()]).unwrap();
    let mut lease = pool.acquire().unwrap();

    let mut titles = Vec::new();
    let mut page = 1;
    loop {
        match client.fetch_page("q", page, &lease.key).await {
            Ok(result) => {
                titles.extend(result.entries.iter().map(|e| e.title.clone()));
                if result.is_final() {
                    break;
                }
                page += 1;
            }
            Err(PageFailure::KeyExpired) => lease = pool.rotate(&lease).unwrap(),
            Err(other) => panic!("unexpected {other}"),
        }
    }

    assert_eq!(titles.len(), 6);
    assert_eq!(titles[0], "q p1 e0");
    let calls = client.calls.lock().unwrap();
    assert_eq!(calls[0], (1, "key-0".to_string()));
    assert_eq!(calls[1], (1, "key-1".to_string()));
    assert_eq!(calls.len(), 4);
}
