// src/crawl/visited.rs
// =============================================================================
// The visited set shared by every seed worker.
//
// A URL is claimed the moment it is checked, before it is fetched. If the fetch
// later fails the URL stays claimed: each URL gets at most one fetch attempt
// per run, no matter which worker found it first.
//
// The lock is held only for the check-and-insert and never across an await.
// =============================================================================

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use url::Url;

#[derive(Debug, Clone, Default)]
pub struct VisitedSet {
    inner: Arc<Mutex<HashSet<String>>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `url` for the caller.
    ///
    /// Returns true if this call inserted the URL, false if some worker had
    /// already claimed it.
    pub fn claim(&self, url: &Url) -> bool {
        let key = normalize(url);

        // A panic while holding the lock can't leave the set half-updated,
        // so a poisoned lock is still safe to use.
        let mut visited = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        visited.insert(key)
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, url: &Url) -> bool {
        let visited = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        visited.contains(&normalize(url))
    }

    /// Number of distinct URLs claimed so far.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

// The url crate already lower-cases scheme and host, elides default ports and
// resolves dot segments. We only need to drop the fragment.
pub fn normalize(url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);
    url.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_only_once() {
        let visited = VisitedSet::new();
        let url = Url::parse("https://example.com/about").unwrap();

        assert!(visited.claim(&url));
        assert!(!visited.claim(&url));
        assert!(visited.contains(&url));
        assert_eq!(visited.len(), 1);
    }

    #[test]
    fn test_fragment_is_ignored() {
        let visited = VisitedSet::new();
        let plain = Url::parse("https://example.com/about").unwrap();
        let anchored = Url::parse("https://example.com/about#team").unwrap();

        assert!(visited.claim(&plain));
        assert!(!visited.claim(&anchored));
    }

    #[test]
    fn test_normalize_uses_canonical_form() {
        let url = Url::parse("HTTPS://Example.COM:443/a/./b/../c#x").unwrap();
        assert_eq!(normalize(&url), "https://example.com/a/c");
    }

    #[test]
    fn test_query_strings_are_distinct() {
        let visited = VisitedSet::new();
        assert!(visited.claim(&Url::parse("https://example.com/list?page=1").unwrap()));
        assert!(visited.claim(&Url::parse("https://example.com/list?page=2").unwrap()));
    }

    #[test]
    fn test_concurrent_claims_have_one_winner() {
        let visited = VisitedSet::new();
        let url = Url::parse("https://example.com/shared").unwrap();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let visited = visited.clone();
                let url = url.clone();
                std::thread::spawn(move || visited.claim(&url))
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();

        assert_eq!(winners, 1);
    }
}
