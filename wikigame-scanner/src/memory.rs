use crate::error::{FetchError, Result};
use crate::fetcher::{PageFetcher, RANDOM_PAGE};
use crate::result::{PageId, PageRecord, title_from_id};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

/// In-memory link graph served through the `PageFetcher` trait.
///
/// Pages missing from the graph fail like a page without a content body;
/// pages registered with [`MemoryFetcher::with_broken`] fail like a transport
/// error. Every fetch is recorded so callers can inspect the request order;
/// random draws are recorded as [`RANDOM_PAGE`].
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    pages: HashMap<PageId, PageRecord>,
    broken: HashSet<PageId>,
    random: Option<PageId>,
    requests: RefCell<Vec<PageId>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a page whose title is derived from its id.
    pub fn with_page<I, S>(mut self, id: &str, links: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<PageId>,
    {
        let record = PageRecord::new(id, title_from_id(id)).with_links(links);
        self.pages.insert(id.to_string(), record);
        self
    }

    pub fn with_broken(mut self, id: &str) -> Self {
        self.broken.insert(id.to_string());
        self
    }

    pub fn with_random(mut self, id: &str) -> Self {
        self.random = Some(id.to_string());
        self
    }

    pub fn requests(&self) -> Vec<PageId> {
        self.requests.borrow().clone()
    }
}

impl PageFetcher for MemoryFetcher {
    async fn fetch(&self, id: &str) -> Result<PageRecord> {
        self.requests.borrow_mut().push(id.to_string());

        if self.broken.contains(id) {
            return Err(FetchError::Status {
                status: 503,
                url: id.to_string(),
            });
        }

        self.pages
            .get(id)
            .cloned()
            .ok_or_else(|| FetchError::MissingContent(id.to_string()))
    }

    async fn random_page(&self) -> Result<PageId> {
        self.requests.borrow_mut().push(RANDOM_PAGE.to_string());
        self.random
            .clone()
            .ok_or_else(|| FetchError::NoRandomPage("no random page configured".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_fetcher_serves_pages_and_failures() {
        let fetcher = MemoryFetcher::new()
            .with_page("/wiki/A", ["/wiki/B"])
            .with_broken("/wiki/B");

        let a = fetcher.fetch("/wiki/A").await.unwrap();
        assert_eq!(a.title, "A");
        assert_eq!(a.links, vec!["/wiki/B"]);

        assert!(!fetcher.fetch("/wiki/B").await.unwrap_err().is_extraction());
        assert!(fetcher.fetch("/wiki/C").await.unwrap_err().is_extraction());
        assert_eq!(fetcher.requests(), vec!["/wiki/A", "/wiki/B", "/wiki/C"]);
    }

    #[tokio::test]
    async fn test_memory_fetcher_records_random_draws() {
        let fetcher = MemoryFetcher::new().with_random("/wiki/Ginza");

        assert_eq!(fetcher.random_page().await.unwrap(), "/wiki/Ginza");
        assert_eq!(fetcher.requests(), vec![RANDOM_PAGE]);
    }
}
