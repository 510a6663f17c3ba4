use serde::{Deserialize, Serialize};

/// Site-relative path of an article, e.g. `/wiki/Philosophy`.
pub type PageId = String;

pub const WIKI_PREFIX: &str = "/wiki/";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    pub id: PageId,
    pub title: String,
    /// Outbound article links from the body paragraphs, in document order.
    pub links: Vec<PageId>,
}

impl PageRecord {
    pub fn new(id: impl Into<PageId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            links: Vec::new(),
        }
    }

    pub fn with_links<I, S>(mut self, links: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<PageId>,
    {
        self.links = links.into_iter().map(Into::into).collect();
        self
    }
}

/// Article name of a page id, with the prefix stripped and percent-escapes decoded.
pub fn article_name(id: &str) -> String {
    let name = id.strip_prefix(WIKI_PREFIX).unwrap_or(id);
    urlencoding::decode(name)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| name.to_string())
}

/// Form of a page id used for identity: percent-escapes decoded, spaces as underscores.
///
/// `/wiki/Caf%C3%A9` and `/wiki/Café` are the same page.
pub fn canonical_id(id: &str) -> PageId {
    urlencoding::decode(id)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| id.to_string())
        .replace(' ', "_")
}

/// Human readable title derived from a page id, used before the page is fetched.
pub fn title_from_id(id: &str) -> String {
    article_name(id).replace('_', " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_article_name_strips_prefix() {
        assert_eq!(article_name("/wiki/Financial_engineering"), "Financial_engineering");
        assert_eq!(article_name("Reason"), "Reason");
    }

    #[test]
    fn test_canonical_id_decodes_escapes() {
        assert_eq!(canonical_id("/wiki/Caf%C3%A9"), canonical_id("/wiki/Café"));
        assert_eq!(canonical_id("/wiki/Hitchhiker%27s_Guide"), "/wiki/Hitchhiker's_Guide");
        assert_eq!(canonical_id("/wiki/Shopping district"), "/wiki/Shopping_district");
    }

    #[test]
    fn test_article_name_decodes_escapes() {
        assert_eq!(article_name("/wiki/Caf%C3%A9"), "Café");
    }

    #[test]
    fn test_title_from_id() {
        assert_eq!(title_from_id("/wiki/Ginza_Line"), "Ginza Line");
    }
}
