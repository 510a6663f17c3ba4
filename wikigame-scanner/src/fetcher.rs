use crate::error::{FetchError, Result};
use crate::result::{PageId, PageRecord, WIKI_PREFIX, title_from_id};
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::time::{Duration, Instant};
use tracing::{debug, info};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://en.wikipedia.org";
pub const RANDOM_PAGE: &str = "/wiki/Special:Random";

/// Source of pages for the traversal engine.
#[allow(async_fn_in_trait)]
pub trait PageFetcher {
    /// Fetch a page and extract its title and body links.
    async fn fetch(&self, id: &str) -> Result<PageRecord>;

    /// Resolve a random article to its concrete page id.
    async fn random_page(&self) -> Result<PageId>;
}

pub struct WikiFetcher {
    client: Client,
    base_url: Url,
}

impl WikiFetcher {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, 10)
    }

    pub fn with_timeout(base_url: &str, timeout_secs: u64) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        let client = Client::builder()
            .user_agent(concat!(
                "wikigame/",
                env!("CARGO_PKG_VERSION"),
                " (link-following game bot)"
            ))
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.div_ceil(2)))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn page_url(&self, id: &str) -> Result<Url> {
        self.base_url
            .join(id)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", id, e)))
    }

    /// Extract title and body links from a page's HTML.
    ///
    /// Links are taken from `<a>` elements that are direct children of the
    /// paragraphs directly under the first `div.mw-parser-output`. Only
    /// article links (`/wiki/...`) are kept, with fragments removed.
    pub fn parse_page(id: &str, html: &str) -> Result<PageRecord> {
        let document = Html::parse_document(html);

        let heading_selector = Selector::parse("h1#firstHeading").unwrap();
        let title = document
            .select(&heading_selector)
            .next()
            .map(|h| h.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| title_from_id(id));

        let content_selector = Selector::parse("div.mw-parser-output").unwrap();
        let content = document
            .select(&content_selector)
            .next()
            .ok_or_else(|| FetchError::MissingContent(id.to_string()))?;

        let mut links = Vec::new();
        for para in child_elements(content, "p") {
            for anchor in child_elements(para, "a") {
                if let Some(href) = anchor.value().attr("href")
                    && let Some(link) = normalize_link(href)
                {
                    links.push(link);
                }
            }
        }

        debug!("Extracted {} links from {}", links.len(), id);
        Ok(PageRecord {
            id: id.to_string(),
            title,
            links,
        })
    }
}

impl PageFetcher for WikiFetcher {
    async fn fetch(&self, id: &str) -> Result<PageRecord> {
        let url = self.page_url(id)?;
        debug!("Fetching {}", url);

        let start = Instant::now();
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        debug!("Fetched {} in {:?}", url, start.elapsed());

        Self::parse_page(id, &body)
    }

    async fn random_page(&self) -> Result<PageId> {
        let url = self.page_url(RANDOM_PAGE)?;
        let response = self.client.get(url).send().await?;
        let resolved = response.url().path().to_string();

        if !resolved.starts_with(WIKI_PREFIX) || resolved == RANDOM_PAGE {
            return Err(FetchError::NoRandomPage(resolved));
        }

        info!("Random page resolved to {}", resolved);
        Ok(resolved)
    }
}

fn child_elements<'a>(parent: ElementRef<'a>, name: &'a str) -> impl Iterator<Item = ElementRef<'a>> {
    parent
        .children()
        .filter_map(ElementRef::wrap)
        .filter(move |e| e.value().name() == name)
}

/// Reduce an href to an article page id, or `None` for anything else.
pub fn normalize_link(href: &str) -> Option<PageId> {
    if !href.starts_with(WIKI_PREFIX) {
        return None;
    }

    let path = href.split(['#', '?']).next().unwrap_or(href);
    if path.len() == WIKI_PREFIX.len() {
        return None;
    }

    Some(path.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    const ARTICLE: &str = r#"<html><body>
        <h1 id="firstHeading"><span>Ginza</span></h1>
        <div class="mw-content-ltr mw-parser-output">
            <div class="hatnote"><a href="/wiki/Hatnote_link">Not body</a></div>
            <p>Ginza is a district of <a href="/wiki/Ch%C5%AB%C5%8D,_Tokyo">Chūō</a>,
               near <a href="/wiki/Tokyo#History">Tokyo</a>.
               <a href="https://example.com/external">external</a>
               <a href="/w/index.php?title=Ginza&action=edit">edit</a>
               <b><a href="/wiki/Nested_in_bold">nested</a></b></p>
            <p>See also <a href="/wiki/Shopping_district">shopping</a>.</p>
        </div>
    </body></html>"#;

    #[test]
    fn test_parse_page_extracts_body_links_in_order() {
        let record = WikiFetcher::parse_page("/wiki/Ginza", ARTICLE).unwrap();

        assert_eq!(record.title, "Ginza");
        assert_eq!(
            record.links,
            vec![
                "/wiki/Ch%C5%AB%C5%8D,_Tokyo",
                "/wiki/Tokyo",
                "/wiki/Shopping_district",
            ]
        );
    }

    #[test]
    fn test_parse_page_without_content_body() {
        let html = "<html><body><h1 id=\"firstHeading\">Odd</h1><p><a href=\"/wiki/A\">A</a></p></body></html>";
        let err = WikiFetcher::parse_page("/wiki/Odd", html).unwrap_err();
        assert!(err.is_extraction());
    }

    #[test]
    fn test_parse_page_title_falls_back_to_id() {
        let html = r#"<div class="mw-parser-output"><p>No links here</p></div>"#;
        let record = WikiFetcher::parse_page("/wiki/Plain_page", html).unwrap();
        assert_eq!(record.title, "Plain page");
        assert!(record.links.is_empty());
    }

    #[test]
    fn test_normalize_link() {
        assert_eq!(normalize_link("/wiki/Reason"), Some("/wiki/Reason".to_string()));
        assert_eq!(normalize_link("/wiki/Reason#Kant"), Some("/wiki/Reason".to_string()));
        assert_eq!(normalize_link("/wiki/"), None);
        assert_eq!(normalize_link("#cite_note-1"), None);
        assert_eq!(normalize_link("//en.wikipedia.org/wiki/Reason"), None);
    }

    #[tokio::test]
    async fn test_fetch_page() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/wiki/Ginza"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_string(ARTICLE),
            )
            .mount(&mock_server)
            .await;

        let fetcher = WikiFetcher::new(&mock_server.uri()).unwrap();
        let record = fetcher.fetch("/wiki/Ginza").await.unwrap();

        assert_eq!(record.id, "/wiki/Ginza");
        assert_eq!(record.links.len(), 3);
    }

    #[tokio::test]
    async fn test_fetch_missing_page_reports_status() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/wiki/Nowhere"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let fetcher = WikiFetcher::new(&mock_server.uri()).unwrap();
        let err = fetcher.fetch("/wiki/Nowhere").await.unwrap_err();

        assert!(matches!(err, FetchError::Status { status: 404, .. }));
        assert!(!err.is_extraction());
    }

    #[tokio::test]
    async fn test_random_page_follows_redirect() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(RANDOM_PAGE))
            .respond_with(ResponseTemplate::new(302).insert_header("location", "/wiki/Ginza"))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/wiki/Ginza"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_string(ARTICLE),
            )
            .mount(&mock_server)
            .await;

        let fetcher = WikiFetcher::new(&mock_server.uri()).unwrap();
        assert_eq!(fetcher.random_page().await.unwrap(), "/wiki/Ginza");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            WikiFetcher::new("not a url"),
            Err(FetchError::InvalidUrl(_))
        ));
    }
}
