use crate::error::{FetchError, Result, ScanError};
use crate::result::Page;
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Loads one node of the graph: its content and outbound links.
///
/// Implementations are shared by every traversal task at once, so they must
/// be safe to call concurrently, and every call must eventually return.
#[async_trait]
pub trait Fetcher<K>: Send + Sync {
    async fn fetch(&self, id: &K) -> std::result::Result<Page<K>, FetchError>;
}

/// Serves a fixed, in-memory graph. Unknown ids fail with `not found: <id>`.
#[derive(Debug, Clone, Default)]
pub struct StaticFetcher {
    pages: HashMap<String, Page<String>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pages(pages: HashMap<String, Page<String>>) -> Self {
        Self { pages }
    }

    pub fn with_page<I, L>(mut self, id: I, content: &str, links: L) -> Self
    where
        I: Into<String>,
        L: IntoIterator,
        L::Item: Into<String>,
    {
        let links = links.into_iter().map(Into::into).collect();
        self.pages.insert(id.into(), Page::new(content, links));
        self
    }

    /// Parses a graph of the form `{ "<id>": { "content": "...", "links": [..] } }`.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let pages: HashMap<String, Page<String>> = serde_json::from_str(json)?;
        Ok(Self::from_pages(pages))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.pages.contains_key(id)
    }
}

#[async_trait]
impl Fetcher<String> for StaticFetcher {
    async fn fetch(&self, id: &String) -> std::result::Result<Page<String>, FetchError> {
        self.pages
            .get(id)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(format!("not found: {}", id)))
    }
}

/// Fetches pages over HTTP and follows their `<a href>` links.
///
/// Only links on the page's own host (or its subdomains) are returned
/// unless external links are enabled.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    follow_external: bool,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        Self::with_timeout(10)
    }

    pub fn with_timeout(timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("skein/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.div_ceil(2)))
            .pool_max_idle_per_host(50)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self {
            client,
            follow_external: false,
        })
    }

    pub fn with_follow_external(mut self, follow_external: bool) -> Self {
        self.follow_external = follow_external;
        self
    }

    /// Validates a root before handing it to a traversal.
    pub fn parse_root(url: &str) -> Result<String> {
        Url::parse(url)
            .map(|u| u.to_string())
            .map_err(|e| ScanError::InvalidUrl(format!("{}: {}", url, e)))
    }
}

#[async_trait]
impl Fetcher<String> for HttpFetcher {
    async fn fetch(&self, url: &String) -> std::result::Result<Page<String>, FetchError> {
        debug!("Fetching {}", url);

        let response = self.client.get(url.as_str()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let is_html = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.contains("text/html"))
            .unwrap_or(false);

        let body = response.text().await?;
        let links = if is_html {
            extract_links(&body, url, self.follow_external)
        } else {
            Vec::new()
        };

        Ok(Page::new(body, links))
    }
}

fn extract_links(html: &str, current_url: &str, follow_external: bool) -> Vec<String> {
    let Ok(base) = Url::parse(current_url) else {
        return Vec::new();
    };
    let base_host = base.host_str().unwrap_or_default().to_string();
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let document = Html::parse_document(html);
    let mut links = Vec::new();

    for element in document.select(&selector) {
        if let Some(href) = element.value().attr("href")
            && let Some(absolute_url) = resolve_url(&base, href)
        {
            if follow_external || is_same_host(&absolute_url, &base_host) {
                links.push(absolute_url);
            } else {
                debug!("Skipping external link {}", absolute_url);
            }
        }
    }

    links
}

fn resolve_url(base: &Url, href: &str) -> Option<String> {
    if href.is_empty()
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with('#')
    {
        return None;
    }

    let mut url = base.join(href).ok()?;
    url.set_fragment(None);
    Some(url.to_string())
}

fn is_same_host(url: &str, base_host: &str) -> bool {
    if let Ok(parsed) = Url::parse(url)
        && let Some(host) = parsed.host_str()
    {
        return host == base_host || host.ends_with(&format!(".{}", base_host));
    }
    false
}
