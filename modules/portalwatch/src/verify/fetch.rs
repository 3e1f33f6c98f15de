//! Page retrieval for verification.

use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use portalwatch_common::domain_of;

const FETCH_TIMEOUT: Duration = Duration::from_secs(15);
const MAX_REDIRECTS: usize = 5;
const USER_AGENT: &str = "PortalWatchBot/1.0 (site verification)";

/// Title is clipped to this many characters.
const MAX_TITLE_CHARS: usize = 200;
/// Extracted page text is clipped to this many characters.
const MAX_CONTENT_CHARS: usize = 3000;

/// What came back from fetching a candidate page. Failures land in `error`
/// rather than propagating; the orchestrator classifies them per candidate.
#[derive(Debug, Clone, Default)]
pub struct FetchedPage {
    pub url: String,
    pub title: String,
    pub content: String,
    pub status: Option<u16>,
    /// Final URL, set only when the response landed on a different domain.
    pub redirect: Option<String>,
    pub error: Option<String>,
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> FetchedPage;
}

/// HTTP fetcher with a bounded timeout and redirect chain.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(USER_AGENT)
            .build()
            .expect("Failed to build HTTP client");
        Self { client }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> FetchedPage {
        let mut page = FetchedPage {
            url: url.to_string(),
            ..FetchedPage::default()
        };

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                page.error = Some(describe_error(&e));
                return page;
            }
        };

        page.status = Some(response.status().as_u16());

        let final_url = response.url().to_string();
        if domain_of(url) != domain_of(&final_url) {
            page.redirect = Some(final_url);
        }

        if page.status == Some(200) {
            match response.text().await {
                Ok(html) => {
                    page.title = extract_title(&html);
                    page.content = extract_text(&html);
                }
                Err(e) => page.error = Some(describe_error(&e)),
            }
        }

        debug!(url = %page.url, status = ?page.status, redirect = ?page.redirect, "fetched");
        page
    }
}

/// Timeouts get a stable short message; other transport errors are clipped.
fn describe_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "timeout".to_string()
    } else {
        error.to_string().chars().take(100).collect()
    }
}

fn extract_title(html: &str) -> String {
    let title_re = Regex::new(r"(?i)<title[^>]*>([^<]+)</title>").unwrap();
    match title_re.captures(html) {
        Some(cap) => cap[1].trim().chars().take(MAX_TITLE_CHARS).collect(),
        None => String::new(),
    }
}

/// Render markup down to plain text with whitespace collapsed, clipped to
/// what the oracle prompt can carry.
fn extract_text(html: &str) -> String {
    let text = html2text::from_read(html.as_bytes(), 80).unwrap_or_default();
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(MAX_CONTENT_CHARS).collect()
}
