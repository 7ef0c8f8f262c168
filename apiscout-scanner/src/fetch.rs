use crate::error::{Result, ScanError};
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, warn};

/// A single way of getting a page. Strategies are tried in order and the
/// first success short-circuits, so a direct request can fall back to a
/// relay without the caller knowing.
#[derive(Debug, Clone)]
pub enum FetchStrategy {
    /// Plain GET against the URL itself.
    Direct,
    /// GET against `<prefix><url>`, for CORS relays and similar proxies.
    Proxy(String),
}

impl FetchStrategy {
    fn request_url(&self, url: &str) -> String {
        match self {
            FetchStrategy::Direct => url.to_string(),
            FetchStrategy::Proxy(prefix) => format!("{}{}", prefix, url),
        }
    }
}

/// A page as returned by the fetch layer: raw markup plus the pieces the
/// analysis layer needs (visible text, title).
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub status_code: u16,
    pub content_type: Option<String>,
    pub html: String,
    pub text: String,
    pub title: String,
}

pub struct Fetcher {
    client: Client,
    strategies: Vec<FetchStrategy>,
}

impl Fetcher {
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .user_agent("ApiScout/0.1 (PSD2 compliance research)")
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.div_ceil(2)))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self {
            client,
            strategies: vec![FetchStrategy::Direct],
        })
    }

    pub fn with_strategies(mut self, strategies: Vec<FetchStrategy>) -> Self {
        if !strategies.is_empty() {
            self.strategies = strategies;
        }
        self
    }

    /// Fetch one page, trying each strategy in turn. Non-2xx responses
    /// count as strategy failures.
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        for strategy in &self.strategies {
            let request_url = strategy.request_url(url);
            debug!("Fetching {} via {:?}", request_url, strategy);

            let response = match self.client.get(&request_url).send().await {
                Ok(r) => r,
                Err(e) => {
                    warn!("Fetch attempt failed for {}: {}", request_url, e);
                    continue;
                }
            };

            let status = response.status();
            if !status.is_success() {
                warn!("Fetch attempt for {} returned {}", request_url, status);
                continue;
            }

            let content_type = response
                .headers()
                .get("content-type")
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string());

            let html = response.text().await?;
            let (title, text) = extract_text(&html);

            return Ok(FetchedPage {
                status_code: status.as_u16(),
                content_type,
                html,
                text,
                title,
            });
        }

        Err(ScanError::FetchExhausted(url.to_string()))
    }
}

/// Pull the title and whitespace-normalized visible text out of markup.
pub fn extract_text(html: &str) -> (String, String) {
    let document = Html::parse_document(html);

    let title_selector = Selector::parse("title").unwrap();
    let title = document
        .select(&title_selector)
        .next()
        .map(|t| t.text().collect::<String>().trim().to_string())
        .unwrap_or_default();

    let text = document
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    (title, text)
}
