use serde::{Deserialize, Serialize};

/// One fetched and parsed page, as handed to the analysis layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageCapture {
    pub url: String,
    pub depth: usize,
    pub status_code: u16,
    pub content_type: Option<String>,
    pub title: String,
    pub text: String,
    pub html: String,
    pub links_found: Vec<String>,
}

impl PageCapture {
    pub fn new(url: String, depth: usize) -> Self {
        Self {
            url,
            depth,
            status_code: 0,
            content_type: None,
            title: String::new(),
            text: String::new(),
            html: String::new(),
            links_found: Vec::new(),
        }
    }
}

/// Everything collected while crawling a single site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteCrawl {
    pub start_url: String,
    /// Scheme + host (+ non-default port) of the seed, e.g. `https://bank.example`.
    pub origin: String,
    pub pages: Vec<PageCapture>,
    pub pages_scanned: usize,
    /// Set when the crawl was cut short by the stop flag.
    pub interrupted: bool,
}
