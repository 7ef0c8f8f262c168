use crate::error::{Result, ScanError};
use crate::fetch::Fetcher;
use crate::links::{classify_hint, extract_links, is_api_like_url, normalize_host, LinkHint};
use crate::result::{PageCapture, SiteCrawl};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

pub type ProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;

/// A URL waiting to be visited, with the depth it was discovered at.
#[derive(Debug, Clone)]
pub struct FrontierEntry {
    pub url: Url,
    pub depth: usize,
    pub hint: LinkHint,
}

impl FrontierEntry {
    fn sort_key(&self) -> (bool, u8, usize) {
        (
            !is_api_like_url(self.url.as_str()),
            self.hint.priority(),
            self.depth,
        )
    }
}

/// Re-sort the pending frontier so API-looking URLs are visited first.
/// The sort is stable, so discovery order breaks remaining ties and the
/// traversal stays reproducible for the same input pages.
pub fn prioritize(frontier: &mut [FrontierEntry]) {
    frontier.sort_by_key(|entry| entry.sort_key());
}

/// Breadth-first crawler for a single site. All traversal state (visited
/// set, frontier, page counter) lives inside one `crawl` call, so a
/// crawler value can be reused across sites without leakage.
pub struct SiteCrawler {
    fetcher: Fetcher,
    max_depth: usize,
    max_pages: usize,
    wait: Duration,
    progress_callback: Option<ProgressCallback>,
    stop: Arc<AtomicBool>,
}

impl SiteCrawler {
    pub fn new(fetcher: Fetcher) -> Self {
        Self {
            fetcher,
            max_depth: 2,
            max_pages: 50,
            wait: Duration::ZERO,
            progress_callback: None,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_max_pages(mut self, pages: usize) -> Self {
        self.max_pages = pages;
        self
    }

    pub fn with_wait(mut self, wait: Duration) -> Self {
        self.wait = wait;
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Cooperative stop flag. When set, the crawl loop exits before the
    /// next fetch and the partial result is returned with `interrupted`.
    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = stop;
        self
    }

    pub async fn crawl(&self, start_url: &str) -> Result<SiteCrawl> {
        let seed = Url::parse(start_url)
            .map_err(|e| ScanError::InvalidUrl(format!("{}: {}", start_url, e)))?;
        let host = seed
            .host_str()
            .ok_or_else(|| ScanError::InvalidUrl(format!("{} has no host", start_url)))?;
        let base_host = normalize_host(host).to_string();
        let origin = seed.origin().ascii_serialization();

        info!("Starting crawl of {} (max {} pages)", start_url, self.max_pages);

        let mut visited: HashSet<String> = HashSet::new();
        let mut frontier = vec![FrontierEntry {
            url: seed,
            depth: 0,
            hint: LinkHint::Other,
        }];
        let mut pages = Vec::new();
        let mut pages_scanned = 0;
        let mut interrupted = false;

        while !frontier.is_empty() && pages_scanned < self.max_pages {
            if self.stop.load(Ordering::Relaxed) {
                interrupted = true;
                break;
            }

            prioritize(&mut frontier);
            let entry = frontier.remove(0);
            let url = entry.url.as_str().to_string();

            // Skipped entries never count against the page budget.
            if visited.contains(&url) || entry.depth > self.max_depth {
                continue;
            }

            visited.insert(url.clone());
            pages_scanned += 1;

            if let Some(ref callback) = self.progress_callback {
                callback(pages_scanned, url.clone());
            }

            let fetched = match self.fetcher.fetch(&url).await {
                Ok(f) => f,
                Err(e) => {
                    // One dead page never kills the site crawl.
                    warn!("Skipping {}: {}", url, e);
                    continue;
                }
            };

            let links = extract_links(&fetched.html, &entry.url, &base_host);
            debug!("{}: {} same-site links", url, links.len());

            if entry.depth < self.max_depth {
                for link in &links {
                    if visited.contains(link) {
                        continue;
                    }
                    if let Ok(parsed) = Url::parse(link) {
                        let hint = classify_hint(parsed.path());
                        frontier.push(FrontierEntry {
                            url: parsed,
                            depth: entry.depth + 1,
                            hint,
                        });
                    }
                }
            }

            pages.push(PageCapture {
                url,
                depth: entry.depth,
                status_code: fetched.status_code,
                content_type: fetched.content_type,
                title: fetched.title,
                text: fetched.text,
                html: fetched.html,
                links_found: links,
            });

            if !self.wait.is_zero() && !frontier.is_empty() {
                tokio::time::sleep(self.wait).await;
            }
        }

        if self.stop.load(Ordering::Relaxed) {
            interrupted = true;
        }

        info!(
            "Crawl of {} finished: {} pages scanned",
            start_url, pages_scanned
        );

        Ok(SiteCrawl {
            start_url: start_url.to_string(),
            origin,
            pages,
            pages_scanned,
            interrupted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_html(server: &MockServer, route: &str, body: String) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_string(body),
            )
            .mount(server)
            .await;
    }

    fn crawler(max_depth: usize, max_pages: usize) -> SiteCrawler {
        SiteCrawler::new(Fetcher::new(5).unwrap())
            .with_max_depth(max_depth)
            .with_max_pages(max_pages)
    }

    #[tokio::test]
    async fn test_crawl_visits_linked_pages() {
        let server = MockServer::start().await;
        let root = format!(
            r#"<html><body>
                <a href="{0}/page1">One</a>
                <a href="{0}/page2">Two</a>
            </body></html>"#,
            server.uri()
        );
        mount_html(&server, "/", root).await;
        mount_html(&server, "/page1", "<html><body>P1</body></html>".into()).await;
        mount_html(&server, "/page2", "<html><body>P2</body></html>".into()).await;

        let crawl = crawler(2, 50).crawl(&server.uri()).await.unwrap();

        assert_eq!(crawl.pages_scanned, 3);
        assert_eq!(crawl.pages.len(), 3);
        assert!(!crawl.interrupted);
    }

    #[tokio::test]
    async fn test_page_budget_is_respected() {
        let server = MockServer::start().await;
        let mut root = String::from("<html><body>");
        for i in 1..=10 {
            root.push_str(&format!(r#"<a href="{}/page{}">P</a>"#, server.uri(), i));
        }
        root.push_str("</body></html>");
        mount_html(&server, "/", root).await;
        for i in 1..=10 {
            mount_html(
                &server,
                &format!("/page{}", i),
                "<html><body>leaf</body></html>".into(),
            )
            .await;
        }

        let crawl = crawler(2, 4).crawl(&server.uri()).await.unwrap();

        assert_eq!(crawl.pages_scanned, 4);
        assert!(crawl.pages.len() <= 4);
    }

    #[tokio::test]
    async fn test_depth_limit_is_respected() {
        let server = MockServer::start().await;
        mount_html(
            &server,
            "/",
            format!(r#"<html><body><a href="{}/a">a</a></body></html>"#, server.uri()),
        )
        .await;
        mount_html(
            &server,
            "/a",
            format!(r#"<html><body><a href="{}/b">b</a></body></html>"#, server.uri()),
        )
        .await;
        mount_html(&server, "/b", "<html><body>deep</body></html>".into()).await;

        // max_depth 1: seed (0) and /a (1) are visited, /b (2) is not even enqueued.
        let crawl = crawler(1, 50).crawl(&server.uri()).await.unwrap();

        assert_eq!(crawl.pages_scanned, 2);
        assert!(crawl.pages.iter().all(|p| p.depth <= 1));
        assert!(!crawl.pages.iter().any(|p| p.url.ends_with("/b")));
    }

    #[tokio::test]
    async fn test_api_links_are_visited_first() {
        let server = MockServer::start().await;
        let root = format!(
            r#"<html><body>
                <a href="{0}/news">News</a>
                <a href="{0}/careers">Careers</a>
                <a href="{0}/developer/apis">APIs</a>
            </body></html>"#,
            server.uri()
        );
        mount_html(&server, "/", root).await;
        mount_html(&server, "/news", "<html><body>news</body></html>".into()).await;
        mount_html(&server, "/careers", "<html><body>jobs</body></html>".into()).await;
        mount_html(
            &server,
            "/developer/apis",
            "<html><body>apis</body></html>".into(),
        )
        .await;

        // Budget of 2 only leaves room for the seed plus one link; the
        // API-looking one must win.
        let crawl = crawler(2, 2).crawl(&server.uri()).await.unwrap();

        assert_eq!(crawl.pages_scanned, 2);
        assert!(crawl.pages[1].url.ends_with("/developer/apis"));
    }

    #[tokio::test]
    async fn test_fetch_failure_is_not_fatal() {
        let server = MockServer::start().await;
        let root = format!(
            r#"<html><body>
                <a href="{0}/missing">Missing</a>
                <a href="{0}/alive">Alive</a>
            </body></html>"#,
            server.uri()
        );
        mount_html(&server, "/", root).await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        mount_html(&server, "/alive", "<html><body>ok</body></html>".into()).await;

        let crawl = crawler(2, 50).crawl(&server.uri()).await.unwrap();

        // The dead page consumed budget but produced no capture.
        assert_eq!(crawl.pages_scanned, 3);
        assert_eq!(crawl.pages.len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_seed_is_an_error() {
        let crawler = crawler(2, 50);
        let result = crawler.crawl("not a url").await;
        assert!(matches!(result, Err(ScanError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_stop_flag_interrupts() {
        let server = MockServer::start().await;
        mount_html(&server, "/", "<html><body>root</body></html>".into()).await;

        let stop = Arc::new(AtomicBool::new(true));
        let crawler = SiteCrawler::new(Fetcher::new(5).unwrap()).with_stop_flag(stop);
        let crawl = crawler.crawl(&server.uri()).await.unwrap();

        assert!(crawl.interrupted);
        assert_eq!(crawl.pages_scanned, 0);
    }

    #[test]
    fn test_prioritize_is_stable_for_equal_keys() {
        let mk = |u: &str| FrontierEntry {
            url: Url::parse(u).unwrap(),
            depth: 1,
            hint: LinkHint::Other,
        };
        let mut frontier = vec![
            mk("https://bank.example/one"),
            mk("https://bank.example/two"),
            mk("https://bank.example/api"),
        ];
        prioritize(&mut frontier);

        assert_eq!(frontier[0].url.as_str(), "https://bank.example/api");
        assert_eq!(frontier[1].url.as_str(), "https://bank.example/one");
        assert_eq!(frontier[2].url.as_str(), "https://bank.example/two");
    }
}
