use scraper::{Html, Selector};
use std::collections::HashSet;
use tracing::trace;
use url::Url;

/// Path fragments that usually mark API/developer-portal pages.
pub const API_URL_PATTERNS: &[&str] = &[
    "/api",
    "/developer",
    "/openbanking",
    "/psd2",
    "/portal",
    "/documentation",
    "/docs",
    "/swagger",
    "/sandbox",
    "/tpp",
    "/xs2a",
    "/oauth",
];

// Non-document resources are never worth a fetch.
const SKIPPED_EXTENSIONS: &[&str] = &[
    ".pdf", ".zip", ".png", ".jpg", ".jpeg", ".gif", ".css", ".js", ".svg", ".ico", ".woff",
    ".woff2", ".mp4", ".webm", ".webp", ".doc", ".docx", ".xls", ".xlsx",
];

/// Rough guess at what kind of page a link leads to, used to order the
/// frontier when URL patterns alone don't decide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkHint {
    Listing,
    Detail,
    Documentation,
    Other,
}

impl LinkHint {
    /// Lower sorts first.
    pub fn priority(self) -> u8 {
        match self {
            LinkHint::Listing => 0,
            LinkHint::Detail => 1,
            LinkHint::Documentation => 2,
            LinkHint::Other => 3,
        }
    }
}

pub fn classify_hint(path: &str) -> LinkHint {
    let path = path.to_lowercase();

    if ["apis", "catalog", "products", "portal"]
        .iter()
        .any(|p| path.contains(p))
    {
        LinkHint::Listing
    } else if ["/api", "swagger", "sandbox"].iter().any(|p| path.contains(p)) {
        LinkHint::Detail
    } else if ["docs", "documentation", "guide", "reference", "specification"]
        .iter()
        .any(|p| path.contains(p))
    {
        LinkHint::Documentation
    } else {
        LinkHint::Other
    }
}

/// True when the URL looks like it belongs to an API/developer section.
pub fn is_api_like_url(url: &str) -> bool {
    let lower = url.to_lowercase();
    API_URL_PATTERNS.iter().any(|p| lower.contains(p))
}

/// Hostname with a single leading `www.` stripped. Site equality is
/// decided on this form for the whole crawl.
pub fn normalize_host(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

pub fn is_same_site(url: &Url, base_host: &str) -> bool {
    url.host_str()
        .map(|h| normalize_host(h) == base_host)
        .unwrap_or(false)
}

/// Resolve an href against the current page, dropping fragments and
/// anything that is not a plain document link. Malformed hrefs resolve
/// to None and are discarded silently.
pub fn resolve_link(base: &Url, href: &str) -> Option<Url> {
    if href.is_empty()
        || href.starts_with('#')
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
    {
        return None;
    }

    let mut resolved = base.join(href).ok()?;
    resolved.set_fragment(None);

    let path = resolved.path().to_lowercase();
    if SKIPPED_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
        return None;
    }

    Some(resolved)
}

/// Extract all same-site document links from a page, deduplicated in
/// first-seen order.
pub fn extract_links(html: &str, page_url: &Url, base_host: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("a[href]").unwrap();

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for element in document.select(&selector) {
        if let Some(href) = element.value().attr("href")
            && let Some(resolved) = resolve_link(page_url, href)
        {
            if !is_same_site(&resolved, base_host) {
                trace!("Skipping cross-site link {}", resolved);
                continue;
            }
            let link = resolved.to_string();
            if seen.insert(link.clone()) {
                links.push(link);
            }
        }
    }

    links
}
