use crate::analyze::PageAnalysis;
use crate::inventory::{ApiRecord, ApiType};
use apiscout_scanner::result::PageCapture;
use chrono::Utc;
use scraper::{Html, Selector};
use url::Url;

const DOC_KEYWORDS: &[&str] = &[
    "documentation",
    "docs",
    "api reference",
    "getting started",
    "quickstart",
    "guide",
    "tutorial",
    "specification",
];

const SWAGGER_TOKENS: &[&str] = &[
    "swagger-ui",
    "swagger.json",
    "openapi.json",
    "openapi.yaml",
    "api-docs",
    "swagger",
    "openapi",
];

const DESCRIPTION_KEYWORDS: &[&str] = &["api", "psd2", "banking", "payment"];

/// Build one ApiRecord per detected type on a qualifying page.
pub fn extract_records(
    analysis: &PageAnalysis,
    page: &PageCapture,
    origin: &str,
) -> Vec<ApiRecord> {
    let host = Url::parse(origin)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_string()))
        .unwrap_or_else(|| origin.to_string());

    let documentation_url = find_documentation_url(&page.html, &page.url).unwrap_or_default();
    let swagger_url = find_swagger_url(&page.html, &page.url).unwrap_or_default();
    let discovered_at = Utc::now().to_rfc3339();

    analysis
        .api_types
        .iter()
        .map(|&api_type| ApiRecord {
            name: format!("{} - {}", host, api_type.as_str()),
            api_type,
            url: origin.to_string(),
            source_page: page.url.clone(),
            description: extract_description(page, api_type, &host),
            version: String::new(),
            documentation_url: documentation_url.clone(),
            swagger_url: swagger_url.clone(),
            sandbox_url: String::new(),
            production_url: String::new(),
            authentication: String::new(),
            discovered_at: discovered_at.clone(),
            confidence_score: analysis.relevance_score,
            keywords_found: analysis.keywords_found.clone(),
        })
        .collect()
}

/// Ordered description strategies; the first non-empty result wins.
pub fn extract_description(page: &PageCapture, api_type: ApiType, host: &str) -> String {
    meta_description(&page.html)
        .or_else(|| keyword_paragraph(&page.html))
        .or_else(|| keyword_sentence(&page.text))
        .or_else(|| {
            let title = page.title.trim();
            (!title.is_empty()).then(|| title.to_string())
        })
        .unwrap_or_else(|| {
            format!(
                "{} API from {} - PSD2 compliant banking API",
                api_type.as_str(),
                host
            )
        })
}

/// `<meta name="description">`, if present and non-empty.
pub fn meta_description(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(r#"meta[name="description"]"#).unwrap();

    document
        .select(&selector)
        .next()
        .and_then(|m| m.value().attr("content"))
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
}

/// First paragraph mentioning an API-relevant keyword and sized like a
/// real description (50-500 chars).
pub fn keyword_paragraph(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("p").unwrap();

    for paragraph in document.select(&selector) {
        let text = paragraph
            .text()
            .collect::<Vec<_>>()
            .join(" ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");

        if text.len() < 50 || text.len() > 500 {
            continue;
        }
        let lower = text.to_lowercase();
        if DESCRIPTION_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
            return Some(text);
        }
    }

    None
}

/// First sentence in the leading text that mentions a relevance keyword.
/// Only the first 20 sentences are scanned.
pub fn keyword_sentence(text: &str) -> Option<String> {
    for sentence in text.split(['.', '!', '?']).take(20) {
        let lower = sentence.to_lowercase();
        if DESCRIPTION_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
            let clean = sentence.split_whitespace().collect::<Vec<_>>().join(" ");
            if clean.len() > 20 {
                let mut truncated: String = clean.chars().take(300).collect();
                truncated.push_str("...");
                return Some(truncated);
            }
        }
    }

    None
}

/// First anchor whose text or href mentions a documentation token,
/// resolved against the page URL.
pub fn find_documentation_url(html: &str, page_url: &str) -> Option<String> {
    let base = Url::parse(page_url).ok()?;
    let document = Html::parse_document(html);
    let selector = Selector::parse("a[href]").unwrap();

    for anchor in document.select(&selector) {
        let href = anchor.value().attr("href")?;
        let text = anchor.text().collect::<String>().to_lowercase();
        let href_lower = href.to_lowercase();

        if DOC_KEYWORDS
            .iter()
            .any(|kw| text.contains(kw) || href_lower.contains(kw))
            && let Ok(resolved) = base.join(href)
        {
            return Some(resolved.to_string());
        }
    }

    None
}

/// Swagger/OpenAPI spec link: anchors first, then quoted attribute
/// values in the raw markup.
pub fn find_swagger_url(html: &str, page_url: &str) -> Option<String> {
    let base = Url::parse(page_url).ok()?;
    let document = Html::parse_document(html);
    let selector = Selector::parse("a[href]").unwrap();

    for anchor in document.select(&selector) {
        let href = anchor.value().attr("href")?;
        let text = anchor.text().collect::<String>().to_lowercase();
        let href_lower = href.to_lowercase();

        if (text.contains("swagger")
            || text.contains("openapi")
            || href_lower.contains("swagger")
            || href_lower.contains("openapi"))
            && let Ok(resolved) = base.join(href)
        {
            return Some(resolved.to_string());
        }
    }

    for candidate in quoted_values(html) {
        let lower = candidate.to_lowercase();
        if SWAGGER_TOKENS.iter().any(|t| lower.contains(t))
            && let Ok(resolved) = base.join(candidate)
        {
            return Some(resolved.to_string());
        }
    }

    None
}

/// Quoted substrings of the markup that could plausibly be URLs.
fn quoted_values(html: &str) -> impl Iterator<Item = &str> {
    html.split(['"', '\''])
        .skip(1)
        .step_by(2)
        .filter(|v| !v.is_empty() && v.len() < 512 && !v.contains(char::is_whitespace))
}
