use crate::analyze::{analyze_page, KeywordTaxonomy};
use crate::extract::extract_records;
use crate::inventory::{
    dedup, sort_by_confidence, ApiRecord, ApiRelatedPage, LogType, ScanLog, ScanStatus,
    SiteScanResult,
};
use apiscout_scanner::{FetchStrategy, Fetcher, SiteCrawler};
use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Options for configuring a discovery run
pub struct DiscoveryOptions {
    pub urls: Vec<String>,
    pub max_depth: usize,
    pub max_pages: usize,
    pub timeout_secs: u64,
    pub wait_ms: u64,
    pub extra_keywords: BTreeMap<String, Vec<String>>,
    pub fetch_strategies: Vec<FetchStrategy>,
    pub show_progress_bars: bool,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            urls: Vec::new(),
            max_depth: 2,
            max_pages: 50,
            timeout_secs: 10,
            wait_ms: 0,
            extra_keywords: BTreeMap::new(),
            fetch_strategies: vec![FetchStrategy::Direct],
            show_progress_bars: false,
        }
    }
}

/// Callback for reporting discovery progress
pub type DiscoveryProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Aggregated outcome of one discovery run across all seed URLs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryReport {
    pub total_apis_found: usize,
    pub apis: Vec<ApiRecord>,
    pub scan_results: Vec<SiteScanResult>,
    pub scan_timestamp: String,
}

/// A discovery report together with its scan log.
#[derive(Debug, Clone)]
pub struct DiscoveryOutcome {
    pub report: DiscoveryReport,
    pub log: ScanLog,
}

/// Scan every seed URL in order and collect the deduplicated API
/// inventory. Site failures become error-status results; only fetcher
/// construction failure aborts the whole run.
pub async fn execute_discovery(
    options: DiscoveryOptions,
    progress_callback: Option<DiscoveryProgressCallback>,
    stop: Option<Arc<AtomicBool>>,
) -> Result<DiscoveryOutcome, String> {
    let DiscoveryOptions {
        urls,
        max_depth,
        max_pages,
        timeout_secs,
        wait_ms,
        extra_keywords,
        fetch_strategies,
        show_progress_bars,
    } = options;

    let taxonomy = KeywordTaxonomy::new().with_extra(&extra_keywords);
    let stop = stop.unwrap_or_else(|| Arc::new(AtomicBool::new(false)));

    let mut log = ScanLog::new();
    log.urls_scanned = urls.len();

    let progress_bar = if show_progress_bars {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap(),
        );
        pb.set_message("Starting discovery...");
        Some(pb)
    } else {
        None
    };

    let mut all_apis: Vec<ApiRecord> = Vec::new();
    let mut scan_results = Vec::new();

    for (idx, url) in urls.iter().enumerate() {
        if let Some(ref callback) = progress_callback
            && urls.len() > 1
        {
            callback(format!("Scanning site {}/{}: {}", idx + 1, urls.len(), url));
        }
        log.push(LogType::Info, format!("Scanning {}...", url));

        // Fetcher construction failure is the one unrecoverable setup
        // error: without an HTTP client nothing else can proceed.
        let fetcher = Fetcher::new(timeout_secs)
            .map_err(|e| format!("Failed to set up fetcher: {}", e))?
            .with_strategies(fetch_strategies.clone());

        let pb_clone = progress_bar.clone();
        let crawler = SiteCrawler::new(fetcher)
            .with_max_depth(max_depth)
            .with_max_pages(max_pages)
            .with_wait(Duration::from_millis(wait_ms))
            .with_stop_flag(stop.clone())
            .with_progress_callback(Arc::new(move |count, page_url| {
                if let Some(ref pb) = pb_clone {
                    pb.set_message(format!("[{}] {}", count, page_url));
                    pb.tick();
                }
            }));

        let result = match crawler.crawl(url).await {
            Ok(crawl) => scan_site(&taxonomy, url, crawl, &mut log),
            Err(e) => {
                warn!("Failed to scan {}: {}", url, e);
                log.push(LogType::Error, format!("Error scanning {}: {}", url, e));
                SiteScanResult::error(url.clone(), e.to_string())
            }
        };

        all_apis.extend(result.apis.iter().cloned());
        scan_results.push(result);
    }

    if let Some(ref pb) = progress_bar {
        pb.finish_with_message("Discovery complete");
    }

    let mut apis = dedup(all_apis);
    sort_by_confidence(&mut apis);

    log.total_apis_found = apis.len();
    log.push(
        LogType::Info,
        format!("Discovery finished: {} unique APIs", apis.len()),
    );

    Ok(DiscoveryOutcome {
        report: DiscoveryReport {
            total_apis_found: apis.len(),
            apis,
            scan_results,
            scan_timestamp: Utc::now().to_rfc3339(),
        },
        log,
    })
}

/// Turn one site crawl into a scan result: score each captured page,
/// extract records from the qualifying ones, dedup within the site.
fn scan_site(
    taxonomy: &KeywordTaxonomy,
    url: &str,
    crawl: apiscout_scanner::SiteCrawl,
    log: &mut ScanLog,
) -> SiteScanResult {
    let mut api_related_pages = Vec::new();
    let mut apis = Vec::new();

    for page in &crawl.pages {
        let analysis = analyze_page(taxonomy, &page.text, &page.url, &page.title);

        if analysis.is_api_related {
            api_related_pages.push(ApiRelatedPage {
                url: page.url.clone(),
                relevance_score: analysis.relevance_score,
                keywords: analysis.keywords_found.clone(),
            });
            apis.extend(extract_records(&analysis, page, &crawl.origin));
        }
    }

    let apis = dedup(apis);
    log.push(
        LogType::Info,
        format!(
            "{}: {} pages scanned, {} APIs found",
            url,
            crawl.pages_scanned,
            apis.len()
        ),
    );

    if crawl.interrupted {
        // Partial findings survive an interrupt, but the site is marked
        // failed so a later run rescans it.
        log.push(LogType::Warning, format!("Scan of {} interrupted", url));
        return SiteScanResult {
            url: url.to_string(),
            status: ScanStatus::Error,
            error: Some("scan interrupted".to_string()),
            pages_scanned: crawl.pages_scanned,
            api_related_pages,
            apis,
        };
    }

    SiteScanResult {
        url: url.to_string(),
        status: ScanStatus::Success,
        error: None,
        pages_scanned: crawl.pages_scanned,
        api_related_pages,
        apis,
    }
}
