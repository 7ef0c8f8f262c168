use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// PSD2 API families. `Psd2` marks a portal with open-banking evidence
/// that names no specific service; `Unknown` is a stored record whose
/// type could not be read back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApiType {
    #[serde(rename = "AIS")]
    Ais,
    #[serde(rename = "PIS")]
    Pis,
    #[serde(rename = "CAF")]
    Caf,
    #[serde(rename = "PSD2")]
    Psd2,
    #[serde(rename = "Unknown")]
    Unknown,
}

impl ApiType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiType::Ais => "AIS",
            ApiType::Pis => "PIS",
            ApiType::Caf => "CAF",
            ApiType::Psd2 => "PSD2",
            ApiType::Unknown => "Unknown",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "AIS" => ApiType::Ais,
            "PIS" => ApiType::Pis,
            "CAF" => ApiType::Caf,
            "PSD2" => ApiType::Psd2,
            _ => ApiType::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Success,
    Error,
}

/// One discovered API offering. Immutable once created; a merge may
/// replace it wholesale with a higher-confidence duplicate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiRecord {
    pub name: String,
    pub api_type: ApiType,
    /// Site origin the API belongs to, e.g. `https://bank.example`.
    pub url: String,
    /// Page the evidence was found on.
    pub source_page: String,
    pub description: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub documentation_url: String,
    #[serde(default)]
    pub swagger_url: String,
    #[serde(default)]
    pub sandbox_url: String,
    #[serde(default)]
    pub production_url: String,
    #[serde(default)]
    pub authentication: String,
    pub discovered_at: String,
    pub confidence_score: f64,
    pub keywords_found: Vec<String>,
}

impl ApiRecord {
    /// Identity under deduplication: site origin plus API type. Stable
    /// for the lifetime of a dataset.
    pub fn dedup_key(&self) -> (String, ApiType) {
        (self.url.clone(), self.api_type)
    }
}

/// A page that scored above the relevance threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRelatedPage {
    pub url: String,
    pub relevance_score: f64,
    pub keywords: Vec<String>,
}

/// Outcome for one seed URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteScanResult {
    pub url: String,
    pub status: ScanStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub pages_scanned: usize,
    pub api_related_pages: Vec<ApiRelatedPage>,
    pub apis: Vec<ApiRecord>,
}

impl SiteScanResult {
    pub fn error(url: String, error: String) -> Self {
        Self {
            url,
            status: ScanStatus::Error,
            error: Some(error),
            pages_scanned: 0,
            api_related_pages: Vec::new(),
            apis: Vec::new(),
        }
    }
}

/// Drop duplicate records within one run, keeping the first occurrence.
/// The crawl visits high-priority pages first, so the survivor is the
/// record from the most API-relevant page.
pub fn dedup(records: Vec<ApiRecord>) -> Vec<ApiRecord> {
    let mut seen: HashMap<(String, ApiType), ()> = HashMap::new();
    let mut unique = Vec::new();

    for record in records {
        if seen.insert(record.dedup_key(), ()).is_none() {
            unique.push(record);
        }
    }

    unique
}

/// Merge two record sets. Shared keys keep the higher-confidence record;
/// the result is sorted by confidence descending for presentation.
pub fn merge(existing: Vec<ApiRecord>, incoming: Vec<ApiRecord>) -> Vec<ApiRecord> {
    let mut by_key: Vec<ApiRecord> = Vec::new();
    let mut index: HashMap<(String, ApiType), usize> = HashMap::new();

    for record in existing.into_iter().chain(incoming) {
        match index.get(&record.dedup_key()) {
            Some(&i) => {
                if record.confidence_score > by_key[i].confidence_score {
                    by_key[i] = record;
                }
            }
            None => {
                index.insert(record.dedup_key(), by_key.len());
                by_key.push(record);
            }
        }
    }

    sort_by_confidence(&mut by_key);
    by_key
}

pub fn sort_by_confidence(records: &mut [ApiRecord]) {
    records.sort_by(|a, b| {
        b.confidence_score
            .partial_cmp(&a.confidence_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.url.cmp(&b.url))
            .then_with(|| a.api_type.as_str().cmp(b.api_type.as_str()))
    });
}

/// The persisted inventory document. Written after every scan and read
/// back to merge new findings into an existing dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inventory {
    pub last_updated: String,
    pub total_apis: usize,
    pub scan_results: Vec<SiteScanResult>,
    pub apis: Vec<ApiRecord>,
}

impl Inventory {
    pub fn new() -> Self {
        Self {
            last_updated: Utc::now().to_rfc3339(),
            total_apis: 0,
            scan_results: Vec::new(),
            apis: Vec::new(),
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Fold a scan's records into the stored dataset and refresh the
    /// bookkeeping fields. Scan results are appended, not merged: they
    /// are a history, not an index.
    pub fn absorb(&mut self, scan_results: Vec<SiteScanResult>, apis: Vec<ApiRecord>) {
        self.apis = merge(std::mem::take(&mut self.apis), apis);
        self.scan_results.extend(scan_results);
        self.total_apis = self.apis.len();
        self.last_updated = Utc::now().to_rfc3339();
    }
}

impl Default for Inventory {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogType {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: LogType,
}

/// The scan log document, one per discovery run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanLog {
    pub scan_date: String,
    pub urls_scanned: usize,
    pub total_apis_found: usize,
    pub logs: Vec<LogEntry>,
}

impl ScanLog {
    pub fn new() -> Self {
        Self {
            scan_date: Utc::now().to_rfc3339(),
            urls_scanned: 0,
            total_apis_found: 0,
            logs: Vec::new(),
        }
    }

    pub fn push(&mut self, kind: LogType, message: impl Into<String>) {
        self.logs.push(LogEntry {
            timestamp: Utc::now().to_rfc3339(),
            message: message.into(),
            kind,
        });
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

impl Default for ScanLog {
    fn default() -> Self {
        Self::new()
    }
}
