use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Crawl budgets and pacing. Field names match the JSON config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScanOptions {
    /// Maximum link depth from each seed URL.
    pub max_depth: usize,
    /// Page budget per site.
    pub max_pages_per_site: usize,
    /// Per-request timeout in seconds.
    pub timeout: u64,
    /// Delay between page fetches in milliseconds.
    pub wait_time: u64,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            max_depth: 2,
            max_pages_per_site: 50,
            timeout: 10,
            wait_time: 0,
        }
    }
}

/// A scan configuration file: seed URLs, optional extra keywords per
/// category, and crawl options.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub urls: Vec<String>,
    pub keywords: BTreeMap<String, Vec<String>>,
    pub options: ScanOptions,
}

impl ScanConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config {}: {}", path.display(), e))?;
        let config: ScanConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("failed to parse config {}: {}", path.display(), e))?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
