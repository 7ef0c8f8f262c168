// Report and export generation from discovery results

use crate::discover::DiscoveryReport;
use crate::inventory::{ApiRecord, ScanStatus};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
    Csv,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            "csv" => Some(ReportFormat::Csv),
            _ => None,
        }
    }
}

const CSV_HEADER: &str = "name,api_type,url,source_page,description,documentation_url,\
swagger_url,confidence_score,discovered_at,keywords_found";

pub fn generate_text_report(report: &DiscoveryReport) -> String {
    let mut out = String::new();

    out.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    out.push_str("                      APISCOUT PSD2 API DISCOVERY REPORT\n");
    out.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    out.push_str(&format!("Scan Date:    {}\n", report.scan_timestamp));
    out.push_str(&format!("Sites:        {}\n", report.scan_results.len()));
    out.push_str(&format!("APIs Found:   {}\n\n", report.total_apis_found));

    out.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    out.push_str("SITES\n");
    out.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    for result in &report.scan_results {
        match result.status {
            ScanStatus::Success => {
                out.push_str(&format!("  [OK]    {}\n", result.url));
                out.push_str(&format!(
                    "          {} pages scanned, {} API-related, {} APIs\n",
                    result.pages_scanned,
                    result.api_related_pages.len(),
                    result.apis.len()
                ));
            }
            ScanStatus::Error => {
                out.push_str(&format!("  [FAIL]  {}\n", result.url));
                if let Some(ref error) = result.error {
                    out.push_str(&format!("          {}\n", error));
                }
            }
        }
    }
    out.push('\n');

    if !report.apis.is_empty() {
        out.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
        out.push_str("DISCOVERED APIS\n");
        out.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

        for (idx, api) in report.apis.iter().enumerate() {
            out.push_str(&format!("[{}] {}\n", idx + 1, api.name));
            out.push_str(&format!("Type:         {}\n", api.api_type.as_str()));
            out.push_str(&format!("Confidence:   {:.2}\n", api.confidence_score));
            out.push_str(&format!("Source:       {}\n", api.source_page));

            if !api.documentation_url.is_empty() {
                out.push_str(&format!("Docs:         {}\n", api.documentation_url));
            }
            if !api.swagger_url.is_empty() {
                out.push_str(&format!("Swagger:      {}\n", api.swagger_url));
            }

            if !api.description.is_empty() {
                out.push_str("\nDescription:\n");
                out.push_str(&wrap_text(&api.description, 80, "  "));
            }

            out.push_str("\n────────────────────────────────────────────────────────────────────────────────\n\n");
        }
    }

    out.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    out.push_str("                          End of Report\n");
    out.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    out.push_str("\nGenerated by ApiScout - best-effort PSD2 API discovery\n\n");

    out
}

pub fn generate_json_report(report: &DiscoveryReport) -> Result<String, serde_json::Error> {
    let json_report = serde_json::json!({
        "report": {
            "metadata": {
                "generator": "ApiScout",
                "version": env!("CARGO_PKG_VERSION"),
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "format": "json"
            },
            "summary": {
                "sites_scanned": report.scan_results.len(),
                "total_apis_found": report.total_apis_found,
                "scan_timestamp": report.scan_timestamp
            },
            "scan_results": report.scan_results,
            "apis": report.apis
        }
    });

    serde_json::to_string_pretty(&json_report)
}

/// Pretty JSON array of records, the shape the export endpoint offered.
pub fn generate_json_export(records: &[ApiRecord]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(records)
}

/// CSV export. Array-valued fields are joined with `"; "`; every value
/// is quoted and embedded quotes are doubled per RFC 4180.
pub fn generate_csv_export(records: &[ApiRecord]) -> String {
    let mut out = String::new();
    out.push_str(CSV_HEADER);
    out.push('\n');

    for record in records {
        let fields = [
            record.name.clone(),
            record.api_type.as_str().to_string(),
            record.url.clone(),
            record.source_page.clone(),
            record.description.clone(),
            record.documentation_url.clone(),
            record.swagger_url.clone(),
            format!("{}", record.confidence_score),
            record.discovered_at.clone(),
            record.keywords_found.join("; "),
        ];

        let row = fields
            .iter()
            .map(|f| csv_escape(f))
            .collect::<Vec<_>>()
            .join(",");
        out.push_str(&row);
        out.push('\n');
    }

    out
}

fn csv_escape(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

fn wrap_text(text: &str, width: usize, indent: &str) -> String {
    let mut result = String::new();
    let mut current_line = String::new();

    for word in text.split_whitespace() {
        if current_line.len() + word.len() + 1 > width - indent.len() {
            if !current_line.is_empty() {
                result.push_str(indent);
                result.push_str(&current_line);
                result.push('\n');
                current_line.clear();
            }
        }

        if !current_line.is_empty() {
            current_line.push(' ');
        }
        current_line.push_str(word);
    }

    if !current_line.is_empty() {
        result.push_str(indent);
        result.push_str(&current_line);
        result.push('\n');
    }

    result
}
