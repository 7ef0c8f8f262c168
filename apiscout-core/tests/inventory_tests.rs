// Tests for record deduplication, merging and the inventory document

use apiscout_core::inventory::{
    dedup, merge, ApiRecord, ApiType, Inventory, LogType, ScanLog, ScanStatus, SiteScanResult,
};
use tempfile::TempDir;

fn record(url: &str, api_type: ApiType, confidence: f64) -> ApiRecord {
    ApiRecord {
        name: format!("{} - {}", url, api_type.as_str()),
        api_type,
        url: url.to_string(),
        source_page: format!("{}/developer", url),
        description: "test".to_string(),
        version: String::new(),
        documentation_url: String::new(),
        swagger_url: String::new(),
        sandbox_url: String::new(),
        production_url: String::new(),
        authentication: String::new(),
        discovered_at: "2025-01-01T00:00:00Z".to_string(),
        confidence_score: confidence,
        keywords_found: vec!["general:psd2".to_string()],
    }
}

// ============================================================================
// Dedup Tests
// ============================================================================

#[test]
fn test_dedup_removes_same_key() {
    let records = vec![
        record("https://bank.example", ApiType::Ais, 0.5),
        record("https://bank.example", ApiType::Ais, 0.9),
    ];

    let unique = dedup(records);
    assert_eq!(unique.len(), 1);
    // First occurrence wins within a run
    assert_eq!(unique[0].confidence_score, 0.5);
}

#[test]
fn test_dedup_keeps_distinct_types() {
    let records = vec![
        record("https://bank.example", ApiType::Ais, 0.5),
        record("https://bank.example", ApiType::Pis, 0.5),
    ];

    assert_eq!(dedup(records).len(), 2);
}

#[test]
fn test_dedup_keeps_distinct_sites() {
    let records = vec![
        record("https://bank.example", ApiType::Ais, 0.5),
        record("https://other.example", ApiType::Ais, 0.5),
    ];

    assert_eq!(dedup(records).len(), 2);
}

// ============================================================================
// Merge Tests
// ============================================================================

#[test]
fn test_merge_keeps_higher_confidence() {
    let existing = vec![record("https://bank.example", ApiType::Ais, 0.4)];
    let incoming = vec![record("https://bank.example", ApiType::Ais, 0.8)];

    let merged = merge(existing, incoming);
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].confidence_score, 0.8);
}

#[test]
fn test_merge_lower_confidence_does_not_overwrite() {
    let existing = vec![record("https://bank.example", ApiType::Ais, 0.8)];
    let incoming = vec![record("https://bank.example", ApiType::Ais, 0.4)];

    let merged = merge(existing, incoming);
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].confidence_score, 0.8);
}

#[test]
fn test_merge_with_itself_is_identity() {
    let records = vec![
        record("https://bank.example", ApiType::Ais, 0.7),
        record("https://bank.example", ApiType::Pis, 0.5),
        record("https://other.example", ApiType::Psd2, 0.3),
    ];

    let merged = merge(records.clone(), records.clone());
    assert_eq!(merged.len(), records.len());

    let again = merge(merged.clone(), records);
    assert_eq!(again.len(), merged.len());
}

#[test]
fn test_merge_sorts_by_confidence_descending() {
    let merged = merge(
        vec![
            record("https://low.example", ApiType::Ais, 0.2),
            record("https://high.example", ApiType::Ais, 0.9),
        ],
        vec![record("https://mid.example", ApiType::Ais, 0.5)],
    );

    let scores: Vec<f64> = merged.iter().map(|r| r.confidence_score).collect();
    assert_eq!(scores, vec![0.9, 0.5, 0.2]);
}

// ============================================================================
// Inventory Document Tests
// ============================================================================

#[test]
fn test_inventory_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("api_inventory.json");

    let mut inventory = Inventory::new();
    inventory.absorb(
        vec![SiteScanResult {
            url: "https://bank.example".to_string(),
            status: ScanStatus::Success,
            error: None,
            pages_scanned: 3,
            api_related_pages: Vec::new(),
            apis: Vec::new(),
        }],
        vec![record("https://bank.example", ApiType::Ais, 0.6)],
    );
    inventory.save(&path).unwrap();

    let loaded = Inventory::load(&path).unwrap();
    assert_eq!(loaded.total_apis, 1);
    assert_eq!(loaded.scan_results.len(), 1);
    assert_eq!(loaded.apis[0].api_type, ApiType::Ais);
}

#[test]
fn test_inventory_absorb_merges_across_runs() {
    let mut inventory = Inventory::new();
    inventory.absorb(
        Vec::new(),
        vec![record("https://bank.example", ApiType::Ais, 0.4)],
    );
    inventory.absorb(
        Vec::new(),
        vec![
            record("https://bank.example", ApiType::Ais, 0.8),
            record("https://bank.example", ApiType::Pis, 0.5),
        ],
    );

    assert_eq!(inventory.total_apis, 2);
    let ais = inventory
        .apis
        .iter()
        .find(|a| a.api_type == ApiType::Ais)
        .unwrap();
    assert_eq!(ais.confidence_score, 0.8);
}

#[test]
fn test_inventory_json_uses_camel_case_top_level() {
    let inventory = Inventory::new();
    let json = serde_json::to_string(&inventory).unwrap();

    assert!(json.contains("\"lastUpdated\""));
    assert!(json.contains("\"totalApis\""));
    assert!(json.contains("\"scanResults\""));
}

#[test]
fn test_api_type_serializes_uppercase() {
    let json = serde_json::to_string(&ApiType::Ais).unwrap();
    assert_eq!(json, "\"AIS\"");

    let parsed: ApiType = serde_json::from_str("\"PSD2\"").unwrap();
    assert_eq!(parsed, ApiType::Psd2);
}

#[test]
fn test_record_json_field_names() {
    let json = serde_json::to_string(&record("https://bank.example", ApiType::Caf, 0.5)).unwrap();

    assert!(json.contains("\"api_type\":\"CAF\""));
    assert!(json.contains("\"source_page\""));
    assert!(json.contains("\"confidence_score\""));
    assert!(json.contains("\"keywords_found\""));
}

// ============================================================================
// Scan Log Tests
// ============================================================================

#[test]
fn test_scan_log_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("scan_log.json");

    let mut log = ScanLog::new();
    log.urls_scanned = 2;
    log.push(LogType::Info, "Scanning https://bank.example...");
    log.push(LogType::Error, "Error scanning https://dead.example");
    log.save(&path).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("\"scanDate\""));
    assert!(content.contains("\"urlsScanned\""));
    assert!(content.contains("\"totalApisFound\""));
    assert!(content.contains("\"type\": \"error\""));
}
