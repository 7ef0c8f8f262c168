// Tests for the SQLite scan history

use apiscout_core::data::Database;
use apiscout_core::inventory::{ApiRecord, ApiType, ScanStatus, SiteScanResult};
use tempfile::TempDir;

fn create_test_db() -> (TempDir, Database) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let db = Database::new(&db_path).unwrap();
    (temp_dir, db)
}

fn record(url: &str, api_type: ApiType, confidence: f64) -> ApiRecord {
    ApiRecord {
        name: format!("{} - {}", url, api_type.as_str()),
        api_type,
        url: url.to_string(),
        source_page: format!("{}/developer", url),
        description: "stored".to_string(),
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
// Database Creation Tests
// ============================================================================

#[test]
fn test_database_creation() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");

    let db = Database::new(&db_path);
    assert!(db.is_ok());
    assert!(db_path.exists());
}

#[test]
fn test_database_exists_and_drop() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");

    assert!(!Database::exists(&db_path));
    let _db = Database::new(&db_path).unwrap();
    assert!(Database::exists(&db_path));

    Database::drop(&db_path);
    assert!(!Database::exists(&db_path));
}

// ============================================================================
// Session Tests
// ============================================================================

#[test]
fn test_create_session() {
    let (_temp_dir, db) = create_test_db();

    let session_id = db.create_session("[\"https://bank.example\"]").unwrap();
    assert!(!session_id.is_empty());
}

#[test]
fn test_sessions_are_distinct() {
    let (_temp_dir, db) = create_test_db();

    let first = db.create_session("[\"https://a.example\"]").unwrap();
    let second = db.create_session("[\"https://b.example\"]").unwrap();
    assert_ne!(first, second);
}

#[test]
fn test_complete_and_fail_session() {
    let (_temp_dir, db) = create_test_db();

    let session_id = db.create_session("[\"https://bank.example\"]").unwrap();
    assert!(db.complete_session(&session_id).is_ok());

    let other = db.create_session("[\"https://bank.example\"]").unwrap();
    assert!(db.fail_session(&other).is_ok());
}

// ============================================================================
// Record Upsert Tests
// ============================================================================

#[test]
fn test_upsert_inserts_new_record() {
    let (_temp_dir, db) = create_test_db();
    let session = db.create_session("[]").unwrap();

    db.upsert_record(&session, &record("https://bank.example", ApiType::Ais, 0.5))
        .unwrap();

    assert_eq!(db.count_records().unwrap(), 1);
}

#[test]
fn test_upsert_higher_confidence_replaces() {
    let (_temp_dir, db) = create_test_db();
    let session = db.create_session("[]").unwrap();

    db.upsert_record(&session, &record("https://bank.example", ApiType::Ais, 0.4))
        .unwrap();
    db.upsert_record(&session, &record("https://bank.example", ApiType::Ais, 0.8))
        .unwrap();

    let records = db.get_records().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].confidence_score, 0.8);
}

#[test]
fn test_upsert_lower_confidence_is_ignored() {
    let (_temp_dir, db) = create_test_db();
    let session = db.create_session("[]").unwrap();

    db.upsert_record(&session, &record("https://bank.example", ApiType::Ais, 0.8))
        .unwrap();
    db.upsert_record(&session, &record("https://bank.example", ApiType::Ais, 0.4))
        .unwrap();

    let records = db.get_records().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].confidence_score, 0.8);
}

#[test]
fn test_distinct_types_stored_separately() {
    let (_temp_dir, db) = create_test_db();
    let session = db.create_session("[]").unwrap();

    db.upsert_record(&session, &record("https://bank.example", ApiType::Ais, 0.5))
        .unwrap();
    db.upsert_record(&session, &record("https://bank.example", ApiType::Pis, 0.5))
        .unwrap();

    assert_eq!(db.count_records().unwrap(), 2);
}

#[test]
fn test_get_records_ordered_by_confidence() {
    let (_temp_dir, db) = create_test_db();
    let session = db.create_session("[]").unwrap();

    db.upsert_record(&session, &record("https://low.example", ApiType::Ais, 0.2))
        .unwrap();
    db.upsert_record(&session, &record("https://high.example", ApiType::Ais, 0.9))
        .unwrap();

    let records = db.get_records().unwrap();
    assert_eq!(records[0].confidence_score, 0.9);
    assert_eq!(records[1].confidence_score, 0.2);
}

#[test]
fn test_keywords_roundtrip_through_storage() {
    let (_temp_dir, db) = create_test_db();
    let session = db.create_session("[]").unwrap();

    db.upsert_record(&session, &record("https://bank.example", ApiType::Caf, 0.5))
        .unwrap();

    let records = db.get_records().unwrap();
    assert_eq!(records[0].keywords_found, vec!["general:psd2".to_string()]);
    assert_eq!(records[0].api_type, ApiType::Caf);
}

// ============================================================================
// Site Scan Tests
// ============================================================================

#[test]
fn test_insert_site_scan() {
    let (_temp_dir, db) = create_test_db();
    let session = db.create_session("[\"https://bank.example\"]").unwrap();

    let result = SiteScanResult {
        url: "https://bank.example".to_string(),
        status: ScanStatus::Success,
        error: None,
        pages_scanned: 7,
        api_related_pages: Vec::new(),
        apis: Vec::new(),
    };

    let id = db.insert_site_scan(&session, &result).unwrap();
    assert!(id > 0);
}

#[test]
fn test_insert_site_scan_error_status() {
    let (_temp_dir, db) = create_test_db();
    let session = db.create_session("[\"https://dead.example\"]").unwrap();

    let result = SiteScanResult::error(
        "https://dead.example".to_string(),
        "dns failure".to_string(),
    );

    assert!(db.insert_site_scan(&session, &result).is_ok());
}
