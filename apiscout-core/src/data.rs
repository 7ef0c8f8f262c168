use crate::inventory::{ApiRecord, ApiType, ScanStatus, SiteScanResult};
use rusqlite::{params, Connection, Result};
use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// SQLite-backed scan history. API records are keyed on
/// (url, api_type) — the dedup key — and an upsert only replaces a
/// stored record when the incoming confidence is higher.
pub struct Database {
    conn: Connection,
}

fn current_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
}

impl Database {
    pub fn drop(path: &Path) {
        fs::remove_file(path).unwrap();
    }

    pub fn exists(path: &Path) -> bool {
        path.exists()
    }

    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
            PRAGMA foreign_keys = ON;
            ",
        )?;

        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS scan_sessions (
    id TEXT PRIMARY KEY,
    started_at INTEGER NOT NULL,
    finished_at INTEGER,
    status TEXT NOT NULL CHECK(status IN ('running', 'completed', 'failed')),
    seed_urls TEXT NOT NULL  -- JSON array
);

CREATE TABLE IF NOT EXISTS site_scans (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id TEXT NOT NULL,
    url TEXT NOT NULL,
    status TEXT NOT NULL CHECK(status IN ('success', 'error')),
    error TEXT,
    pages_scanned INTEGER NOT NULL DEFAULT 0,
    api_count INTEGER NOT NULL DEFAULT 0,
    FOREIGN KEY(session_id) REFERENCES scan_sessions(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_site_scans_session ON site_scans(session_id);

CREATE TABLE IF NOT EXISTS api_records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id TEXT,
    name TEXT NOT NULL,
    api_type TEXT NOT NULL CHECK(api_type IN ('AIS', 'PIS', 'CAF', 'PSD2', 'Unknown')),
    url TEXT NOT NULL,
    source_page TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    version TEXT NOT NULL DEFAULT '',
    documentation_url TEXT NOT NULL DEFAULT '',
    swagger_url TEXT NOT NULL DEFAULT '',
    sandbox_url TEXT NOT NULL DEFAULT '',
    production_url TEXT NOT NULL DEFAULT '',
    authentication TEXT NOT NULL DEFAULT '',
    discovered_at TEXT NOT NULL,
    confidence_score REAL NOT NULL,
    keywords_found TEXT NOT NULL DEFAULT '[]',  -- JSON array
    FOREIGN KEY(session_id) REFERENCES scan_sessions(id) ON DELETE SET NULL,
    UNIQUE(url, api_type)
);

CREATE INDEX IF NOT EXISTS idx_api_records_url ON api_records(url);
CREATE INDEX IF NOT EXISTS idx_api_records_type ON api_records(api_type);
            ",
        )?;
        Ok(())
    }

    // Session management

    pub fn create_session(&self, seed_urls: &str) -> Result<String> {
        let session_id = uuid::Uuid::new_v4().to_string();
        let timestamp = current_timestamp();

        self.conn.execute(
            "INSERT INTO scan_sessions (id, started_at, status, seed_urls) VALUES (?1, ?2, ?3, ?4)",
            params![&session_id, timestamp, "running", seed_urls],
        )?;

        Ok(session_id)
    }

    pub fn complete_session(&self, session_id: &str) -> Result<()> {
        self.finish_session(session_id, "completed")
    }

    pub fn fail_session(&self, session_id: &str) -> Result<()> {
        self.finish_session(session_id, "failed")
    }

    fn finish_session(&self, session_id: &str, status: &str) -> Result<()> {
        let timestamp = current_timestamp();
        self.conn.execute(
            "UPDATE scan_sessions SET status = ?1, finished_at = ?2 WHERE id = ?3",
            params![status, timestamp, session_id],
        )?;
        Ok(())
    }

    // Site scan results

    pub fn insert_site_scan(&self, session_id: &str, result: &SiteScanResult) -> Result<i64> {
        let status = match result.status {
            ScanStatus::Success => "success",
            ScanStatus::Error => "error",
        };

        self.conn.execute(
            "INSERT INTO site_scans (session_id, url, status, error, pages_scanned, api_count)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                session_id,
                &result.url,
                status,
                &result.error,
                result.pages_scanned as i64,
                result.apis.len() as i64,
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    // API record operations

    /// Insert or merge one record. An existing row with the same
    /// (url, api_type) survives unless the incoming confidence is higher.
    pub fn upsert_record(&self, session_id: &str, record: &ApiRecord) -> Result<()> {
        let keywords = serde_json::to_string(&record.keywords_found)
            .unwrap_or_else(|_| "[]".to_string());

        self.conn.execute(
            "INSERT INTO api_records (
                session_id, name, api_type, url, source_page, description, version,
                documentation_url, swagger_url, sandbox_url, production_url,
                authentication, discovered_at, confidence_score, keywords_found
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            ON CONFLICT(url, api_type) DO UPDATE SET
                session_id = excluded.session_id,
                name = excluded.name,
                source_page = excluded.source_page,
                description = excluded.description,
                version = excluded.version,
                documentation_url = excluded.documentation_url,
                swagger_url = excluded.swagger_url,
                sandbox_url = excluded.sandbox_url,
                production_url = excluded.production_url,
                authentication = excluded.authentication,
                discovered_at = excluded.discovered_at,
                confidence_score = excluded.confidence_score,
                keywords_found = excluded.keywords_found
            WHERE excluded.confidence_score > api_records.confidence_score",
            params![
                session_id,
                &record.name,
                record.api_type.as_str(),
                &record.url,
                &record.source_page,
                &record.description,
                &record.version,
                &record.documentation_url,
                &record.swagger_url,
                &record.sandbox_url,
                &record.production_url,
                &record.authentication,
                &record.discovered_at,
                record.confidence_score,
                keywords,
            ],
        )?;

        Ok(())
    }

    /// All stored records, confidence descending.
    pub fn get_records(&self) -> Result<Vec<ApiRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT name, api_type, url, source_page, description, version,
                    documentation_url, swagger_url, sandbox_url, production_url,
                    authentication, discovered_at, confidence_score, keywords_found
             FROM api_records
             ORDER BY confidence_score DESC, url, api_type",
        )?;

        let records = stmt
            .query_map([], |row| {
                let api_type: String = row.get(1)?;
                let keywords: String = row.get(13)?;
                Ok(ApiRecord {
                    name: row.get(0)?,
                    api_type: ApiType::from_str(&api_type),
                    url: row.get(2)?,
                    source_page: row.get(3)?,
                    description: row.get(4)?,
                    version: row.get(5)?,
                    documentation_url: row.get(6)?,
                    swagger_url: row.get(7)?,
                    sandbox_url: row.get(8)?,
                    production_url: row.get(9)?,
                    authentication: row.get(10)?,
                    discovered_at: row.get(11)?,
                    confidence_score: row.get(12)?,
                    keywords_found: serde_json::from_str(&keywords).unwrap_or_default(),
                })
            })?
            .collect::<Result<Vec<_>>>()?;

        Ok(records)
    }

    pub fn count_records(&self) -> Result<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM api_records", [], |row| row.get(0))
    }

    pub fn get_connection(&self) -> &Connection {
        &self.conn
    }
}
