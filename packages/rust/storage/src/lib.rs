//! libSQL-backed cache/store gateway for research data.
//!
//! The [`Storage`] struct wraps a libSQL database holding two collections:
//! - `company_interviews`: one aggregated [`SourceRecord`] per
//!   (company, role) key, overwritten on conflict
//! - `reports`: an append-only log of every [`ResearchReport`]
//!
//! **Connection rules:**
//! - Every operation requires [`Storage::connect`] to have succeeded;
//!   while disconnected, operations fail with
//!   [`InterviewPrepError::Connectivity`] instead of silently doing nothing.
//! - Keys are lowercased before comparison, so "Google" and "google" collide.

mod migrations;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use interviewprep_shared::{
    CacheKey, InterviewPrepError, ResearchReport, Result, SourceRecord,
};
use libsql::{Connection, Database, params};
use tokio::sync::{RwLock, RwLockReadGuard};
use tracing::{debug, info, instrument};

// ---------------------------------------------------------------------------
// Gateway trait
// ---------------------------------------------------------------------------

/// Persistence boundary used by the research pipeline.
///
/// Implementations must treat keys case-insensitively and must fail with a
/// connectivity error when used while disconnected.
#[async_trait]
pub trait ResearchStore: Send + Sync {
    /// Establish the connection. Calling it while connected is a no-op.
    async fn connect(&self) -> Result<()>;

    /// Drop the connection. Later operations fail until `connect` is called again.
    async fn disconnect(&self) -> Result<()>;

    /// Look up the stored source record for a key.
    async fn get(&self, key: &CacheKey) -> Result<Option<SourceRecord>>;

    /// Insert or fully overwrite the record stored under the record's key.
    async fn upsert(&self, record: &SourceRecord) -> Result<()>;

    /// Append a report to the log. Reports are never deduplicated.
    async fn append_report(&self, report: &ResearchReport) -> Result<()>;

    /// Distinct company names with stored source data.
    async fn distinct_companies(&self) -> Result<Vec<String>>;
}

/// Row counts for the `status` view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    /// Distinct companies with stored source data.
    pub companies: usize,
    /// Stored (company, role) source records.
    pub source_records: usize,
    /// Reports in the append-only log.
    pub reports: usize,
}

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

/// An open database plus its connection.
struct Handle {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
}

/// Primary storage handle wrapping a libSQL database file.
pub struct Storage {
    path: PathBuf,
    handle: RwLock<Option<Handle>>,
}

impl Storage {
    /// Create a disconnected gateway for the database at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            handle: RwLock::new(None),
        }
    }

    /// Create a gateway for `path` and connect it (creating and migrating the file).
    pub async fn open(path: &Path) -> Result<Self> {
        let storage = Self::new(path);
        storage.connect().await?;
        Ok(storage)
    }

    /// Path of the backing database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a connection is currently established.
    pub async fn is_connected(&self) -> bool {
        self.handle.read().await.is_some()
    }

    /// Borrow the live connection, or fail with a connectivity error.
    async fn conn(&self) -> Result<RwLockReadGuard<'_, Connection>> {
        let guard = self.handle.read().await;
        RwLockReadGuard::try_map(guard, |handle| handle.as_ref().map(|h| &h.conn)).map_err(
            |_| {
                InterviewPrepError::Connectivity(format!(
                    "store at {} is not connected",
                    self.path.display()
                ))
            },
        )
    }

    /// Run pending schema migrations.
    async fn run_migrations(conn: &Connection) -> Result<()> {
        let current_version = Self::get_schema_version(conn).await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                conn.execute_batch(migration.sql).await.map_err(|e| {
                    InterviewPrepError::Storage(format!(
                        "migration v{} failed: {e}",
                        migration.version
                    ))
                })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(conn: &Connection) -> u32 {
        let result = conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    /// Round-trip a trivial query. `false` when disconnected or failing.
    pub async fn health_check(&self) -> bool {
        let Ok(conn) = self.conn().await else {
            return false;
        };
        match conn.query("SELECT 1", params![]).await {
            Ok(mut rows) => matches!(rows.next().await, Ok(Some(_))),
            Err(_) => false,
        }
    }

    /// Count stored companies, source records, and reports.
    pub async fn stats(&self) -> Result<StoreStats> {
        let conn = self.conn().await?;
        let mut rows = conn
            .query(
                "SELECT
                   (SELECT COUNT(DISTINCT company_key) FROM company_interviews),
                   (SELECT COUNT(*) FROM company_interviews),
                   (SELECT COUNT(*) FROM reports)",
                params![],
            )
            .await
            .map_err(|e| InterviewPrepError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let count = |idx: i32| -> Result<usize> {
                    row.get::<i64>(idx)
                        .map(|v| v as usize)
                        .map_err(|e| InterviewPrepError::Storage(e.to_string()))
                };
                Ok(StoreStats {
                    companies: count(0)?,
                    source_records: count(1)?,
                    reports: count(2)?,
                })
            }
            Ok(None) => Err(InterviewPrepError::Storage("stats query returned no row".into())),
            Err(e) => Err(InterviewPrepError::Storage(e.to_string())),
        }
    }

    /// Most recent reports for a key, newest first.
    pub async fn list_reports(&self, key: &CacheKey, limit: u32) -> Result<Vec<ResearchReport>> {
        let conn = self.conn().await?;
        let mut rows = conn
            .query(
                "SELECT report_json FROM reports
                 WHERE company_key = ?1 AND role_key = ?2
                 ORDER BY seq DESC
                 LIMIT ?3",
                params![key.company.as_str(), key.role.as_str(), i64::from(limit)],
            )
            .await
            .map_err(|e| InterviewPrepError::Storage(e.to_string()))?;

        let mut results = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            let json: String = row
                .get(0)
                .map_err(|e| InterviewPrepError::Storage(e.to_string()))?;
            results.push(decode::<ResearchReport>(&json, "report")?);
        }
        Ok(results)
    }
}

#[async_trait]
impl ResearchStore for Storage {
    #[instrument(skip_all, fields(path = %self.path.display()))]
    async fn connect(&self) -> Result<()> {
        let mut handle = self.handle.write().await;
        if handle.is_some() {
            return Ok(());
        }

        // Ensure parent directory exists
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| InterviewPrepError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(&self.path)
            .build()
            .await
            .map_err(|e| InterviewPrepError::Connectivity(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| InterviewPrepError::Connectivity(e.to_string()))?;

        Self::run_migrations(&conn).await?;
        *handle = Some(Handle { db, conn });
        info!("connected to research store");
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        if self.handle.write().await.take().is_some() {
            info!(path = %self.path.display(), "disconnected from research store");
        }
        Ok(())
    }

    async fn get(&self, key: &CacheKey) -> Result<Option<SourceRecord>> {
        let conn = self.conn().await?;
        let mut rows = conn
            .query(
                "SELECT record_json FROM company_interviews
                 WHERE company_key = ?1 AND role_key = ?2",
                params![key.company.as_str(), key.role.as_str()],
            )
            .await
            .map_err(|e| InterviewPrepError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let json: String = row
                    .get(0)
                    .map_err(|e| InterviewPrepError::Storage(e.to_string()))?;
                debug!(%key, "source record found");
                Ok(Some(decode(&json, "source record")?))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(InterviewPrepError::Storage(e.to_string())),
        }
    }

    async fn upsert(&self, record: &SourceRecord) -> Result<()> {
        let key = record.key();
        let json = encode(record, "source record")?;
        let now = Utc::now().to_rfc3339();

        let conn = self.conn().await?;
        conn.execute(
            "INSERT INTO company_interviews
               (company_key, role_key, company_name, role, record_json, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(company_key, role_key) DO UPDATE SET
               company_name = excluded.company_name,
               role = excluded.role,
               record_json = excluded.record_json,
               updated_at = excluded.updated_at",
            params![
                key.company.as_str(),
                key.role.as_str(),
                record.company_name.as_str(),
                record.role.as_str(),
                json.as_str(),
                now.as_str(),
                now.as_str(),
            ],
        )
        .await
        .map_err(|e| InterviewPrepError::Storage(e.to_string()))?;

        info!(%key, "saved source record");
        Ok(())
    }

    async fn append_report(&self, report: &ResearchReport) -> Result<()> {
        let key = report.key();
        let json = encode(report, "report")?;
        let now = Utc::now().to_rfc3339();

        let conn = self.conn().await?;
        conn.execute(
            "INSERT INTO reports
               (report_id, company_key, role_key, company_name, role, report_json, generated_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                report.id.to_string(),
                key.company.as_str(),
                key.role.as_str(),
                report.query.company_name.as_str(),
                report.query.role.as_str(),
                json.as_str(),
                report.generated_at.to_rfc3339(),
                now.as_str(),
            ],
        )
        .await
        .map_err(|e| InterviewPrepError::Storage(e.to_string()))?;

        info!(%key, report_id = %report.id, "saved report");
        Ok(())
    }

    async fn distinct_companies(&self) -> Result<Vec<String>> {
        let conn = self.conn().await?;
        let mut rows = conn
            .query(
                "SELECT MAX(company_name) FROM company_interviews
                 GROUP BY company_key
                 ORDER BY company_key",
                params![],
            )
            .await
            .map_err(|e| InterviewPrepError::Storage(e.to_string()))?;

        let mut results = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            results.push(
                row.get::<String>(0)
                    .map_err(|e| InterviewPrepError::Storage(e.to_string()))?,
            );
        }
        debug!(count = results.len(), "listed companies");
        Ok(results)
    }
}

fn encode<T: serde::Serialize>(value: &T, what: &str) -> Result<String> {
    serde_json::to_string(value)
        .map_err(|e| InterviewPrepError::parse(format!("failed to serialize {what}: {e}")))
}

fn decode<T: serde::de::DeserializeOwned>(json: &str, what: &str) -> Result<T> {
    serde_json::from_str(json)
        .map_err(|e| InterviewPrepError::parse(format!("stored {what} is corrupt: {e}")))
}
