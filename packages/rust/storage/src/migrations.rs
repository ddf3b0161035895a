//! SQL migration definitions for the research database.
//!
//! Migrations are applied in order on connect. Each migration has a
//! version number and a batch of SQL statements.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Initial schema: company_interviews, reports",
        sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version    INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Aggregated source data, one row per (company, role) key
CREATE TABLE IF NOT EXISTS company_interviews (
    company_key  TEXT NOT NULL,
    role_key     TEXT NOT NULL,
    company_name TEXT NOT NULL,
    role         TEXT NOT NULL,
    record_json  TEXT NOT NULL,
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL,
    PRIMARY KEY (company_key, role_key)
);

CREATE INDEX IF NOT EXISTS idx_company_interviews_company ON company_interviews(company_key);

-- Append-only log of generated reports
CREATE TABLE IF NOT EXISTS reports (
    seq          INTEGER PRIMARY KEY AUTOINCREMENT,
    report_id    TEXT NOT NULL,
    company_key  TEXT NOT NULL,
    role_key     TEXT NOT NULL,
    company_name TEXT NOT NULL,
    role         TEXT NOT NULL,
    report_json  TEXT NOT NULL,
    generated_at TEXT NOT NULL,
    created_at   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_reports_key ON reports(company_key, role_key);
CREATE INDEX IF NOT EXISTS idx_reports_created ON reports(created_at DESC);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
    }]
}
