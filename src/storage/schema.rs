//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Botwatch database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Completed audits, snapshot stored as JSON
CREATE TABLE IF NOT EXISTS scans (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL,
    origin TEXT NOT NULL,
    snapshot TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_scans_origin ON scans(origin);

-- Sites under recurring watch
CREATE TABLE IF NOT EXISTS recurring_scans (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL,
    frequency TEXT NOT NULL,
    active INTEGER NOT NULL DEFAULT 1,
    last_scan_id INTEGER REFERENCES scans(id) ON DELETE SET NULL,
    last_run_at TEXT,
    next_run_at TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_recurring_scans_due ON recurring_scans(active, next_run_at);

-- Per-watch notification switches
CREATE TABLE IF NOT EXISTS notification_preferences (
    recurring_scan_id INTEGER PRIMARY KEY REFERENCES recurring_scans(id) ON DELETE CASCADE,
    robots_txt INTEGER NOT NULL DEFAULT 1,
    llms_txt INTEGER NOT NULL DEFAULT 1,
    bot_permissions INTEGER NOT NULL DEFAULT 1,
    new_errors INTEGER NOT NULL DEFAULT 1
);

-- Emitted change notifications
CREATE TABLE IF NOT EXISTS notifications (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    recurring_scan_id INTEGER NOT NULL REFERENCES recurring_scans(id) ON DELETE CASCADE,
    scan_id INTEGER NOT NULL REFERENCES scans(id),
    kind TEXT NOT NULL,
    title TEXT NOT NULL,
    message TEXT NOT NULL,
    read INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_notifications_watch ON notifications(recurring_scan_id);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
