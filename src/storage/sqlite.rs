//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::audit::AuditSnapshot;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{
    Frequency, NewNotification, Notification, NotificationKind, NotificationPreference,
    RecurringScan, RecurringScanUpdate, ScanRecord,
};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const RECURRING_SCAN_COLUMNS: &str =
    "id, url, frequency, active, last_scan_id, last_run_at, next_run_at, created_at";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;

        initialize_schema(&conn)?;

        tracing::debug!("Opened database at {}", path.display());

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn ensure_changed(changed: usize, what: &str, id: i64) -> StorageResult<()> {
        if changed == 0 {
            return Err(StorageError::NotFound(format!("{} {}", what, id)));
        }
        Ok(())
    }
}

/// Formats a timestamp the way every column stores it
fn to_db_time(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_db_time(value: &str, column: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|time| time.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e)))
}

fn time_column(row: &Row<'_>, column: usize) -> rusqlite::Result<DateTime<Utc>> {
    parse_db_time(&row.get::<_, String>(column)?, column)
}

fn optional_time_column(row: &Row<'_>, column: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    row.get::<_, Option<String>>(column)?
        .map(|value| parse_db_time(&value, column))
        .transpose()
}

fn recurring_scan_from_row(row: &Row<'_>) -> rusqlite::Result<RecurringScan> {
    Ok(RecurringScan {
        id: row.get(0)?,
        url: row.get(1)?,
        frequency: Frequency::from_db_string_or_daily(&row.get::<_, String>(2)?),
        active: row.get(3)?,
        last_scan_id: row.get(4)?,
        last_run_at: optional_time_column(row, 5)?,
        next_run_at: time_column(row, 6)?,
        created_at: time_column(row, 7)?,
    })
}

fn notification_from_row(row: &Row<'_>) -> rusqlite::Result<Notification> {
    let kind: String = row.get(3)?;
    Ok(Notification {
        id: row.get(0)?,
        recurring_scan_id: row.get(1)?,
        scan_id: row.get(2)?,
        kind: NotificationKind::from_db_string(&kind).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                3,
                Type::Text,
                format!("unknown notification kind '{}'", kind).into(),
            )
        })?,
        title: row.get(4)?,
        message: row.get(5)?,
        read: row.get(6)?,
        created_at: time_column(row, 7)?,
    })
}

impl Storage for SqliteStorage {
    // ===== Audits =====

    fn create_scan(&mut self, snapshot: &AuditSnapshot) -> StorageResult<i64> {
        let json = serde_json::to_string(snapshot)?;
        let target = snapshot.target();
        self.conn.execute(
            "INSERT INTO scans (url, origin, snapshot, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                target.input,
                target.origin,
                json,
                to_db_time(snapshot.created_at())
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_scan(&self, scan_id: i64) -> StorageResult<Option<ScanRecord>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, snapshot, created_at FROM scans WHERE id = ?1",
                params![scan_id],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        time_column(row, 2)?,
                    ))
                },
            )
            .optional()?;

        match row {
            Some((id, json, created_at)) => Ok(Some(ScanRecord {
                id,
                snapshot: serde_json::from_str(&json)?,
                created_at,
            })),
            None => Ok(None),
        }
    }

    // ===== Recurring Scans =====

    fn create_recurring_scan(
        &mut self,
        url: &str,
        frequency: Frequency,
        next_run_at: DateTime<Utc>,
    ) -> StorageResult<i64> {
        self.conn.execute(
            "INSERT INTO recurring_scans (url, frequency, active, next_run_at, created_at)
             VALUES (?1, ?2, 1, ?3, ?4)",
            params![
                url,
                frequency.to_db_string(),
                to_db_time(next_run_at),
                to_db_time(Utc::now())
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_recurring_scan(&self, id: i64) -> StorageResult<Option<RecurringScan>> {
        let scan = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM recurring_scans WHERE id = ?1",
                    RECURRING_SCAN_COLUMNS
                ),
                params![id],
                recurring_scan_from_row,
            )
            .optional()?;
        Ok(scan)
    }

    fn list_recurring_scans(&self) -> StorageResult<Vec<RecurringScan>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM recurring_scans ORDER BY id",
            RECURRING_SCAN_COLUMNS
        ))?;
        let scans = stmt
            .query_map([], recurring_scan_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(scans)
    }

    fn get_due_recurring_scans(&self, now: DateTime<Utc>) -> StorageResult<Vec<RecurringScan>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM recurring_scans
             WHERE active = 1 AND next_run_at <= ?1
             ORDER BY next_run_at",
            RECURRING_SCAN_COLUMNS
        ))?;
        let scans = stmt
            .query_map(params![to_db_time(now)], recurring_scan_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(scans)
    }

    fn update_recurring_scan(
        &mut self,
        id: i64,
        update: &RecurringScanUpdate,
    ) -> StorageResult<()> {
        let changed = self.conn.execute(
            "UPDATE recurring_scans
             SET last_scan_id = COALESCE(?1, last_scan_id), last_run_at = ?2, next_run_at = ?3
             WHERE id = ?4",
            params![
                update.last_scan_id,
                to_db_time(update.last_run_at),
                to_db_time(update.next_run_at),
                id
            ],
        )?;
        Self::ensure_changed(changed, "Recurring scan", id)
    }

    fn set_recurring_scan_active(&mut self, id: i64, active: bool) -> StorageResult<()> {
        let changed = self.conn.execute(
            "UPDATE recurring_scans SET active = ?1 WHERE id = ?2",
            params![active, id],
        )?;
        Self::ensure_changed(changed, "Recurring scan", id)
    }

    fn delete_recurring_scan(&mut self, id: i64) -> StorageResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM recurring_scans WHERE id = ?1", params![id])?;
        Self::ensure_changed(changed, "Recurring scan", id)
    }

    // ===== Notifications =====

    fn get_notification_preference_by_recurring_scan_id(
        &self,
        recurring_scan_id: i64,
    ) -> StorageResult<Option<NotificationPreference>> {
        let pref = self
            .conn
            .query_row(
                "SELECT recurring_scan_id, robots_txt, llms_txt, bot_permissions, new_errors
                 FROM notification_preferences WHERE recurring_scan_id = ?1",
                params![recurring_scan_id],
                |row| {
                    Ok(NotificationPreference {
                        recurring_scan_id: row.get(0)?,
                        robots_txt: row.get(1)?,
                        llms_txt: row.get(2)?,
                        bot_permissions: row.get(3)?,
                        new_errors: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(pref)
    }

    fn set_notification_preference(
        &mut self,
        pref: &NotificationPreference,
    ) -> StorageResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO notification_preferences
             (recurring_scan_id, robots_txt, llms_txt, bot_permissions, new_errors)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                pref.recurring_scan_id,
                pref.robots_txt,
                pref.llms_txt,
                pref.bot_permissions,
                pref.new_errors
            ],
        )?;
        Ok(())
    }

    fn create_notification(&mut self, notification: &NewNotification) -> StorageResult<i64> {
        self.conn.execute(
            "INSERT INTO notifications (recurring_scan_id, scan_id, kind, title, message, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                notification.recurring_scan_id,
                notification.scan_id,
                notification.kind.to_db_string(),
                notification.title,
                notification.message,
                to_db_time(notification.created_at)
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn list_notifications(&self, recurring_scan_id: i64) -> StorageResult<Vec<Notification>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, recurring_scan_id, scan_id, kind, title, message, read, created_at
             FROM notifications WHERE recurring_scan_id = ?1
             ORDER BY created_at DESC, id DESC",
        )?;
        let notifications = stmt
            .query_map(params![recurring_scan_id], notification_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(notifications)
    }
}
