//! Storage traits and error types
//!
//! This module defines the trait interface the scheduler and CLI consume, and
//! associated error types.

use crate::audit::AuditSnapshot;
use crate::storage::{
    Frequency, NewNotification, Notification, NotificationPreference, RecurringScan,
    RecurringScanUpdate, ScanRecord,
};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage lock poisoned")]
    LockPoisoned,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Reads take `&self` and writes `&mut self`; callers sharing a backend
/// across tasks wrap it in a mutex and never hold the lock across an await.
pub trait Storage: Send {
    // ===== Audits =====

    /// Persists an audit snapshot
    ///
    /// # Returns
    ///
    /// The ID of the stored scan
    fn create_scan(&mut self, snapshot: &AuditSnapshot) -> StorageResult<i64>;

    /// Gets a stored scan by ID
    fn get_scan(&self, scan_id: i64) -> StorageResult<Option<ScanRecord>>;

    // ===== Recurring Scans =====

    /// Registers a site for recurring audits
    ///
    /// # Arguments
    ///
    /// * `url` - The site as the user entered it
    /// * `frequency` - How often to audit it
    /// * `next_run_at` - When the first audit is due
    fn create_recurring_scan(
        &mut self,
        url: &str,
        frequency: Frequency,
        next_run_at: DateTime<Utc>,
    ) -> StorageResult<i64>;

    /// Gets a recurring scan by ID
    fn get_recurring_scan(&self, id: i64) -> StorageResult<Option<RecurringScan>>;

    /// Lists all recurring scans, active or not
    fn list_recurring_scans(&self) -> StorageResult<Vec<RecurringScan>>;

    /// Gets active recurring scans whose next run is at or before `now`
    fn get_due_recurring_scans(&self, now: DateTime<Utc>) -> StorageResult<Vec<RecurringScan>>;

    /// Records the outcome of a scheduled run
    ///
    /// A `last_scan_id` of None leaves the stored reference unchanged.
    fn update_recurring_scan(&mut self, id: i64, update: &RecurringScanUpdate)
        -> StorageResult<()>;

    /// Pauses or resumes a recurring scan
    fn set_recurring_scan_active(&mut self, id: i64, active: bool) -> StorageResult<()>;

    /// Deletes a recurring scan with its preference and notifications
    fn delete_recurring_scan(&mut self, id: i64) -> StorageResult<()>;

    // ===== Notifications =====

    /// Gets the stored preference for a recurring scan, if any
    fn get_notification_preference_by_recurring_scan_id(
        &self,
        recurring_scan_id: i64,
    ) -> StorageResult<Option<NotificationPreference>>;

    /// Inserts or replaces the preference for a recurring scan
    fn set_notification_preference(&mut self, pref: &NotificationPreference)
        -> StorageResult<()>;

    /// Stores a notification
    fn create_notification(&mut self, notification: &NewNotification) -> StorageResult<i64>;

    /// Lists notifications for a recurring scan, newest first
    fn list_notifications(&self, recurring_scan_id: i64) -> StorageResult<Vec<Notification>>;
}
