//! Storage module for persisting audits and recurring watches
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Audit snapshot persistence
//! - Recurring scan bookkeeping (due queries, reschedules, pause/resume)
//! - Notification preferences and emitted notifications

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::audit::AuditSnapshot;
use chrono::{DateTime, Duration, Utc};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(StorageError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> StorageResult<SqliteStorage> {
    SqliteStorage::new(path)
}

/// A persisted audit
#[derive(Debug, Clone, PartialEq)]
pub struct ScanRecord {
    pub id: i64,
    pub snapshot: AuditSnapshot,
    pub created_at: DateTime<Utc>,
}

/// How often a recurring scan runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
}

impl Frequency {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            "monthly" => Some(Self::Monthly),
            _ => None,
        }
    }

    /// Reads a stored value, treating anything unknown as daily
    pub fn from_db_string_or_daily(s: &str) -> Self {
        Self::from_db_string(s).unwrap_or_else(|| {
            tracing::warn!("Unknown scan frequency '{}', using daily", s);
            Self::Daily
        })
    }

    pub fn interval(&self) -> Duration {
        match self {
            Self::Daily => Duration::days(1),
            Self::Weekly => Duration::days(7),
            Self::Monthly => Duration::days(30),
        }
    }

    pub fn next_run_after(&self, last_run: DateTime<Utc>) -> DateTime<Utc> {
        last_run + self.interval()
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_string())
    }
}

impl FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_string(&s.to_ascii_lowercase())
            .ok_or_else(|| format!("unknown frequency '{}' (expected daily, weekly or monthly)", s))
    }
}

/// A site under recurring watch
#[derive(Debug, Clone, PartialEq)]
pub struct RecurringScan {
    pub id: i64,
    pub url: String,
    pub frequency: Frequency,
    pub active: bool,
    /// Most recent successful audit
    pub last_scan_id: Option<i64>,
    pub last_run_at: Option<DateTime<Utc>>,
    pub next_run_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Bookkeeping written after each scheduled run
#[derive(Debug, Clone, PartialEq)]
pub struct RecurringScanUpdate {
    pub last_scan_id: Option<i64>,
    pub last_run_at: DateTime<Utc>,
    pub next_run_at: DateTime<Utc>,
}

/// Categories of change a recurring scan can notify about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    RobotsTxt,
    LlmsTxt,
    BotPermissions,
    NewErrors,
}

impl NotificationKind {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::RobotsTxt => "robots_txt",
            Self::LlmsTxt => "llms_txt",
            Self::BotPermissions => "bot_permissions",
            Self::NewErrors => "new_errors",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "robots_txt" => Some(Self::RobotsTxt),
            "llms_txt" => Some(Self::LlmsTxt),
            "bot_permissions" => Some(Self::BotPermissions),
            "new_errors" => Some(Self::NewErrors),
            _ => None,
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_string())
    }
}

impl FromStr for NotificationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_string(&s.to_ascii_lowercase().replace('-', "_")).ok_or_else(|| {
            format!(
                "unknown notification kind '{}' (expected robots_txt, llms_txt, bot_permissions or new_errors)",
                s
            )
        })
    }
}

/// Which change categories a recurring scan notifies about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationPreference {
    pub recurring_scan_id: i64,
    pub robots_txt: bool,
    pub llms_txt: bool,
    pub bot_permissions: bool,
    pub new_errors: bool,
}

impl NotificationPreference {
    /// Preference used when none is stored
    pub fn all_enabled(recurring_scan_id: i64) -> Self {
        Self {
            recurring_scan_id,
            robots_txt: true,
            llms_txt: true,
            bot_permissions: true,
            new_errors: true,
        }
    }

    /// Turns one category on or off
    pub fn set(&mut self, kind: NotificationKind, enabled: bool) {
        let flag = match kind {
            NotificationKind::RobotsTxt => &mut self.robots_txt,
            NotificationKind::LlmsTxt => &mut self.llms_txt,
            NotificationKind::BotPermissions => &mut self.bot_permissions,
            NotificationKind::NewErrors => &mut self.new_errors,
        };
        *flag = enabled;
    }

    pub fn enables(&self, kind: NotificationKind) -> bool {
        match kind {
            NotificationKind::RobotsTxt => self.robots_txt,
            NotificationKind::LlmsTxt => self.llms_txt,
            NotificationKind::BotPermissions => self.bot_permissions,
            NotificationKind::NewErrors => self.new_errors,
        }
    }
}

/// A notification about to be stored
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub recurring_scan_id: i64,
    pub scan_id: i64,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// A stored notification
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: i64,
    pub recurring_scan_id: i64,
    pub scan_id: i64,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}
