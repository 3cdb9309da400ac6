//! Botwatch: a well-known file auditor
//!
//! This crate audits a website's robots.txt and its companion well-known files,
//! derives per-crawler permission verdicts, and watches recurring targets for
//! meaningful changes between successive audits.

pub mod audit;
pub mod changes;
pub mod config;
pub mod robots;
pub mod scheduler;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Botwatch operations
#[derive(Debug, Error)]
pub enum BotwatchError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Scheduler error: {0}")]
    Scheduler(String),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that abort a single audit
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] UrlError),

    #[error("Site unreachable at {url}: {kind} ({message})")]
    Unreachable {
        url: String,
        kind: audit::NetworkErrorKind,
        message: String,
    },

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,

    #[error("Empty URL")]
    Empty,
}

/// Result type alias for Botwatch operations
pub type Result<T> = std::result::Result<T, BotwatchError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use audit::{scan, AuditSnapshot, Scanner};
pub use changes::{detect_changes, ChangeRecord};
pub use config::Config;
pub use robots::BotPermission;
pub use scheduler::{RecurringScheduler, TickReport};
