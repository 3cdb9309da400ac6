use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Botwatch
///
/// Every section is optional in the TOML file; missing sections fall back to
/// the defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub audit: AuditConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Audit timeouts
#[derive(Debug, Clone, Deserialize)]
pub struct AuditConfig {
    /// Timeout for the canonicalization probe (milliseconds)
    #[serde(rename = "probe-timeout-ms", default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,

    /// Timeout for each well-known file request (milliseconds)
    #[serde(rename = "fetch-timeout-ms", default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,
}

impl AuditConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            probe_timeout_ms: default_probe_timeout_ms(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the outbound user agent string
    ///
    /// Format: `CrawlerName/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "Botwatch".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://botwatch.dev/about".to_string(),
            contact_email: "crawler@botwatch.dev".to_string(),
        }
    }
}

/// Recurring scheduler configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds between scheduler ticks
    #[serde(rename = "tick-interval-secs", default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,

    /// Maximum number of audits in flight across all recurring targets
    #[serde(rename = "max-concurrent-scans", default = "default_max_concurrent_scans")]
    pub max_concurrent_scans: u32,
}

impl SchedulerConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: default_tick_interval_secs(),
            max_concurrent_scans: default_max_concurrent_scans(),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path", default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_probe_timeout_ms() -> u64 {
    15_000
}

fn default_fetch_timeout_ms() -> u64 {
    10_000
}

fn default_tick_interval_secs() -> u64 {
    60
}

fn default_max_concurrent_scans() -> u32 {
    5
}

fn default_database_path() -> String {
    "./botwatch.db".to_string()
}
