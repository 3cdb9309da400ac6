//! Audit module: one scan of one site
//!
//! An audit runs in two stages:
//! 1. Canonicalization probe (see [`crate::url::canonicalize`])
//! 2. Concurrent retrieval of the eight well-known files
//!
//! and ends by assembling an immutable [`AuditSnapshot`].

pub mod fetcher;
mod probe;
mod resources;
mod snapshot;

pub use fetcher::{build_http_client, NetworkErrorKind, NetworkFailure};
pub use probe::{probe_bot_access, BotAccess, BotAccessReport};
pub use resources::{fetch_all, fetch_resource, WellKnownResource};
pub use snapshot::{AuditSnapshot, AuditTarget, FetchError, FetchOutcome};

use crate::config::{AuditConfig, Config};
use crate::url::{canonicalize, Canonicalization};
use crate::ScanError;
use chrono::Utc;
use reqwest::Client;

/// Runs audits with a shared HTTP client
#[derive(Debug, Clone)]
pub struct Scanner {
    client: Client,
    audit: AuditConfig,
}

impl Scanner {
    /// Creates a scanner from the full configuration
    pub fn new(config: &Config) -> Result<Self, ScanError> {
        let client = build_http_client(&config.user_agent)?;
        Ok(Self::with_client(client, config.audit.clone()))
    }

    /// Creates a scanner around an existing client
    pub fn with_client(client: Client, audit: AuditConfig) -> Self {
        Self { client, audit }
    }

    /// Audits one site
    ///
    /// # Returns
    ///
    /// * `Ok(AuditSnapshot)` - The audit completed, possibly with warnings and
    ///   per-file errors recorded in the snapshot
    /// * `Err(ScanError)` - The input is not a URL, or the site is unreachable
    pub async fn scan(&self, input: &str) -> Result<AuditSnapshot, ScanError> {
        let Canonicalization { target, warning } =
            canonicalize(&self.client, input, self.audit.probe_timeout()).await?;

        tracing::info!(
            "Auditing {} (origin {}, base path '{}')",
            input,
            target.origin,
            target.base_path
        );

        let files = fetch_all(&self.client, &target, self.audit.fetch_timeout()).await;
        let found = files.values().filter(|outcome| outcome.found).count();

        let warnings = warning.into_iter().collect();
        let snapshot = AuditSnapshot::assemble(target, files, warnings, Utc::now());

        tracing::info!(
            "Audit of {} finished: {}/8 files found, {} warnings, {} errors",
            input,
            found,
            snapshot.warnings().len(),
            snapshot.errors().len()
        );

        Ok(snapshot)
    }

    /// Probes `input` while presenting `agent`'s user agent string
    pub async fn probe(&self, input: &str, agent: &str) -> Result<BotAccessReport, ScanError> {
        probe_bot_access(&self.client, input, agent, self.audit.fetch_timeout()).await
    }
}

/// Audits one site with the default configuration
///
/// # Example
///
/// ```no_run
/// # async fn example() -> Result<(), botwatch::ScanError> {
/// let snapshot = botwatch::scan("example.com").await?;
/// println!("robots.txt found: {}", snapshot.robots_txt_found());
/// # Ok(())
/// # }
/// ```
pub async fn scan(input: &str) -> Result<AuditSnapshot, ScanError> {
    Scanner::new(&Config::default())?.scan(input).await
}
