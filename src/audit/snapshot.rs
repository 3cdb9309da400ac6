//! Audit snapshot types
//!
//! An [`AuditSnapshot`] is assembled once at the end of a scan and only read
//! afterwards.

use crate::audit::fetcher::NetworkErrorKind;
use crate::audit::resources::WellKnownResource;
use crate::robots::{default_permissions, evaluate_permissions, BotPermission, RobotsDirectives};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The site being audited
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTarget {
    /// Raw user input
    pub input: String,

    /// `scheme://host[:port]`, post-redirect when canonicalized
    pub origin: String,

    /// Path below the origin, without trailing slash (empty for the root)
    pub base_path: String,

    /// False when the probe failed and the original origin was kept
    pub canonicalized: bool,
}

impl AuditTarget {
    pub fn canonical(input: &str, origin: String, base_path: String) -> Self {
        Self {
            input: input.to_string(),
            origin,
            base_path,
            canonicalized: true,
        }
    }

    pub fn uncanonicalized(input: &str, origin: String, base_path: String) -> Self {
        Self {
            input: input.to_string(),
            origin,
            base_path,
            canonicalized: false,
        }
    }
}

/// Why a well-known file could not be retrieved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FetchError {
    /// The request itself failed
    Network {
        kind: NetworkErrorKind,
        message: String,
    },
    /// The server answered with an unexpected status
    Status { code: u16 },
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network { kind, message } => write!(f, "{} ({})", kind, message),
            Self::Status { code } => write!(f, "HTTP {}", code),
        }
    }
}

/// Retrieval result for one well-known file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchOutcome {
    pub found: bool,
    pub content: Option<String>,
    /// URL the content was read from
    pub url: Option<String>,
    pub error: Option<FetchError>,
}

impl FetchOutcome {
    pub fn found(url: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            found: true,
            content: Some(content.into()),
            url: Some(url.into()),
            error: None,
        }
    }

    pub fn missing(error: Option<FetchError>) -> Self {
        Self {
            found: false,
            content: None,
            url: None,
            error,
        }
    }
}

/// Immutable result of one scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditSnapshot {
    target: AuditTarget,
    files: BTreeMap<WellKnownResource, FetchOutcome>,
    bot_permissions: BTreeMap<String, BotPermission>,
    sitemap_urls: Vec<String>,
    /// `Crawl-delay:` seconds declared in robots.txt, by user-agent token
    #[serde(default)]
    crawl_delays: BTreeMap<String, f64>,
    warnings: Vec<String>,
    errors: Vec<String>,
    created_at: DateTime<Utc>,
}

impl AuditSnapshot {
    /// Assembles a snapshot from retrieved files
    ///
    /// Permission verdicts are derived from robots.txt when it was found and
    /// fall back to the permissive defaults otherwise. Network failures become
    /// errors; unexpected statuses and missing key files become warnings.
    /// Resources missing from `files` are recorded as not found.
    pub fn assemble(
        target: AuditTarget,
        mut files: BTreeMap<WellKnownResource, FetchOutcome>,
        mut warnings: Vec<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        for resource in WellKnownResource::ALL {
            files.entry(resource).or_default();
        }

        let mut errors = Vec::new();
        for (resource, outcome) in &files {
            match &outcome.error {
                Some(error @ FetchError::Network { .. }) => {
                    errors.push(format!("{}: {}", resource, error));
                }
                Some(error @ FetchError::Status { .. }) => {
                    warnings.push(format!("{} request returned {}", resource, error));
                }
                None => {}
            }
        }

        let robots = files
            .get(&WellKnownResource::RobotsTxt)
            .filter(|outcome| outcome.found)
            .and_then(|outcome| outcome.content.as_deref());

        let (bot_permissions, sitemap_urls, crawl_delays) = match robots {
            Some(content) => {
                let directives = RobotsDirectives::parse(content);
                (
                    evaluate_permissions(&directives),
                    directives.sitemaps().to_vec(),
                    directives.crawl_delays().clone(),
                )
            }
            None => {
                warnings.push(
                    "robots.txt not found; all crawlers are allowed by default".to_string(),
                );
                (default_permissions(), Vec::new(), BTreeMap::new())
            }
        };

        let sitemap_found = files
            .get(&WellKnownResource::Sitemap)
            .map_or(false, |outcome| outcome.found);
        if !sitemap_found && sitemap_urls.is_empty() {
            warnings.push(
                "No sitemap.xml found and robots.txt declares no Sitemap".to_string(),
            );
        }

        Self {
            target,
            files,
            bot_permissions,
            sitemap_urls,
            crawl_delays,
            warnings,
            errors,
            created_at,
        }
    }

    pub fn target(&self) -> &AuditTarget {
        &self.target
    }

    pub fn files(&self) -> &BTreeMap<WellKnownResource, FetchOutcome> {
        &self.files
    }

    pub fn file(&self, resource: WellKnownResource) -> Option<&FetchOutcome> {
        self.files.get(&resource)
    }

    /// Content of a file, only when it was found
    pub fn content(&self, resource: WellKnownResource) -> Option<&str> {
        self.file(resource)
            .filter(|outcome| outcome.found)
            .and_then(|outcome| outcome.content.as_deref())
    }

    pub fn robots_txt_found(&self) -> bool {
        self.file(WellKnownResource::RobotsTxt)
            .map_or(false, |outcome| outcome.found)
    }

    pub fn robots_txt(&self) -> Option<&str> {
        self.content(WellKnownResource::RobotsTxt)
    }

    pub fn llms_txt_found(&self) -> bool {
        self.file(WellKnownResource::LlmsTxt)
            .map_or(false, |outcome| outcome.found)
    }

    pub fn llms_txt(&self) -> Option<&str> {
        self.content(WellKnownResource::LlmsTxt)
    }

    pub fn bot_permissions(&self) -> &BTreeMap<String, BotPermission> {
        &self.bot_permissions
    }

    pub fn permission(&self, agent: &str) -> Option<BotPermission> {
        self.bot_permissions.get(agent).copied()
    }

    /// Sitemap URLs declared in robots.txt
    pub fn sitemap_urls(&self) -> &[String] {
        &self.sitemap_urls
    }

    pub fn crawl_delays(&self) -> &BTreeMap<String, f64> {
        &self.crawl_delays
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
