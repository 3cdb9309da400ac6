//! Well-known resource retrieval
//!
//! Each of the eight files is fetched by its own task. Candidate URLs for one
//! file are tried in order and the first acceptable response wins. All tasks
//! are joined; a task never fails, it reports its failure in its outcome.

use crate::audit::fetcher::fetch_text;
use crate::audit::snapshot::{AuditTarget, FetchError, FetchOutcome};
use futures::future::join_all;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// The eight files inspected by an audit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WellKnownResource {
    RobotsTxt,
    LlmsTxt,
    Sitemap,
    SecurityTxt,
    Manifest,
    AdsTxt,
    HumansTxt,
    AiTxt,
}

impl WellKnownResource {
    pub const ALL: [WellKnownResource; 8] = [
        Self::RobotsTxt,
        Self::LlmsTxt,
        Self::Sitemap,
        Self::SecurityTxt,
        Self::Manifest,
        Self::AdsTxt,
        Self::HumansTxt,
        Self::AiTxt,
    ];

    /// Human-readable file name used in messages
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::RobotsTxt => "robots.txt",
            Self::LlmsTxt => "llms.txt",
            Self::Sitemap => "sitemap.xml",
            Self::SecurityTxt => "security.txt",
            Self::Manifest => "web app manifest",
            Self::AdsTxt => "ads.txt",
            Self::HumansTxt => "humans.txt",
            Self::AiTxt => "ai.txt",
        }
    }

    /// Candidate URLs, in the order they are tried
    ///
    /// robots.txt always lives at the domain root. llms.txt is looked up
    /// under the target's base path first, then at the root.
    pub fn candidate_urls(&self, target: &AuditTarget) -> Vec<String> {
        let root = |path: &str| format!("{}{}", target.origin, path);

        match self {
            Self::RobotsTxt => vec![root("/robots.txt")],
            Self::LlmsTxt => {
                let mut urls = Vec::with_capacity(2);
                if !target.base_path.is_empty() {
                    urls.push(format!("{}{}/llms.txt", target.origin, target.base_path));
                }
                urls.push(root("/llms.txt"));
                urls
            }
            Self::Sitemap => vec![root("/sitemap.xml")],
            Self::SecurityTxt => vec![root("/.well-known/security.txt"), root("/security.txt")],
            Self::Manifest => vec![
                root("/manifest.json"),
                root("/site.webmanifest"),
                root("/manifest.webmanifest"),
            ],
            Self::AdsTxt => vec![root("/ads.txt")],
            Self::HumansTxt => vec![root("/humans.txt")],
            Self::AiTxt => vec![root("/ai.txt")],
        }
    }

    /// Content-shape sanity check gating "found"
    ///
    /// Sites commonly answer unknown paths with a 200 HTML page, so a
    /// successful status alone is not enough.
    ///
    /// An empty robots.txt is a valid file that allows everything; every
    /// other file must have content.
    pub fn accepts(&self, body: &str) -> bool {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            return *self == Self::RobotsTxt;
        }

        match self {
            Self::RobotsTxt | Self::LlmsTxt | Self::HumansTxt | Self::AiTxt => {
                !looks_like_html(trimmed)
            }
            Self::Sitemap => trimmed.contains("<urlset") || trimmed.contains("<sitemapindex"),
            Self::SecurityTxt => trimmed
                .lines()
                .any(|line| line.trim_start().to_ascii_lowercase().starts_with("contact:")),
            Self::Manifest => is_web_manifest(trimmed),
            Self::AdsTxt => trimmed.contains(',') || trimmed.contains('#'),
        }
    }
}

impl fmt::Display for WellKnownResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

/// Fetches one resource, trying its candidate URLs in order
///
/// # Outcome
///
/// | Responses | Outcome |
/// |-----------|---------|
/// | Any candidate 2xx passing the sanity check | Found (first one wins) |
/// | Every candidate 404/410 or failing the check | Not found, no error |
/// | Some candidate failed otherwise | Not found, first failure kept |
pub async fn fetch_resource(
    client: &Client,
    resource: WellKnownResource,
    target: &AuditTarget,
    timeout: Duration,
) -> FetchOutcome {
    let mut first_error: Option<FetchError> = None;

    for url in resource.candidate_urls(target) {
        match fetch_text(client, &url, timeout).await {
            Ok(response) if response.is_success() => {
                if resource.accepts(&response.body) {
                    tracing::debug!("Found {} at {}", resource, url);
                    return FetchOutcome::found(url, response.body);
                }
                tracing::debug!("{} at {} failed the content check", resource, url);
            }
            Ok(response) if response.is_absent() => {
                tracing::trace!("{} not present at {}", resource, url);
            }
            Ok(response) => {
                tracing::debug!("{} at {} returned HTTP {}", resource, url, response.status);
                first_error.get_or_insert(FetchError::Status {
                    code: response.status,
                });
            }
            Err(failure) => {
                tracing::debug!("Fetching {} from {} failed: {}", resource, url, failure);
                first_error.get_or_insert(FetchError::Network {
                    kind: failure.kind,
                    message: failure.message,
                });
            }
        }
    }

    FetchOutcome::missing(first_error)
}

/// Fetches all eight resources concurrently
pub async fn fetch_all(
    client: &Client,
    target: &AuditTarget,
    timeout: Duration,
) -> BTreeMap<WellKnownResource, FetchOutcome> {
    let tasks = WellKnownResource::ALL.iter().map(|&resource| async move {
        let outcome = fetch_resource(client, resource, target, timeout).await;
        (resource, outcome)
    });

    join_all(tasks).await.into_iter().collect()
}

fn looks_like_html(body: &str) -> bool {
    let head: String = body.chars().take(64).collect::<String>().to_ascii_lowercase();
    head.starts_with("<!doctype html") || head.starts_with("<html")
}

fn is_web_manifest(body: &str) -> bool {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::Object(fields)) => {
            fields.contains_key("name") || fields.contains_key("short_name")
        }
        _ => false,
    }
}
