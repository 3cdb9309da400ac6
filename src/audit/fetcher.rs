//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests made by an audit, including:
//! - Building HTTP clients with the service's own user agent string
//! - Hard per-request timeouts
//! - Network error classification

use crate::config::UserAgentConfig;
use reqwest::{header::USER_AGENT, redirect::Policy, Client, Response};
use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;

/// Maximum number of redirects followed per request
const MAX_REDIRECTS: usize = 10;

const DNS_PATTERNS: &[&str] = &[
    "dns error",
    "failed to lookup address",
    "name or service not known",
    "no such host",
    "nodename nor servname",
    "temporary failure in name resolution",
];

const TIMEOUT_PATTERNS: &[&str] = &["timed out", "timeout", "deadline has elapsed"];

const TLS_PATTERNS: &[&str] = &["certificate", "tls", "ssl", "handshake"];

const NETWORK_PATTERNS: &[&str] = &["connection", "network", "broken pipe", "unreachable"];

/// Classified network failure, in classification priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkErrorKind {
    Dns,
    Timeout,
    ConnectionRefused,
    Tls,
    Network,
    Unclassified,
}

impl NetworkErrorKind {
    /// Returns true if a failure of this kind during the canonicalization
    /// probe makes the whole target unreachable
    pub fn is_critical(&self) -> bool {
        !matches!(self, Self::Unclassified)
    }
}

impl fmt::Display for NetworkErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Dns => "DNS resolution failed",
            Self::Timeout => "Connection timed out",
            Self::ConnectionRefused => "Connection refused",
            Self::Tls => "TLS/SSL certificate error",
            Self::Network => "Network error",
            Self::Unclassified => "Unexpected error",
        };
        f.write_str(label)
    }
}

/// A failed request, classified
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkFailure {
    pub kind: NetworkErrorKind,
    pub message: String,
}

impl NetworkFailure {
    fn timed_out(timeout: Duration) -> Self {
        Self {
            kind: NetworkErrorKind::Timeout,
            message: format!("no response within {}ms", timeout.as_millis()),
        }
    }

    fn from_reqwest(err: &reqwest::Error) -> Self {
        Self {
            kind: classify_error(err),
            message: error_chain(err),
        }
    }
}

impl fmt::Display for NetworkFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// A fully read text response
#[derive(Debug, Clone)]
pub struct TextResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body
    pub body: String,
}

impl TextResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// 404 and 410 mean the file simply does not exist
    pub fn is_absent(&self) -> bool {
        self.status == 404 || self.status == 410
    }
}

/// Builds an HTTP client with proper configuration
///
/// Redirects are followed (up to 10 hops). Timeouts are applied per request
/// by the callers so that each one is a hard cancellation.
///
/// # Example
///
/// ```no_run
/// use botwatch::config::UserAgentConfig;
/// use botwatch::audit::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Sends a GET request and returns once the response headers arrive
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - The URL to request
/// * `timeout` - Hard bound on the request
/// * `user_agent` - Overrides the client's user agent when set
pub async fn send_get(
    client: &Client,
    url: &str,
    timeout: Duration,
    user_agent: Option<&str>,
) -> Result<Response, NetworkFailure> {
    let mut request = client.get(url);
    if let Some(agent) = user_agent {
        request = request.header(USER_AGENT, agent);
    }

    match tokio::time::timeout(timeout, request.send()).await {
        Ok(Ok(response)) => Ok(response),
        Ok(Err(e)) => Err(NetworkFailure::from_reqwest(&e)),
        Err(_) => Err(NetworkFailure::timed_out(timeout)),
    }
}

/// Fetches a URL and reads its body as text
///
/// The timeout covers both the request and reading the body.
pub async fn fetch_text(
    client: &Client,
    url: &str,
    timeout: Duration,
) -> Result<TextResponse, NetworkFailure> {
    let request = async {
        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| NetworkFailure::from_reqwest(&e))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| NetworkFailure::from_reqwest(&e))?;
        Ok(TextResponse { status, body })
    };

    match tokio::time::timeout(timeout, request).await {
        Ok(result) => result,
        Err(_) => Err(NetworkFailure::timed_out(timeout)),
    }
}

/// Classifies a reqwest error
///
/// The error's source chain is inspected (the top-level message embeds the
/// request URL, so it is left out). Classes are checked in priority order:
/// DNS, timeout, connection refused, TLS, generic network.
pub fn classify_error(err: &reqwest::Error) -> NetworkErrorKind {
    let chain = err
        .source()
        .map(|source| error_chain(source).to_lowercase())
        .unwrap_or_default();

    if contains_any(&chain, DNS_PATTERNS) {
        NetworkErrorKind::Dns
    } else if err.is_timeout() || contains_any(&chain, TIMEOUT_PATTERNS) {
        NetworkErrorKind::Timeout
    } else if chain.contains("connection refused") {
        NetworkErrorKind::ConnectionRefused
    } else if contains_any(&chain, TLS_PATTERNS) {
        NetworkErrorKind::Tls
    } else if err.is_redirect() || err.is_decode() || err.is_builder() {
        NetworkErrorKind::Unclassified
    } else if err.is_connect() || err.is_request() || contains_any(&chain, NETWORK_PATTERNS) {
        NetworkErrorKind::Network
    } else {
        NetworkErrorKind::Unclassified
    }
}

/// Joins an error and all of its sources into one message
fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}
