//! Canonicalization probe
//!
//! One GET against the normalized input, following redirects, decides which
//! origin the rest of the audit talks to.

use crate::audit::fetcher::send_get;
use crate::audit::AuditTarget;
use crate::url::{normalize_input, split_origin};
use crate::ScanError;
use reqwest::Client;
use std::time::Duration;

/// Result of the canonicalization probe
#[derive(Debug, Clone)]
pub struct Canonicalization {
    /// The resolved target
    pub target: AuditTarget,

    /// Set when the probe degraded and the original origin was kept
    pub warning: Option<String>,
}

/// Resolves user input into a canonical audit target
///
/// # Behavior
///
/// | Probe result | Outcome |
/// |--------------|---------|
/// | 2xx/3xx after redirects | Final URL's origin and path become canonical |
/// | 4xx/5xx | Original origin kept, warning recorded |
/// | Critical network error | Audit aborts with `ScanError::Unreachable` |
/// | Other network error | Original origin kept, warning recorded |
///
/// # Arguments
///
/// * `client` - HTTP client carrying the service's own user agent
/// * `input` - Free-form hostname or URL
/// * `timeout` - Hard bound on the probe
pub async fn canonicalize(
    client: &Client,
    input: &str,
    timeout: Duration,
) -> Result<Canonicalization, ScanError> {
    let url = normalize_input(input)?;
    let (origin, base_path) = split_origin(&url);

    match send_get(client, url.as_str(), timeout, None).await {
        Ok(response) => {
            let status = response.status();
            if status.is_client_error() || status.is_server_error() {
                tracing::warn!(
                    "Probe of {} returned HTTP {}, keeping original origin",
                    url,
                    status.as_u16()
                );
                return Ok(Canonicalization {
                    target: AuditTarget::uncanonicalized(input, origin, base_path),
                    warning: Some(format!(
                        "Initial request to {} returned HTTP {}; using the original URL",
                        url,
                        status.as_u16()
                    )),
                });
            }

            let (final_origin, final_path) = split_origin(response.url());
            if final_origin != origin {
                tracing::info!("{} redirected to origin {}", url, final_origin);
            }

            Ok(Canonicalization {
                target: AuditTarget::canonical(input, final_origin, final_path),
                warning: None,
            })
        }
        Err(failure) if failure.kind.is_critical() => {
            tracing::error!("Probe of {} failed: {}", url, failure);
            Err(ScanError::Unreachable {
                url: url.to_string(),
                kind: failure.kind,
                message: failure.message,
            })
        }
        Err(failure) => {
            tracing::warn!("Probe of {} degraded: {}", url, failure);
            Ok(Canonicalization {
                target: AuditTarget::uncanonicalized(input, origin, base_path),
                warning: Some(format!(
                    "Could not resolve redirects for {} ({}); using the original URL",
                    url, failure
                )),
            })
        }
    }
}
