//! Bot access probe
//!
//! Unlike the rest of an audit, this request deliberately presents the probed
//! crawler's own user agent string, to see whether the server (or a CDN in
//! front of it) treats that crawler differently from what robots.txt says.

use crate::audit::fetcher::{send_get, NetworkErrorKind};
use crate::robots::find_agent;
use crate::url::normalize_input;
use crate::ScanError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Statuses servers use to turn crawlers away
const BLOCKING_STATUSES: &[u16] = &[401, 403, 406, 429, 451];

/// What the server did with the impersonated request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum BotAccess {
    /// 2xx/3xx response
    Accessible { status: u16 },
    /// Response typical of bot blocking
    Blocked { status: u16 },
    /// Some other status; says nothing about bot handling
    Inconclusive { status: u16 },
    /// The request failed
    Failed {
        kind: NetworkErrorKind,
        message: String,
    },
}

impl fmt::Display for BotAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accessible { status } => write!(f, "Accessible (HTTP {})", status),
            Self::Blocked { status } => write!(f, "Blocked (HTTP {})", status),
            Self::Inconclusive { status } => write!(f, "Inconclusive (HTTP {})", status),
            Self::Failed { kind, message } => write!(f, "Failed: {} ({})", kind, message),
        }
    }
}

/// Result of probing one URL as one crawler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotAccessReport {
    pub agent: String,
    pub user_agent: String,
    pub url: String,
    pub access: BotAccess,
}

/// Requests `input` while presenting `agent`'s user agent string
///
/// Known crawlers use their published user agent string; unknown names get a
/// generic `compatible` string carrying the name.
pub async fn probe_bot_access(
    client: &Client,
    input: &str,
    agent: &str,
    timeout: Duration,
) -> Result<BotAccessReport, ScanError> {
    let url = normalize_input(input)?;
    let user_agent = match find_agent(agent) {
        Some(profile) => profile.user_agent.to_string(),
        None => format!("Mozilla/5.0 (compatible; {})", agent),
    };

    tracing::debug!("Probing {} as {}", url, agent);

    let access = match send_get(client, url.as_str(), timeout, Some(&user_agent)).await {
        Ok(response) => classify_status(response.status().as_u16()),
        Err(failure) => BotAccess::Failed {
            kind: failure.kind,
            message: failure.message,
        },
    };

    Ok(BotAccessReport {
        agent: agent.to_string(),
        user_agent,
        url: url.to_string(),
        access,
    })
}

fn classify_status(status: u16) -> BotAccess {
    if (200..400).contains(&status) {
        BotAccess::Accessible { status }
    } else if BLOCKING_STATUSES.contains(&status) {
        BotAccess::Blocked { status }
    } else {
        BotAccess::Inconclusive { status }
    }
}
