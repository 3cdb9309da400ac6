//! Crawler permission verdicts
//!
//! Verdicts are a sampled approximation: each agent's rules are tested against
//! a fixed handful of representative paths rather than interpreted in full.

use crate::robots::agents::{ai_agents, is_crawler_name};
use crate::robots::parser::RobotsDirectives;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Paths every agent is tested against
pub const SAMPLE_PATHS: [&str; 5] = ["/", "/api", "/admin", "/search", "/content"];

/// What robots.txt lets one crawler do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BotPermission {
    Allowed,
    /// Some sample paths blocked
    Restricted { blocked: usize, total: usize },
    Blocked,
}

impl fmt::Display for BotPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allowed => write!(f, "Allowed"),
            Self::Restricted { blocked, total } => {
                write!(f, "Restricted ({}/{} paths blocked)", blocked, total)
            }
            Self::Blocked => write!(f, "Blocked"),
        }
    }
}

/// Verdict for one agent token
///
/// A blocked `/` decides the verdict outright. Otherwise the verdict counts
/// the blocked sample paths.
pub fn evaluate_agent(directives: &RobotsDirectives, agent: &str) -> BotPermission {
    let token = product_token(agent);
    if !directives.is_allowed(token, "/") {
        return BotPermission::Blocked;
    }

    let total = SAMPLE_PATHS.len();
    let blocked = SAMPLE_PATHS
        .iter()
        .filter(|path| !directives.is_allowed(token, path))
        .count();

    match blocked {
        0 => BotPermission::Allowed,
        n => BotPermission::Restricted { blocked: n, total },
    }
}

/// Leading name part of a user-agent token (`bingbot/2.0` -> `bingbot`)
fn product_token(agent: &str) -> &str {
    agent
        .split(|c: char| !(c.is_ascii_alphabetic() || c == '-' || c == '_'))
        .next()
        .filter(|token| !token.is_empty())
        .unwrap_or(agent)
}

/// Verdicts for the AI crawler roster plus every crawler-like agent the file
/// names
///
/// Discovered agents are keyed by the token as written in the file. The
/// wildcard group is never reported as an agent of its own.
pub fn evaluate_permissions(directives: &RobotsDirectives) -> BTreeMap<String, BotPermission> {
    let roster = ai_agents().map(|agent| agent.name.to_string());
    let discovered = directives
        .agents()
        .iter()
        .filter(|name| is_crawler_name(name))
        .cloned();

    let mut permissions = BTreeMap::new();
    for agent in roster.chain(discovered) {
        let already_listed = permissions
            .keys()
            .any(|key: &String| key.eq_ignore_ascii_case(&agent));
        if !already_listed {
            let verdict = evaluate_agent(directives, &agent);
            permissions.insert(agent, verdict);
        }
    }
    permissions
}

/// Verdicts used when a site has no robots.txt: every AI crawler is allowed
pub fn default_permissions() -> BTreeMap<String, BotPermission> {
    ai_agents()
        .map(|agent| (agent.name.to_string(), BotPermission::Allowed))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_disallow_all_blocks_everyone() {
        let directives = RobotsDirectives::parse("User-agent: *\nDisallow: /");
        let permissions = evaluate_permissions(&directives);

        assert!(!permissions.is_empty());
        assert!(permissions
            .values()
            .all(|verdict| *verdict == BotPermission::Blocked));
    }

    #[test]
    fn test_single_path_restricted() {
        let directives = RobotsDirectives::parse("User-agent: GPTBot\nDisallow: /admin");

        assert_eq!(
            evaluate_agent(&directives, "GPTBot"),
            BotPermission::Restricted {
                blocked: 1,
                total: 5
            }
        );
        assert_eq!(evaluate_agent(&directives, "CCBot"), BotPermission::Allowed);
    }

    #[test]
    fn test_own_empty_block_overrides_wildcard() {
        let directives =
            RobotsDirectives::parse("User-agent: GPTBot\nDisallow:\n\nUser-agent: *\nDisallow: /");

        assert_eq!(evaluate_agent(&directives, "GPTBot"), BotPermission::Allowed);
        assert_eq!(evaluate_agent(&directives, "CCBot"), BotPermission::Blocked);
    }

    #[test]
    fn test_blocked_root_wins_over_allowed_paths() {
        let directives =
            RobotsDirectives::parse("User-agent: CCBot\nDisallow: /\nAllow: /content");

        assert_eq!(evaluate_agent(&directives, "CCBot"), BotPermission::Blocked);
    }

    #[test]
    fn test_anchored_root_block_is_blocked() {
        let directives = RobotsDirectives::parse("User-agent: *\nDisallow: /$");

        assert_eq!(evaluate_agent(&directives, "GPTBot"), BotPermission::Blocked);
    }

    #[test]
    fn test_allow_carves_out_sample_path() {
        let directives = RobotsDirectives::parse(
            "User-agent: CCBot\nDisallow: /api\nDisallow: /admin\nAllow: /admin/public",
        );

        assert_eq!(
            evaluate_agent(&directives, "CCBot"),
            BotPermission::Restricted {
                blocked: 2,
                total: 5
            }
        );
    }

    #[test]
    fn test_versioned_token_matches_its_group() {
        let directives = RobotsDirectives::parse("User-agent: bingbot\nDisallow: /");

        assert_eq!(evaluate_agent(&directives, "bingbot/2.0"), BotPermission::Blocked);
        assert_eq!(product_token("bingbot/2.0"), "bingbot");
        assert_eq!(product_token("Google-Extended"), "Google-Extended");
    }

    #[test]
    fn test_root_not_blocked_is_never_blocked() {
        let directives = RobotsDirectives::parse(
            "User-agent: *\nDisallow: /api\nDisallow: /admin\nDisallow: /search\nDisallow: /content",
        );

        assert_eq!(
            evaluate_agent(&directives, "GPTBot"),
            BotPermission::Restricted {
                blocked: 4,
                total: 5
            }
        );
    }

    #[test]
    fn test_discovered_crawlers_included() {
        let directives =
            RobotsDirectives::parse("User-agent: SemrushBot\nDisallow: /\n\nUser-agent: Mediapartners-Google\nDisallow: /");
        let permissions = evaluate_permissions(&directives);

        assert_eq!(permissions.get("SemrushBot"), Some(&BotPermission::Blocked));
        assert!(!permissions.contains_key("Mediapartners-Google"));
        assert!(!permissions.contains_key("*"));
        assert_eq!(permissions.get("GPTBot"), Some(&BotPermission::Allowed));
    }

    #[test]
    fn test_roster_agent_in_other_case_not_duplicated() {
        let directives = RobotsDirectives::parse("User-agent: gptbot\nDisallow: /");
        let permissions = evaluate_permissions(&directives);

        assert_eq!(permissions.get("GPTBot"), Some(&BotPermission::Blocked));
        assert!(!permissions.contains_key("gptbot"));
    }

    #[test]
    fn test_default_permissions_allow_ai_roster() {
        let permissions = default_permissions();
        assert_eq!(permissions.get("GPTBot"), Some(&BotPermission::Allowed));
        assert_eq!(permissions.get("CCBot"), Some(&BotPermission::Allowed));
        assert_eq!(permissions.get("anthropic-ai"), Some(&BotPermission::Allowed));
        assert!(!permissions.contains_key("Googlebot"));
    }

    #[test]
    fn test_display() {
        assert_eq!(
            BotPermission::Restricted {
                blocked: 1,
                total: 5
            }
            .to_string(),
            "Restricted (1/5 paths blocked)"
        );
        assert_eq!(BotPermission::Blocked.to_string(), "Blocked");
    }
}
