//! Change detection between two audits of the same site
//!
//! [`detect_changes`] is a pure function: given the same pair of snapshots it
//! always produces the same [`ChangeRecord`].

mod render;

pub use render::render_notifications;

use crate::audit::AuditSnapshot;
use crate::robots::BotPermission;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A content file that differs between two audits (normalized text)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentChange {
    pub old: String,
    pub new: String,
}

impl ContentChange {
    /// Lines present in the new content and not in the old
    pub fn lines_added(&self) -> usize {
        line_difference(&self.new, &self.old)
    }

    /// Lines present in the old content and not in the new
    pub fn lines_removed(&self) -> usize {
        line_difference(&self.old, &self.new)
    }
}

/// Counts lines of `left` that `right` does not account for, with multiplicity
fn line_difference(left: &str, right: &str) -> usize {
    let mut remaining: BTreeMap<&str, usize> = BTreeMap::new();
    for line in right.lines() {
        *remaining.entry(line).or_default() += 1;
    }

    left.lines()
        .filter(|line| match remaining.get_mut(line) {
            Some(count) if *count > 0 => {
                *count -= 1;
                false
            }
            _ => true,
        })
        .count()
}

/// One side of a permission change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PermissionValue {
    /// The agent was absent from the previous audit
    NotSet,
    /// The agent is absent from the current audit
    Removed,
    Set { permission: BotPermission },
}

impl From<BotPermission> for PermissionValue {
    fn from(permission: BotPermission) -> Self {
        Self::Set { permission }
    }
}

impl fmt::Display for PermissionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotSet => write!(f, "Not set"),
            Self::Removed => write!(f, "Removed"),
            Self::Set { permission } => write!(f, "{}", permission),
        }
    }
}

/// Verdict change for one agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionChange {
    pub agent: String,
    pub old: PermissionValue,
    pub new: PermissionValue,
}

/// Meaningful differences between two audits
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub robots_txt: Option<ContentChange>,
    pub llms_txt: Option<ContentChange>,
    pub bot_permissions: Option<Vec<PermissionChange>>,
    /// Errors present now that the previous audit did not report
    pub new_errors: Option<Vec<String>>,
    pub has_changes: bool,
}

impl ChangeRecord {
    pub fn robots_txt_changed(&self) -> bool {
        self.robots_txt.is_some()
    }

    pub fn llms_txt_changed(&self) -> bool {
        self.llms_txt.is_some()
    }

    pub fn bot_permissions_changed(&self) -> bool {
        self.bot_permissions.is_some()
    }

    pub fn has_new_errors(&self) -> bool {
        self.new_errors.is_some()
    }
}

/// Normalizes file content for comparison: CRLF becomes LF and surrounding
/// whitespace is trimmed; absent content is the empty string
pub fn normalize_content(content: Option<&str>) -> String {
    content
        .unwrap_or_default()
        .replace("\r\n", "\n")
        .trim()
        .to_string()
}

fn content_change(old: Option<&str>, new: Option<&str>) -> Option<ContentChange> {
    let old = normalize_content(old);
    let new = normalize_content(new);
    (old != new).then_some(ContentChange { old, new })
}

fn permission_changes(
    previous: &BTreeMap<String, BotPermission>,
    current: &BTreeMap<String, BotPermission>,
) -> Vec<PermissionChange> {
    let agents: BTreeSet<&String> = previous.keys().chain(current.keys()).collect();

    agents
        .into_iter()
        .filter_map(|agent| {
            let (old, new) = match (previous.get(agent), current.get(agent)) {
                (Some(old), Some(new)) if old == new => return None,
                (Some(old), Some(new)) => ((*old).into(), (*new).into()),
                (None, Some(new)) => (PermissionValue::NotSet, (*new).into()),
                (Some(old), None) => ((*old).into(), PermissionValue::Removed),
                (None, None) => return None,
            };
            Some(PermissionChange {
                agent: agent.clone(),
                old,
                new,
            })
        })
        .collect()
}

/// Compares a previous audit of a site with the current one
pub fn detect_changes(previous: &AuditSnapshot, current: &AuditSnapshot) -> ChangeRecord {
    let robots_txt = content_change(previous.robots_txt(), current.robots_txt());
    let llms_txt = content_change(previous.llms_txt(), current.llms_txt());

    let bot_permissions = Some(permission_changes(
        previous.bot_permissions(),
        current.bot_permissions(),
    ))
    .filter(|changes| !changes.is_empty());

    let known: BTreeSet<&String> = previous.errors().iter().collect();
    let new_errors = Some(
        current
            .errors()
            .iter()
            .filter(|error| !known.contains(error))
            .cloned()
            .collect::<Vec<_>>(),
    )
    .filter(|errors| !errors.is_empty());

    let has_changes = robots_txt.is_some()
        || llms_txt.is_some()
        || bot_permissions.is_some()
        || new_errors.is_some();

    ChangeRecord {
        robots_txt,
        llms_txt,
        bot_permissions,
        new_errors,
        has_changes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{AuditTarget, FetchError, FetchOutcome, NetworkErrorKind, WellKnownResource};
    use chrono::Utc;

    fn snapshot_with(robots: Option<&str>, llms: Option<&str>) -> AuditSnapshot {
        let mut files = BTreeMap::new();
        if let Some(content) = robots {
            files.insert(
                WellKnownResource::RobotsTxt,
                FetchOutcome::found("https://example.com/robots.txt", content),
            );
        }
        if let Some(content) = llms {
            files.insert(
                WellKnownResource::LlmsTxt,
                FetchOutcome::found("https://example.com/llms.txt", content),
            );
        }
        let target = AuditTarget::canonical(
            "example.com",
            "https://example.com".to_string(),
            String::new(),
        );
        AuditSnapshot::assemble(target, files, vec![], Utc::now())
    }

    #[test]
    fn test_normalize_content() {
        assert_eq!(normalize_content(None), "");
        assert_eq!(normalize_content(Some("  a\r\nb\r\n\n")), "a\nb");
    }

    #[test]
    fn test_whitespace_only_difference_is_not_a_change() {
        let previous = snapshot_with(Some("User-agent: *\r\nDisallow: /x\r\n"), Some("# Site"));
        let current = snapshot_with(Some("\nUser-agent: *\nDisallow: /x  "), Some("# Site\n\n"));

        let changes = detect_changes(&previous, &current);
        assert!(!changes.robots_txt_changed());
        assert!(!changes.llms_txt_changed());
        assert!(!changes.has_changes);
    }

    #[test]
    fn test_identical_snapshots_have_no_changes() {
        let previous = snapshot_with(Some("User-agent: GPTBot\nDisallow: /admin"), None);
        let current = snapshot_with(Some("User-agent: GPTBot\nDisallow: /admin"), None);

        let changes = detect_changes(&previous, &current);
        assert_eq!(changes, ChangeRecord::default());
    }

    #[test]
    fn test_removed_disallow_relaxes_permission() {
        let previous = snapshot_with(Some("User-agent: GPTBot\nDisallow: /admin"), None);
        let current = snapshot_with(Some("User-agent: GPTBot\nAllow: /"), None);

        let changes = detect_changes(&previous, &current);
        assert!(changes.has_changes);

        let robots = changes.robots_txt.as_ref().unwrap();
        assert_eq!(robots.lines_added(), 1);
        assert_eq!(robots.lines_removed(), 1);

        let permissions = changes.bot_permissions.as_ref().unwrap();
        let gpt = permissions.iter().find(|c| c.agent == "GPTBot").unwrap();
        assert_eq!(
            gpt.old,
            PermissionValue::from(BotPermission::Restricted {
                blocked: 1,
                total: 5
            })
        );
        assert_eq!(gpt.new, PermissionValue::from(BotPermission::Allowed));
    }

    #[test]
    fn test_detection_is_idempotent() {
        let previous = snapshot_with(Some("User-agent: *\nDisallow: /"), Some("old"));
        let current = snapshot_with(None, Some("new"));

        assert_eq!(
            detect_changes(&previous, &current),
            detect_changes(&previous, &current)
        );
    }

    #[test]
    fn test_appearing_and_disappearing_agents() {
        let previous = snapshot_with(Some("User-agent: OldBot\nDisallow: /"), None);
        let current = snapshot_with(Some("User-agent: NewBot\nDisallow: /admin"), None);

        let changes = detect_changes(&previous, &current);
        let permissions = changes.bot_permissions.unwrap();

        let old_bot = permissions.iter().find(|c| c.agent == "OldBot").unwrap();
        assert_eq!(old_bot.new, PermissionValue::Removed);
        assert_eq!(old_bot.new.to_string(), "Removed");

        let new_bot = permissions.iter().find(|c| c.agent == "NewBot").unwrap();
        assert_eq!(new_bot.old, PermissionValue::NotSet);
        assert_eq!(new_bot.old.to_string(), "Not set");
    }

    #[test]
    fn test_only_new_errors_reported() {
        let target = AuditTarget::canonical(
            "example.com",
            "https://example.com".to_string(),
            String::new(),
        );
        let failure = |message: &str| {
            FetchOutcome::missing(Some(FetchError::Network {
                kind: NetworkErrorKind::Timeout,
                message: message.to_string(),
            }))
        };

        let mut before = BTreeMap::new();
        before.insert(WellKnownResource::AdsTxt, failure("slow"));
        before.insert(WellKnownResource::AiTxt, failure("slow"));
        let previous = AuditSnapshot::assemble(target.clone(), before, vec![], Utc::now());

        let mut after = BTreeMap::new();
        after.insert(WellKnownResource::AdsTxt, failure("slow"));
        after.insert(WellKnownResource::HumansTxt, failure("slow"));
        let current = AuditSnapshot::assemble(target, after, vec![], Utc::now());

        let changes = detect_changes(&previous, &current);
        assert_eq!(
            changes.new_errors,
            Some(vec!["humans.txt: Connection timed out (slow)".to_string()])
        );
        assert!(changes.has_changes);
    }

    #[test]
    fn test_line_difference_counts_duplicates() {
        let change = ContentChange {
            old: "a\nb".to_string(),
            new: "a\nb\nb\nc".to_string(),
        };
        assert_eq!(change.lines_added(), 2);
        assert_eq!(change.lines_removed(), 0);
    }
}
