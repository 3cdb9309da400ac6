//! Notification text for detected changes

use crate::changes::{ChangeRecord, ContentChange};
use crate::storage::{NewNotification, NotificationKind, NotificationPreference, RecurringScan};
use chrono::{DateTime, Utc};

/// Builds one notification per changed category the preferences enable
pub fn render_notifications(
    scan: &RecurringScan,
    scan_id: i64,
    changes: &ChangeRecord,
    prefs: &NotificationPreference,
    created_at: DateTime<Utc>,
) -> Vec<NewNotification> {
    let mut rendered = Vec::new();

    if let Some(change) = &changes.robots_txt {
        rendered.push((
            NotificationKind::RobotsTxt,
            format!("robots.txt changed on {}", scan.url),
            content_summary("robots.txt", change),
        ));
    }

    if let Some(change) = &changes.llms_txt {
        rendered.push((
            NotificationKind::LlmsTxt,
            format!("llms.txt changed on {}", scan.url),
            content_summary("llms.txt", change),
        ));
    }

    if let Some(permissions) = &changes.bot_permissions {
        let lines: Vec<String> = permissions
            .iter()
            .map(|change| format!("{}: {} → {}", change.agent, change.old, change.new))
            .collect();
        rendered.push((
            NotificationKind::BotPermissions,
            format!("Crawler permissions changed on {}", scan.url),
            lines.join("\n"),
        ));
    }

    if let Some(errors) = &changes.new_errors {
        rendered.push((
            NotificationKind::NewErrors,
            format!("New errors on {}", scan.url),
            errors.join("\n"),
        ));
    }

    rendered
        .into_iter()
        .filter(|(kind, _, _)| prefs.enables(*kind))
        .map(|(kind, title, message)| NewNotification {
            recurring_scan_id: scan.id,
            scan_id,
            kind,
            title,
            message,
            created_at,
        })
        .collect()
}

fn content_summary(file: &str, change: &ContentChange) -> String {
    if change.old.is_empty() {
        return format!("{} appeared ({} lines)", file, change.new.lines().count());
    }
    if change.new.is_empty() {
        return format!("{} disappeared ({} lines removed)", file, change.old.lines().count());
    }
    format!(
        "{}: {} lines added, {} lines removed",
        file,
        change.lines_added(),
        change.lines_removed()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::changes::{PermissionChange, PermissionValue};
    use crate::robots::BotPermission;
    use crate::storage::Frequency;

    fn recurring_scan() -> RecurringScan {
        RecurringScan {
            id: 7,
            url: "example.com".to_string(),
            frequency: Frequency::Daily,
            active: true,
            last_scan_id: Some(1),
            last_run_at: None,
            next_run_at: Utc::now(),
            created_at: Utc::now(),
        }
    }

    fn all_changes() -> ChangeRecord {
        ChangeRecord {
            robots_txt: Some(ContentChange {
                old: "User-agent: *\nDisallow: /admin".to_string(),
                new: "User-agent: *".to_string(),
            }),
            llms_txt: Some(ContentChange {
                old: String::new(),
                new: "# Example\n> About".to_string(),
            }),
            bot_permissions: Some(vec![PermissionChange {
                agent: "GPTBot".to_string(),
                old: BotPermission::Restricted {
                    blocked: 1,
                    total: 5,
                }
                .into(),
                new: BotPermission::Allowed.into(),
            }]),
            new_errors: Some(vec!["ads.txt: DNS resolution failed (x)".to_string()]),
            has_changes: true,
        }
    }

    #[test]
    fn test_one_notification_per_category() {
        let notifications = render_notifications(
            &recurring_scan(),
            2,
            &all_changes(),
            &NotificationPreference::all_enabled(7),
            Utc::now(),
        );

        let kinds: Vec<NotificationKind> = notifications.iter().map(|n| n.kind).collect();
        assert_eq!(
            kinds,
            vec![
                NotificationKind::RobotsTxt,
                NotificationKind::LlmsTxt,
                NotificationKind::BotPermissions,
                NotificationKind::NewErrors,
            ]
        );
        assert!(notifications.iter().all(|n| n.recurring_scan_id == 7 && n.scan_id == 2));

        assert_eq!(
            notifications[0].message,
            "robots.txt: 0 lines added, 1 lines removed"
        );
        assert_eq!(notifications[1].message, "llms.txt appeared (2 lines)");
        assert_eq!(
            notifications[2].message,
            "GPTBot: Restricted (1/5 paths blocked) → Allowed"
        );
    }

    #[test]
    fn test_disabled_categories_are_skipped() {
        let prefs = NotificationPreference {
            robots_txt: false,
            new_errors: false,
            ..NotificationPreference::all_enabled(7)
        };

        let notifications =
            render_notifications(&recurring_scan(), 2, &all_changes(), &prefs, Utc::now());
        let kinds: Vec<NotificationKind> = notifications.iter().map(|n| n.kind).collect();
        assert_eq!(
            kinds,
            vec![NotificationKind::LlmsTxt, NotificationKind::BotPermissions]
        );
    }

    #[test]
    fn test_no_changes_no_notifications() {
        let notifications = render_notifications(
            &recurring_scan(),
            2,
            &ChangeRecord::default(),
            &NotificationPreference::all_enabled(7),
            Utc::now(),
        );
        assert!(notifications.is_empty());
    }

    #[test]
    fn test_removed_agent_rendered_with_sentinel() {
        let changes = ChangeRecord {
            bot_permissions: Some(vec![PermissionChange {
                agent: "OldBot".to_string(),
                old: BotPermission::Blocked.into(),
                new: PermissionValue::Removed,
            }]),
            has_changes: true,
            ..ChangeRecord::default()
        };

        let notifications = render_notifications(
            &recurring_scan(),
            2,
            &changes,
            &NotificationPreference::all_enabled(7),
            Utc::now(),
        );
        assert_eq!(notifications[0].message, "OldBot: Blocked → Removed");
    }
}
