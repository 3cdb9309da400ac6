//! Integration tests for audits
//!
//! These tests use wiremock to create mock HTTP servers and run full audits
//! against them end-to-end.

use botwatch::audit::{build_http_client, BotAccess, NetworkErrorKind, Scanner, WellKnownResource};
use botwatch::changes::PermissionValue;
use botwatch::config::{AuditConfig, UserAgentConfig};
use botwatch::robots::BotPermission;
use botwatch::{detect_changes, ScanError};
use std::time::Duration;
use wiremock::matchers::{header_regex, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a scanner with short timeouts
fn test_scanner(probe_timeout_ms: u64, fetch_timeout_ms: u64) -> Scanner {
    let user_agent = UserAgentConfig {
        crawler_name: "TestBot".to_string(),
        crawler_version: "1.0.0".to_string(),
        contact_url: "https://example.com/contact".to_string(),
        contact_email: "test@example.com".to_string(),
    };
    let client = build_http_client(&user_agent).expect("Failed to build client");
    Scanner::with_client(
        client,
        AuditConfig {
            probe_timeout_ms,
            fetch_timeout_ms,
        },
    )
}

async fn mount_text(server: &MockServer, at: &str, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

async fn mount_home(server: &MockServer) {
    mount_text(server, "/", 200, "<html><body>Home</body></html>").await;
}

#[tokio::test]
async fn test_site_without_any_files_allows_ai_crawlers() {
    let server = MockServer::start().await;
    mount_home(&server).await;

    let snapshot = test_scanner(2000, 2000).scan(&server.uri()).await.unwrap();

    assert!(snapshot.target().canonicalized);
    assert!(!snapshot.robots_txt_found());
    assert!(snapshot.files().values().all(|outcome| !outcome.found));
    assert!(snapshot.errors().is_empty());
    for agent in ["GPTBot", "CCBot", "anthropic-ai"] {
        assert_eq!(snapshot.permission(agent), Some(BotPermission::Allowed));
    }
}

#[tokio::test]
async fn test_robots_and_companion_files_found() {
    let server = MockServer::start().await;
    mount_home(&server).await;
    mount_text(
        &server,
        "/robots.txt",
        200,
        "User-agent: GPTBot\nDisallow: /\n\nUser-agent: *\nDisallow: /admin\n\nSitemap: https://example.com/sitemap.xml",
    )
    .await;
    mount_text(&server, "/llms.txt", 200, "# Example\n> An example site").await;
    mount_text(
        &server,
        "/sitemap.xml",
        200,
        r#"<?xml version="1.0"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9"></urlset>"#,
    )
    .await;
    mount_text(
        &server,
        "/.well-known/security.txt",
        200,
        "Contact: mailto:security@example.com",
    )
    .await;
    mount_text(&server, "/ads.txt", 200, "example.com, pub-0000, DIRECT").await;

    let snapshot = test_scanner(2000, 2000).scan(&server.uri()).await.unwrap();

    assert!(snapshot.robots_txt_found());
    assert!(snapshot.llms_txt_found());
    assert_eq!(snapshot.llms_txt(), Some("# Example\n> An example site"));
    assert!(snapshot.file(WellKnownResource::Sitemap).unwrap().found);
    assert!(snapshot.file(WellKnownResource::SecurityTxt).unwrap().found);
    assert!(snapshot.file(WellKnownResource::AdsTxt).unwrap().found);
    assert!(!snapshot.file(WellKnownResource::HumansTxt).unwrap().found);

    assert_eq!(snapshot.permission("GPTBot"), Some(BotPermission::Blocked));
    assert_eq!(
        snapshot.permission("CCBot"),
        Some(BotPermission::Restricted {
            blocked: 1,
            total: 5
        })
    );
    assert_eq!(snapshot.sitemap_urls(), ["https://example.com/sitemap.xml"]);
}

#[tokio::test]
async fn test_removed_disallow_detected_between_audits() {
    let server = MockServer::start().await;
    mount_home(&server).await;
    mount_text(&server, "/robots.txt", 200, "User-agent: GPTBot\nDisallow: /admin").await;

    let scanner = test_scanner(2000, 2000);
    let previous = scanner.scan(&server.uri()).await.unwrap();

    server.reset().await;
    mount_home(&server).await;
    mount_text(&server, "/robots.txt", 200, "User-agent: GPTBot\nAllow: /").await;

    let current = scanner.scan(&server.uri()).await.unwrap();
    let changes = detect_changes(&previous, &current);

    assert!(changes.has_changes);
    assert!(changes.robots_txt_changed());

    let gpt = changes
        .bot_permissions
        .as_ref()
        .unwrap()
        .iter()
        .find(|change| change.agent == "GPTBot")
        .unwrap();
    assert_eq!(
        gpt.old,
        PermissionValue::from(BotPermission::Restricted {
            blocked: 1,
            total: 5
        })
    );
    assert_eq!(gpt.new, PermissionValue::from(BotPermission::Allowed));
}

#[tokio::test]
async fn test_redirect_moves_all_fetches_to_new_origin() {
    let old_site = MockServer::start().await;
    let new_site = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(301).insert_header("Location", format!("{}/", new_site.uri())),
        )
        .mount(&old_site)
        .await;
    mount_home(&new_site).await;
    mount_text(&new_site, "/robots.txt", 200, "User-agent: CCBot\nDisallow: /").await;

    let snapshot = test_scanner(2000, 2000).scan(&old_site.uri()).await.unwrap();

    assert_eq!(snapshot.target().origin, new_site.uri());
    assert!(snapshot.target().canonicalized);
    assert!(snapshot.robots_txt_found());
    assert_eq!(snapshot.permission("CCBot"), Some(BotPermission::Blocked));

    let old_requests = old_site.received_requests().await.unwrap();
    assert!(old_requests.iter().all(|request| request.url.path() == "/"));

    let new_requests = new_site.received_requests().await.unwrap();
    assert!(new_requests
        .iter()
        .any(|request| request.url.path() == "/robots.txt"));
}

#[tokio::test]
async fn test_probe_timeout_aborts_before_fetching_files() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;
    mount_text(&server, "/robots.txt", 200, "User-agent: *\nDisallow:").await;

    let result = test_scanner(200, 2000).scan(&server.uri()).await;

    match result {
        Err(ScanError::Unreachable { kind, .. }) => assert_eq!(kind, NetworkErrorKind::Timeout),
        other => panic!("expected unreachable error, got {:?}", other),
    }

    let requests = server.received_requests().await.unwrap();
    assert!(requests.iter().all(|request| request.url.path() == "/"));
}

#[tokio::test]
async fn test_connection_refused_is_unreachable() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let result = test_scanner(2000, 2000)
        .scan(&format!("http://127.0.0.1:{}", port))
        .await;

    match result {
        Err(ScanError::Unreachable { kind, .. }) => assert!(kind.is_critical()),
        other => panic!("expected unreachable error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_invalid_input_rejected() {
    let result = test_scanner(2000, 2000).scan("ftp://example.com").await;
    assert!(matches!(result, Err(ScanError::InvalidUrl(_))));
}

#[tokio::test]
async fn test_probe_error_status_keeps_original_origin() {
    let server = MockServer::start().await;
    mount_text(&server, "/", 503, "maintenance").await;
    mount_text(&server, "/robots.txt", 200, "User-agent: *\nDisallow: /").await;

    let snapshot = test_scanner(2000, 2000).scan(&server.uri()).await.unwrap();

    assert!(!snapshot.target().canonicalized);
    assert!(snapshot.warnings().iter().any(|w| w.contains("HTTP 503")));
    assert_eq!(snapshot.permission("GPTBot"), Some(BotPermission::Blocked));
}

#[tokio::test]
async fn test_llms_txt_prefers_base_path() {
    let server = MockServer::start().await;
    mount_text(&server, "/docs", 200, "<html>Docs</html>").await;
    mount_text(&server, "/docs/llms.txt", 200, "# Docs").await;
    mount_text(&server, "/llms.txt", 200, "# Root").await;

    let snapshot = test_scanner(2000, 2000)
        .scan(&format!("{}/docs/", server.uri()))
        .await
        .unwrap();

    assert_eq!(snapshot.target().base_path, "/docs");
    let llms = snapshot.file(WellKnownResource::LlmsTxt).unwrap();
    assert_eq!(llms.url.as_deref(), Some(format!("{}/docs/llms.txt", server.uri()).as_str()));
    assert_eq!(snapshot.llms_txt(), Some("# Docs"));
}

#[tokio::test]
async fn test_llms_txt_falls_back_to_root() {
    let server = MockServer::start().await;
    mount_text(&server, "/docs", 200, "<html>Docs</html>").await;
    mount_text(&server, "/llms.txt", 200, "# Root").await;

    let snapshot = test_scanner(2000, 2000)
        .scan(&format!("{}/docs", server.uri()))
        .await
        .unwrap();

    assert_eq!(snapshot.llms_txt(), Some("# Root"));
}

#[tokio::test]
async fn test_soft_404_and_invalid_manifest_not_found() {
    let server = MockServer::start().await;
    mount_home(&server).await;
    mount_text(
        &server,
        "/robots.txt",
        200,
        "<!DOCTYPE html><html><body>Not Found</body></html>",
    )
    .await;
    mount_text(&server, "/manifest.json", 200, "<html>oops</html>").await;
    mount_text(&server, "/site.webmanifest", 200, r#"{"short_name": "Example"}"#).await;

    let snapshot = test_scanner(2000, 2000).scan(&server.uri()).await.unwrap();

    assert!(!snapshot.robots_txt_found());
    let manifest = snapshot.file(WellKnownResource::Manifest).unwrap();
    assert!(manifest.found);
    assert_eq!(
        manifest.url.as_deref(),
        Some(format!("{}/site.webmanifest", server.uri()).as_str())
    );
}

#[tokio::test]
async fn test_empty_robots_txt_found_and_allows_all() {
    let server = MockServer::start().await;
    mount_home(&server).await;
    mount_text(&server, "/robots.txt", 200, "").await;
    mount_text(&server, "/humans.txt", 200, "").await;

    let snapshot = test_scanner(2000, 2000).scan(&server.uri()).await.unwrap();

    assert!(snapshot.robots_txt_found());
    assert_eq!(snapshot.robots_txt(), Some(""));
    assert!(!snapshot
        .warnings()
        .iter()
        .any(|w| w.starts_with("robots.txt not found")));
    assert!(!snapshot.file(WellKnownResource::HumansTxt).unwrap().found);
    for agent in ["GPTBot", "CCBot", "anthropic-ai"] {
        assert_eq!(snapshot.permission(agent), Some(BotPermission::Allowed));
    }
}

#[tokio::test]
async fn test_slow_and_failing_files_do_not_block_others() {
    let server = MockServer::start().await;
    mount_home(&server).await;
    mount_text(&server, "/robots.txt", 200, "User-agent: *\nAllow: /").await;
    mount_text(&server, "/humans.txt", 500, "error").await;
    Mock::given(method("GET"))
        .and(path("/ads.txt"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("example.com, pub-1, DIRECT")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let snapshot = test_scanner(2000, 300).scan(&server.uri()).await.unwrap();

    assert!(snapshot.robots_txt_found());
    assert!(!snapshot.file(WellKnownResource::AdsTxt).unwrap().found);
    assert_eq!(snapshot.errors().len(), 1);
    assert!(snapshot.errors()[0].starts_with("ads.txt: "));
    assert!(snapshot
        .warnings()
        .contains(&"humans.txt request returned HTTP 500".to_string()));
}

#[tokio::test]
async fn test_bot_access_probe_uses_agent_user_agent() {
    let server = MockServer::start().await;
    let gptbot = botwatch::robots::find_agent("GPTBot").unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header_regex("user-agent", "GPTBot/"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    mount_home(&server).await;

    let scanner = test_scanner(2000, 2000);

    let blocked = scanner.probe(&server.uri(), "GPTBot").await.unwrap();
    assert_eq!(blocked.user_agent, gptbot.user_agent);
    assert_eq!(blocked.access, BotAccess::Blocked { status: 403 });

    let allowed = scanner.probe(&server.uri(), "CCBot").await.unwrap();
    assert_eq!(allowed.access, BotAccess::Accessible { status: 200 });

    let unknown = scanner.probe(&server.uri(), "MadeUpBot").await.unwrap();
    assert_eq!(unknown.user_agent, "Mozilla/5.0 (compatible; MadeUpBot)");
}
