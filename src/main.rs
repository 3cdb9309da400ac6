//! Botwatch main entry point
//!
//! This is the command-line interface for the Botwatch well-known file auditor.

use anyhow::{bail, Context};
use botwatch::audit::{AuditSnapshot, Scanner, WellKnownResource};
use botwatch::config::{load_config_with_hash, Config};
use botwatch::scheduler::RecurringScheduler;
use botwatch::storage::{
    open_storage, Frequency, NotificationKind, NotificationPreference, SqliteStorage, Storage,
};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

/// Botwatch: audits how a website treats AI crawlers
///
/// Botwatch reads a site's robots.txt and companion well-known files,
/// reports which crawlers may access it, and watches sites for changes.
#[derive(Parser, Debug)]
#[command(name = "botwatch")]
#[command(version)]
#[command(about = "Audits robots.txt and well-known files for AI crawler access", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults apply when omitted)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Audit one site and print the result
    Scan {
        url: String,

        /// Print the snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// Request a page while presenting a crawler's user agent
    Probe { url: String, agent: String },

    /// Manage recurring watches
    #[command(subcommand)]
    Watch(WatchCommand),

    /// Run the recurring scheduler
    Run {
        /// Run a single tick and exit
        #[arg(long)]
        once: bool,
    },
}

#[derive(Subcommand, Debug)]
enum WatchCommand {
    /// Start watching a site
    Add {
        url: String,

        /// daily, weekly or monthly
        #[arg(long, default_value = "daily")]
        frequency: Frequency,
    },
    /// List all watches
    List,
    /// Pause a watch
    Pause { id: i64 },
    /// Resume a paused watch
    Resume { id: i64 },
    /// Delete a watch and its notifications
    Remove { id: i64 },
    /// Show notifications for a watch
    Notifications { id: i64 },
    /// Choose which change categories notify for a watch
    Notify {
        id: i64,

        /// Category to turn on: robots_txt, llms_txt, bot_permissions or new_errors
        #[arg(long, value_name = "KIND")]
        enable: Vec<NotificationKind>,

        /// Category to turn off
        #[arg(long, value_name = "KIND")]
        disable: Vec<NotificationKind>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    match cli.command {
        Command::Scan { url, json } => handle_scan(&config, &url, json).await,
        Command::Probe { url, agent } => handle_probe(&config, &url, &agent).await,
        Command::Watch(command) => handle_watch(&config, command),
        Command::Run { once } => handle_run(config, once).await,
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("botwatch=info,warn"),
            1 => EnvFilter::new("botwatch=debug,info"),
            2 => EnvFilter::new("botwatch=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

fn open_configured_storage(config: &Config) -> anyhow::Result<SqliteStorage> {
    let path = Path::new(&config.storage.database_path);
    open_storage(path).with_context(|| format!("failed to open database {}", path.display()))
}

/// Handles `scan`: one audit, printed as a summary or JSON
async fn handle_scan(config: &Config, url: &str, json: bool) -> anyhow::Result<()> {
    let scanner = Scanner::new(config)?;
    let snapshot = scanner.scan(url).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print_snapshot(&snapshot);
    }

    Ok(())
}

fn print_snapshot(snapshot: &AuditSnapshot) {
    let target = snapshot.target();
    println!("=== Botwatch Audit ===\n");
    println!("Input:  {}", target.input);
    println!(
        "Origin: {}{}{}",
        target.origin,
        target.base_path,
        if target.canonicalized {
            ""
        } else {
            " (not canonicalized)"
        }
    );

    println!("\nWell-known files:");
    for resource in WellKnownResource::ALL {
        let line = match snapshot.file(resource) {
            Some(outcome) if outcome.found => {
                format!("✓ {}", outcome.url.as_deref().unwrap_or_default())
            }
            Some(outcome) => match &outcome.error {
                Some(error) => format!("✗ {}", error),
                None => "✗ not found".to_string(),
            },
            None => "✗ not found".to_string(),
        };
        println!("  {:<14} {}", resource.file_name(), line);
    }

    println!("\nCrawler permissions:");
    for (agent, permission) in snapshot.bot_permissions() {
        println!("  {:<20} {}", agent, permission);
    }

    if !snapshot.sitemap_urls().is_empty() {
        println!("\nDeclared sitemaps:");
        for sitemap in snapshot.sitemap_urls() {
            println!("  - {}", sitemap);
        }
    }

    if !snapshot.crawl_delays().is_empty() {
        println!("\nCrawl delays:");
        for (agent, seconds) in snapshot.crawl_delays() {
            println!("  {:<20} {}s", agent, seconds);
        }
    }

    if !snapshot.warnings().is_empty() {
        println!("\nWarnings:");
        for warning in snapshot.warnings() {
            println!("  - {}", warning);
        }
    }

    if !snapshot.errors().is_empty() {
        println!("\nErrors:");
        for error in snapshot.errors() {
            println!("  - {}", error);
        }
    }
}

/// Handles `probe`: one request as the named crawler
async fn handle_probe(config: &Config, url: &str, agent: &str) -> anyhow::Result<()> {
    let scanner = Scanner::new(config)?;
    let report = scanner.probe(url, agent).await?;

    println!("URL:        {}", report.url);
    println!("Agent:      {}", report.agent);
    println!("User agent: {}", report.user_agent);
    println!("Result:     {}", report.access);

    Ok(())
}

/// Handles `watch` subcommands
fn handle_watch(config: &Config, command: WatchCommand) -> anyhow::Result<()> {
    let mut storage = open_configured_storage(config)?;

    match command {
        WatchCommand::Add { url, frequency } => {
            let normalized = botwatch::url::normalize_input(&url)?;
            let id = storage.create_recurring_scan(normalized.as_str(), frequency, Utc::now())?;
            println!("✓ Watching {} ({}) as #{}", normalized, frequency, id);
        }
        WatchCommand::List => {
            let scans = storage.list_recurring_scans()?;
            if scans.is_empty() {
                println!("No watches");
            }
            for scan in scans {
                println!(
                    "#{:<4} {:<40} {:<8} {:<7} next run {}",
                    scan.id,
                    scan.url,
                    scan.frequency,
                    if scan.active { "active" } else { "paused" },
                    scan.next_run_at.format("%Y-%m-%d %H:%M UTC")
                );
            }
        }
        WatchCommand::Pause { id } => {
            storage.set_recurring_scan_active(id, false)?;
            println!("✓ Paused #{}", id);
        }
        WatchCommand::Resume { id } => {
            storage.set_recurring_scan_active(id, true)?;
            println!("✓ Resumed #{}", id);
        }
        WatchCommand::Remove { id } => {
            storage.delete_recurring_scan(id)?;
            println!("✓ Removed #{}", id);
        }
        WatchCommand::Notifications { id } => {
            if storage.get_recurring_scan(id)?.is_none() {
                bail!("no watch with id {}", id);
            }
            let notifications = storage.list_notifications(id)?;
            if notifications.is_empty() {
                println!("No notifications for #{}", id);
            }
            for notification in notifications {
                println!(
                    "[{}] {}\n{}\n",
                    notification.created_at.format("%Y-%m-%d %H:%M UTC"),
                    notification.title,
                    notification.message
                );
            }
        }
        WatchCommand::Notify {
            id,
            enable,
            disable,
        } => {
            if storage.get_recurring_scan(id)?.is_none() {
                bail!("no watch with id {}", id);
            }
            let mut prefs = storage
                .get_notification_preference_by_recurring_scan_id(id)?
                .unwrap_or_else(|| NotificationPreference::all_enabled(id));
            for kind in enable {
                prefs.set(kind, true);
            }
            for kind in disable {
                prefs.set(kind, false);
            }
            storage.set_notification_preference(&prefs)?;

            println!("Notifications for #{}:", id);
            for kind in [
                NotificationKind::RobotsTxt,
                NotificationKind::LlmsTxt,
                NotificationKind::BotPermissions,
                NotificationKind::NewErrors,
            ] {
                println!(
                    "  {:<16} {}",
                    kind,
                    if prefs.enables(kind) { "on" } else { "off" }
                );
            }
        }
    }

    Ok(())
}

/// Handles `run`: the recurring scheduler
async fn handle_run(config: Config, once: bool) -> anyhow::Result<()> {
    let storage = Arc::new(Mutex::new(open_configured_storage(&config)?));
    let scanner = Arc::new(Scanner::new(&config)?);
    let scheduler = RecurringScheduler::from_config(&config.scheduler, storage, scanner);

    if once {
        let report = scheduler.run_tick().await?;
        println!(
            "Tick: {} due, {} succeeded, {} failed, {} notifications",
            report.due, report.succeeded, report.failed, report.notifications
        );
        return Ok(());
    }

    tokio::select! {
        _ = scheduler.run() => {}
        result = tokio::signal::ctrl_c() => {
            result.context("failed to listen for shutdown signal")?;
            tracing::info!("Shutting down scheduler");
        }
    }

    Ok(())
}
