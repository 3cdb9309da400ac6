//! Recurring scan scheduler
//!
//! On every tick the scheduler asks storage for the watches that are due,
//! audits them concurrently under a shared limit, stores the snapshots,
//! compares each with the previous one and records notifications. Every
//! processed watch is rescheduled whether its audit succeeded or not.

mod clock;

pub use clock::{Clock, ManualClock, SystemClock};

use crate::audit::{AuditSnapshot, Scanner};
use crate::changes::{detect_changes, render_notifications};
use crate::config::SchedulerConfig;
use crate::storage::{
    NotificationPreference, RecurringScan, RecurringScanUpdate, Storage, StorageError,
};
use crate::{BotwatchError, ScanError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;

/// Runs one audit for the scheduler
#[async_trait]
pub trait Auditor: Send + Sync {
    async fn audit(&self, url: &str) -> Result<AuditSnapshot, ScanError>;
}

#[async_trait]
impl Auditor for Scanner {
    async fn audit(&self, url: &str) -> Result<AuditSnapshot, ScanError> {
        self.scan(url).await
    }
}

/// Summary of one tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Watches found due
    pub due: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Notifications stored across all watches
    pub notifications: usize,
    /// True when another tick was still running and this one did nothing
    pub skipped: bool,
}

/// Result of processing one due watch
#[derive(Debug, Clone, Copy)]
struct ScanOutcome {
    scan_id: i64,
    notifications: usize,
}

/// Drives recurring audits
pub struct RecurringScheduler<S, A> {
    storage: Arc<Mutex<S>>,
    auditor: Arc<A>,
    clock: Arc<dyn Clock>,
    limiter: Arc<Semaphore>,
    tick_interval: Duration,
    tick_in_progress: Arc<AtomicBool>,
}

impl<S, A> Clone for RecurringScheduler<S, A> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            auditor: Arc::clone(&self.auditor),
            clock: Arc::clone(&self.clock),
            limiter: Arc::clone(&self.limiter),
            tick_interval: self.tick_interval,
            tick_in_progress: Arc::clone(&self.tick_in_progress),
        }
    }
}

/// Clears the in-progress flag when a tick ends, even by panic
struct TickGuard<'a>(&'a AtomicBool);

impl Drop for TickGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl<S, A> RecurringScheduler<S, A>
where
    S: Storage + 'static,
    A: Auditor + 'static,
{
    /// Creates a scheduler from explicit collaborators
    ///
    /// # Arguments
    ///
    /// * `storage` - Shared storage handle
    /// * `auditor` - Runs the audits
    /// * `clock` - Time source for due checks and rescheduling
    /// * `limiter` - Bounds audits in flight across the whole tick
    /// * `tick_interval` - Period of [`RecurringScheduler::run`]
    pub fn new(
        storage: Arc<Mutex<S>>,
        auditor: Arc<A>,
        clock: Arc<dyn Clock>,
        limiter: Arc<Semaphore>,
        tick_interval: Duration,
    ) -> Self {
        Self {
            storage,
            auditor,
            clock,
            limiter,
            tick_interval,
            tick_in_progress: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Creates a scheduler on the system clock using configured limits
    pub fn from_config(config: &SchedulerConfig, storage: Arc<Mutex<S>>, auditor: Arc<A>) -> Self {
        Self::new(
            storage,
            auditor,
            Arc::new(SystemClock),
            Arc::new(Semaphore::new(config.max_concurrent_scans as usize)),
            config.tick_interval(),
        )
    }

    fn lock_storage(&self) -> Result<MutexGuard<'_, S>, StorageError> {
        self.storage.lock().map_err(|_| StorageError::LockPoisoned)
    }

    /// Runs ticks forever at the configured interval
    ///
    /// Ticks run inline, so a slow tick delays the next one; missed ticks
    /// are skipped rather than replayed.
    pub async fn run(&self) {
        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(
            "Scheduler started (tick every {:?}, {} concurrent audits)",
            self.tick_interval,
            self.limiter.available_permits()
        );

        loop {
            interval.tick().await;
            match self.run_tick().await {
                Ok(report) if report.due > 0 => tracing::info!(
                    "Tick finished: {} due, {} succeeded, {} failed, {} notifications",
                    report.due,
                    report.succeeded,
                    report.failed,
                    report.notifications
                ),
                Ok(_) => tracing::debug!("Tick finished: nothing due"),
                Err(e) => tracing::error!("Tick failed: {}", e),
            }
        }
    }

    /// Processes every watch that is due now
    ///
    /// # Returns
    ///
    /// * `Ok(TickReport)` - Counts for this tick; `skipped` is set when
    ///   another tick was already running
    /// * `Err(BotwatchError)` - The due watches could not be read
    pub async fn run_tick(&self) -> Result<TickReport, BotwatchError> {
        if self.tick_in_progress.swap(true, Ordering::SeqCst) {
            tracing::warn!("Previous tick still running, skipping");
            return Ok(TickReport {
                skipped: true,
                ..TickReport::default()
            });
        }
        let _guard = TickGuard(&self.tick_in_progress);

        let now = self.clock.now();
        let due = {
            let storage = self.lock_storage()?;
            storage.get_due_recurring_scans(now)?
        };

        let mut report = TickReport {
            due: due.len(),
            ..TickReport::default()
        };
        if due.is_empty() {
            return Ok(report);
        }

        tracing::info!("{} recurring scans due", due.len());

        let mut tasks = JoinSet::new();
        for scan in due {
            let scheduler = self.clone();
            tasks.spawn(async move {
                let id = scan.id;
                let url = scan.url.clone();
                let result = match Arc::clone(&scheduler.limiter).acquire_owned().await {
                    Ok(_permit) => scheduler.process_scan(scan).await,
                    Err(e) => Err(BotwatchError::Scheduler(format!(
                        "concurrency limiter closed: {}",
                        e
                    ))),
                };
                (id, url, result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, _, Ok(outcome))) => {
                    report.succeeded += 1;
                    report.notifications += outcome.notifications;
                }
                Ok((id, url, Err(e))) => {
                    report.failed += 1;
                    tracing::warn!("Recurring scan {} ({}) failed: {}", id, url, e);
                }
                Err(e) => {
                    report.failed += 1;
                    tracing::error!("Recurring scan task aborted: {}", e);
                }
            }
        }

        Ok(report)
    }

    /// Audits one watch, then reschedules it regardless of the outcome
    async fn process_scan(&self, scan: RecurringScan) -> Result<ScanOutcome, BotwatchError> {
        tracing::debug!("Auditing recurring scan {} ({})", scan.id, scan.url);

        let auditor = Arc::clone(&self.auditor);
        let url = scan.url.clone();
        // A panicking audit surfaces as a JoinError so the watch still gets rescheduled
        let audited = match tokio::spawn(async move { auditor.audit(&url).await }).await {
            Ok(result) => result.map_err(BotwatchError::from),
            Err(e) => Err(BotwatchError::Scheduler(format!("audit task failed: {}", e))),
        };

        let result = audited.and_then(|snapshot| self.record_audit(&scan, &snapshot));

        let finished_at = self.clock.now();
        let update = RecurringScanUpdate {
            last_scan_id: result.as_ref().ok().map(|outcome| outcome.scan_id),
            last_run_at: finished_at,
            next_run_at: scan.frequency.next_run_after(finished_at),
        };
        {
            let mut storage = self.lock_storage()?;
            storage.update_recurring_scan(scan.id, &update)?;
        }

        tracing::debug!(
            "Recurring scan {} next runs at {}",
            scan.id,
            update.next_run_at
        );

        result
    }

    /// Stores a snapshot and the notifications for what changed since the
    /// previous one
    fn record_audit(
        &self,
        scan: &RecurringScan,
        snapshot: &AuditSnapshot,
    ) -> Result<ScanOutcome, BotwatchError> {
        let mut storage = self.lock_storage()?;
        let scan_id = storage.create_scan(snapshot)?;

        let previous = match scan.last_scan_id {
            Some(previous_id) => storage.get_scan(previous_id)?,
            None => None,
        };
        let Some(previous) = previous else {
            tracing::debug!("No previous audit for recurring scan {}", scan.id);
            return Ok(ScanOutcome {
                scan_id,
                notifications: 0,
            });
        };

        let changes = detect_changes(&previous.snapshot, snapshot);
        if !changes.has_changes {
            return Ok(ScanOutcome {
                scan_id,
                notifications: 0,
            });
        }

        let prefs = storage
            .get_notification_preference_by_recurring_scan_id(scan.id)?
            .unwrap_or_else(|| NotificationPreference::all_enabled(scan.id));

        let notifications =
            render_notifications(scan, scan_id, &changes, &prefs, self.clock.now());
        for notification in &notifications {
            storage.create_notification(notification)?;
        }

        tracing::info!(
            "Recurring scan {} ({}) changed: {} notifications",
            scan.id,
            scan.url,
            notifications.len()
        );

        Ok(ScanOutcome {
            scan_id,
            notifications: notifications.len(),
        })
    }
}
