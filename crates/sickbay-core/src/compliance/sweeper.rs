//! Recurring compliance sweep.
//!
//! Each tick promotes overdue pending doses to missed and reminds caregivers
//! about doses whose reminder window is open. Ticks never overlap.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::Timelike;

use crate::clock::Clock;
use crate::config::{ReminderPolicy, SweepConfig};
use crate::db::{Database, DoseStore, PrescriptionStore, StockStore};
use crate::notify::{Notification, NotificationSink};

use super::{DoseTracker, TransitionOutcome};

/// Sleep granularity for shutdown responsiveness.
const SLEEP_GRANULARITY: Duration = Duration::from_millis(100);

/// Counts from one completed tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub missed: usize,
    pub reminders: usize,
    /// Records (or queries) whose processing failed; the rest still ran
    pub failures: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepOutcome {
    Completed(SweepReport),
    /// Another tick was still running.
    Skipped,
}

/// Compliance sweep state shared by every tick.
pub struct ComplianceSweeper {
    config: SweepConfig,
    running: AtomicBool,
    /// Doses already reminded in their current window (once-per-window policy)
    reminded: Mutex<HashSet<String>>,
}

/// Clears the running flag when a tick ends, including by panic.
struct TickGuard<'a>(&'a AtomicBool);

impl Drop for TickGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ComplianceSweeper {
    pub fn new(config: SweepConfig) -> Self {
        Self {
            config,
            running: AtomicBool::new(false),
            reminded: Mutex::new(HashSet::new()),
        }
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// Run one sweep at the clock's current time.
    pub fn tick<S>(&self, store: &S, clock: &dyn Clock, sink: &dyn NotificationSink) -> SweepOutcome
    where
        S: DoseStore + PrescriptionStore + StockStore,
    {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("Compliance sweep already running, skipping tick");
            return SweepOutcome::Skipped;
        }
        let _guard = TickGuard(&self.running);

        let mut report = SweepReport::default();
        self.promote_missed(store, clock, sink, &mut report);
        self.send_reminders(store, clock, sink, &mut report);

        tracing::debug!(
            missed = report.missed,
            reminders = report.reminders,
            failures = report.failures,
            "Compliance sweep finished"
        );
        SweepOutcome::Completed(report)
    }

    fn promote_missed<S>(
        &self,
        store: &S,
        clock: &dyn Clock,
        sink: &dyn NotificationSink,
        report: &mut SweepReport,
    ) where
        S: DoseStore + PrescriptionStore + StockStore,
    {
        let now = clock.now();
        let Some(slot) = self.config.missed_cutoffs.elapsed_slot(now.hour()) else {
            return;
        };

        let overdue = match store.find_pending_by_slot(now.date_naive(), slot) {
            Ok(overdue) => overdue,
            Err(e) => {
                tracing::error!(slot = slot.label(), error = %e, "Failed to load overdue doses");
                report.failures += 1;
                return;
            }
        };

        let tracker = DoseTracker::new(store, clock, sink);
        for dose in overdue {
            match tracker.mark_missed(&dose.id) {
                Ok(TransitionOutcome::Applied(_)) => report.missed += 1,
                Ok(TransitionOutcome::AlreadyProcessed { .. }) => {}
                Err(e) => {
                    tracing::error!(dose_id = %dose.id, error = %e, "Failed to mark dose missed");
                    report.failures += 1;
                }
            }
        }
    }

    fn send_reminders<S>(
        &self,
        store: &S,
        clock: &dyn Clock,
        sink: &dyn NotificationSink,
        report: &mut SweepReport,
    ) where
        S: DoseStore,
    {
        let now = clock.now();
        let open = self.config.reminder_windows.open_at(now.hour());

        let due: Vec<_> = if open.is_empty() {
            Vec::new()
        } else {
            match store.find_pending_on(now.date_naive()) {
                Ok(pending) => pending
                    .into_iter()
                    .filter(|dose| open.contains(&dose.slot))
                    .collect(),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to load doses due for reminders");
                    report.failures += 1;
                    return;
                }
            }
        };

        let mut reminded = match self.reminded.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        reminded.retain(|id| due.iter().any(|dose| &dose.id == id));

        for dose in &due {
            if self.config.reminder_policy == ReminderPolicy::OncePerWindow
                && !reminded.insert(dose.id.clone())
            {
                continue;
            }
            sink.notify(Notification::dose_reminder(dose));
            report.reminders += 1;
        }
    }
}

/// Handle for the background sweep thread.
///
/// Dropping the handle stops the thread and waits for it; a tick in progress
/// finishes first.
pub struct SweeperHandle {
    shutdown: Arc<AtomicBool>,
    handle: Option<std::thread::JoinHandle<()>>,
}

impl SweeperHandle {
    /// Request shutdown without waiting.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        self.shutdown();
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
    }
}

/// Run `sweeper` every configured interval on its own thread.
///
/// A tick that overruns the interval makes the loop skip the ticks it ran
/// over rather than run them back to back.
pub fn start_background_sweeper(
    db: Arc<Mutex<Database>>,
    sweeper: Arc<ComplianceSweeper>,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn NotificationSink>,
) -> SweeperHandle {
    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = shutdown.clone();

    let handle = std::thread::spawn(move || {
        let interval = Duration::from_secs(sweeper.config().interval_secs.max(1));
        tracing::info!(interval_secs = interval.as_secs(), "Compliance sweeper started");
        sweep_loop(&db, &sweeper, clock.as_ref(), sink.as_ref(), &flag, interval);
        tracing::info!("Compliance sweeper shutting down");
    });

    SweeperHandle {
        shutdown,
        handle: Some(handle),
    }
}

fn sweep_loop(
    db: &Mutex<Database>,
    sweeper: &ComplianceSweeper,
    clock: &dyn Clock,
    sink: &dyn NotificationSink,
    shutdown: &AtomicBool,
    interval: Duration,
) {
    let mut next = Instant::now() + interval;
    loop {
        while Instant::now() < next {
            if shutdown.load(Ordering::Relaxed) {
                return;
            }
            std::thread::sleep(SLEEP_GRANULARITY.min(next.saturating_duration_since(Instant::now())));
        }
        if shutdown.load(Ordering::Relaxed) {
            return;
        }

        match db.lock() {
            Ok(db) => {
                sweeper.tick(&*db, clock, sink);
            }
            Err(e) => tracing::error!(error = %e, "Database lock poisoned, skipping sweep"),
        }

        next += interval;
        let now = Instant::now();
        if next <= now {
            let mut skipped = 0u32;
            while next <= now {
                next += interval;
                skipped += 1;
            }
            tracing::warn!(skipped, "Compliance sweep overran its interval");
        }
    }
}
