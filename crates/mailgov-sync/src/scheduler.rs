//! Interval scheduler for automatic reconciliation.
//!
//! One named job slot, one worker. Scheduled ticks and manual "sync now"
//! requests both feed a bounded single-consumer queue, so at most one
//! reconciliation run is active process-wide and a second request made while
//! one is queued coalesces away instead of piling up catch-up runs.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::engine::SyncEngine;

/// Identifier of the single recurring sync job.
pub const JOB_ID: &str = "auto_sync";

#[derive(Debug, Clone, Copy)]
struct RunRequest {
    origin: RunOrigin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunOrigin {
    Scheduled,
    Manual,
}

impl RunOrigin {
    fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Manual => "manual",
        }
    }
}

/// Scheduler owning the process-wide sync job slot.
pub struct Scheduler {
    tx: mpsc::Sender<RunRequest>,
    worker: JoinHandle<()>,
    tick: Mutex<Option<JoinHandle<()>>>,
    next_run: Arc<Mutex<Option<DateTime<Utc>>>>,
}

impl Scheduler {
    /// Create the scheduler and start its worker. The job itself stays
    /// disabled until [`Scheduler::apply`] sets an interval.
    #[must_use]
    pub fn new(engine: Arc<SyncEngine>) -> Self {
        // Capacity 1: an in-flight run plus at most one queued request.
        // Anything beyond that coalesces.
        let (tx, mut rx) = mpsc::channel::<RunRequest>(1);

        let worker = tokio::spawn(async move {
            while let Some(request) = rx.recv().await {
                info!(job = JOB_ID, origin = request.origin.as_str(), "reconciliation run starting");
                // Failures are logged and swallowed so one failed run never
                // kills future runs.
                match engine.run("", false).await {
                    Ok(summary) => info!(
                        job = JOB_ID,
                        total = summary.total,
                        created = summary.created,
                        updated = summary.updated,
                        unchanged = summary.unchanged,
                        errors = summary.errors,
                        "reconciliation run finished"
                    ),
                    Err(e) => error!(job = JOB_ID, error = %e, "reconciliation run failed"),
                }
            }
        });

        Self {
            tx,
            worker,
            tick: Mutex::new(None),
            next_run: Arc::new(Mutex::new(None)),
        }
    }

    /// Replace the schedule: remove any existing job, then re-add it on the
    /// given interval. `0` disables the job.
    pub async fn apply(&self, interval_hours: u32) {
        let mut tick_guard = self.tick.lock().await;
        if let Some(handle) = tick_guard.take() {
            handle.abort();
        }
        *self.next_run.lock().await = None;

        if interval_hours == 0 {
            info!(job = JOB_ID, "auto-sync disabled");
            return;
        }

        let period = Duration::from_secs(u64::from(interval_hours) * 3600);
        let chrono_period = chrono::Duration::seconds(period.as_secs() as i64);
        *self.next_run.lock().await = Some(Utc::now() + chrono_period);

        let tx = self.tx.clone();
        let next_run = Arc::clone(&self.next_run);

        let handle = tokio::spawn(async move {
            // First fire one full interval from now; a tick missed while a
            // run drags on is skipped, not replayed.
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                *next_run.lock().await = Some(Utc::now() + chrono_period);
                if tx.try_send(RunRequest {
                    origin: RunOrigin::Scheduled,
                })
                .is_err()
                {
                    warn!(job = JOB_ID, "reconciliation still active, skipping scheduled tick");
                }
            }
        });

        *tick_guard = Some(handle);
        info!(job = JOB_ID, interval_hours, "auto-sync scheduled");
    }

    /// Queue a manual run on the same worker as the scheduled job.
    ///
    /// Fire-and-forget: returns `true` if the run was queued, `false` when a
    /// run is already pending (the pending run covers the request).
    pub fn trigger_now(&self) -> bool {
        match self.tx.try_send(RunRequest {
            origin: RunOrigin::Manual,
        }) {
            Ok(()) => true,
            Err(_) => {
                info!(job = JOB_ID, "reconciliation already pending, coalescing manual trigger");
                false
            }
        }
    }

    /// Next scheduled fire time, if the job is enabled.
    pub async fn next_run_time(&self) -> Option<DateTime<Utc>> {
        *self.next_run.lock().await
    }

    /// Stop the job and the worker.
    pub async fn shutdown(&self) {
        if let Some(handle) = self.tick.lock().await.take() {
            handle.abort();
        }
        self.worker.abort();
    }
}
