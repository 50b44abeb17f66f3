#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Background execution of scheduled automation tasks.
//!
//! The scheduler polls the task table on a fixed cadence, runs whatever is
//! due, and reschedules or retires each task according to its frequency.
//! Execution hands the script payload to the device transport log target and
//! records the run; transport sessions themselves belong to the drivers.

use std::time::Duration;

use chrono::{DateTime, Utc};
use patchbay_data::automation::{self, TaskRow};
use patchbay_data::{DataError, Store};
use patchbay_telemetry::{DRIVER_LOG_TARGET, Metrics};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Most tasks claimed by a single sweep.
const DUE_TASK_BATCH: i64 = 64;

/// Outcome counters for one scheduler sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    /// Tasks that were due when the sweep started.
    pub due: usize,
    /// Tasks that ran and were rescheduled or retired.
    pub completed: usize,
    /// Tasks whose run or bookkeeping failed.
    pub failed: usize,
}

/// Polls the task table and executes whatever is due.
#[derive(Clone)]
pub struct Scheduler {
    store: Store,
    interval: Duration,
    telemetry: Metrics,
}

impl Scheduler {
    /// Build a scheduler that sweeps `store` every `interval`.
    #[must_use]
    pub const fn new(store: Store, interval: Duration, telemetry: Metrics) -> Self {
        Self {
            store,
            interval,
            telemetry,
        }
    }

    /// Spawn the background poll loop.
    ///
    /// The first sweep runs immediately; later sweeps follow the configured
    /// interval. The loop never exits on its own and stops only when the
    /// returned handle aborts it.
    #[must_use]
    pub fn start(self) -> SchedulerHandle {
        let interval = self.interval;
        info!(interval_secs = interval.as_secs(), "starting task scheduler");
        let worker = tokio::spawn(async move {
            let mut ticks = tokio::time::interval(interval);
            loop {
                ticks.tick().await;
                match self.run_pending(Utc::now()).await {
                    Ok(stats) if stats.due > 0 => {
                        info!(
                            due = stats.due,
                            completed = stats.completed,
                            failed = stats.failed,
                            "scheduler sweep finished"
                        );
                    }
                    Ok(_) => {}
                    Err(err) => {
                        warn!(error = %err, "scheduler sweep failed");
                    }
                }
            }
        });
        SchedulerHandle { worker }
    }

    /// Run every task that is due at `now`.
    ///
    /// Tasks are handled independently: one failure is counted and logged
    /// without blocking the rest of the batch.
    ///
    /// # Errors
    ///
    /// Returns an error when the due-task query itself fails; per-task
    /// failures are reported through [`SweepStats::failed`] instead.
    pub async fn run_pending(&self, now: DateTime<Utc>) -> Result<SweepStats, DataError> {
        let due = automation::fetch_due_tasks(self.store.pool(), now, DUE_TASK_BATCH).await?;
        self.telemetry
            .set_tasks_due(i64::try_from(due.len()).unwrap_or(i64::MAX));

        let mut stats = SweepStats {
            due: due.len(),
            ..SweepStats::default()
        };
        for task in due {
            match self.execute(&task, now).await {
                Ok(()) => {
                    self.telemetry.inc_scheduler_run("completed");
                    stats.completed += 1;
                }
                Err(err) => {
                    self.telemetry.inc_scheduler_run("failed");
                    warn!(
                        error = %err,
                        task_id = %task.id,
                        task_name = %task.name,
                        "scheduled task run failed"
                    );
                    stats.failed += 1;
                }
            }
        }
        Ok(stats)
    }

    async fn execute(&self, task: &TaskRow, ran_at: DateTime<Utc>) -> Result<(), DataError> {
        if let Some(script_id) = task.script_id {
            match automation::fetch_script_by_id(self.store.pool(), script_id).await? {
                Some(script) => {
                    debug!(
                        target: DRIVER_LOG_TARGET,
                        task_id = %task.id,
                        task_name = %task.name,
                        script_name = %script.name,
                        payload_bytes = script.content.len(),
                        "dispatching script payload"
                    );
                }
                None => {
                    warn!(
                        task_id = %task.id,
                        script_id = %script_id,
                        "task references a script that no longer exists"
                    );
                }
            }
        }

        automation::mark_task_run(
            self.store.pool(),
            task.id,
            ran_at,
            next_occurrence(task, ran_at),
        )
        .await
    }
}

/// Handle to the spawned scheduler loop.
#[derive(Debug)]
pub struct SchedulerHandle {
    worker: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Whether the poll loop has stopped.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }

    /// Abort the poll loop and wait for the task to wind down.
    pub async fn shutdown(self) {
        if !self.worker.is_finished() {
            self.worker.abort();
        }
        if let Err(err) = self.worker.await
            && !err.is_cancelled()
        {
            warn!(error = %err, "scheduler worker join failed");
        }
    }
}

/// Next run for a recurring task, or `None` when the task retires.
fn next_occurrence(task: &TaskRow, ran_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
    if task.frequency_seconds <= 0 {
        return None;
    }
    chrono::Duration::try_seconds(task.frequency_seconds)
        .and_then(|delta| ran_at.checked_add_signed(delta))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn task(frequency_seconds: i64) -> TaskRow {
        TaskRow {
            id: Uuid::new_v4(),
            name: "nightly-audit".to_string(),
            script_id: None,
            frequency_seconds,
            next_run_at: None,
            last_run_at: None,
            enabled: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn recurring_tasks_advance_by_their_frequency() {
        let ran_at = Utc::now();
        let expected = ran_at + chrono::Duration::seconds(3_600);
        assert_eq!(next_occurrence(&task(3_600), ran_at), Some(expected));
    }

    #[test]
    fn one_shot_tasks_retire_after_running() {
        let ran_at = Utc::now();
        assert_eq!(next_occurrence(&task(0), ran_at), None);
        assert_eq!(next_occurrence(&task(-5), ran_at), None);
    }

    #[test]
    fn absurd_frequencies_retire_instead_of_overflowing() {
        let ran_at = Utc::now();
        assert_eq!(next_occurrence(&task(i64::MAX), ran_at), None);
    }
}
