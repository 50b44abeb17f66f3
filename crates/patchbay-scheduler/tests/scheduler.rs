use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use patchbay_data::automation::{self, NewScript, NewTask};
use patchbay_data::store::Store;
use patchbay_scheduler::Scheduler;
use patchbay_telemetry::Metrics;
use patchbay_test_support::postgres::start_postgres;

#[tokio::test]
async fn due_tasks_run_and_reschedule() -> anyhow::Result<()> {
    let postgres = match start_postgres() {
        Ok(db) => db,
        Err(err) => {
            eprintln!("skipping due_tasks_run_and_reschedule: {err}");
            return Ok(());
        }
    };

    let store = Store::connect(postgres.connection_string()).await?;
    let telemetry = Metrics::new()?;

    let script = automation::insert_script(
        store.pool(),
        &NewScript {
            name: "collect-uptime",
            description: None,
            content: "show uptime",
        },
    )
    .await?;

    let now = Utc::now();
    let recurring = automation::insert_task(
        store.pool(),
        &NewTask {
            name: "uptime-hourly",
            script_id: Some(script.id),
            frequency_seconds: 3_600,
            next_run_at: Some(now - ChronoDuration::minutes(5)),
            enabled: true,
        },
    )
    .await?;
    let one_shot = automation::insert_task(
        store.pool(),
        &NewTask {
            name: "one-time-audit",
            script_id: None,
            frequency_seconds: 0,
            next_run_at: Some(now - ChronoDuration::minutes(1)),
            enabled: true,
        },
    )
    .await?;
    let dormant = automation::insert_task(
        store.pool(),
        &NewTask {
            name: "future-sync",
            script_id: None,
            frequency_seconds: 60,
            next_run_at: Some(now + ChronoDuration::hours(1)),
            enabled: true,
        },
    )
    .await?;

    let scheduler = Scheduler::new(store.clone(), Duration::from_secs(30), telemetry.clone());
    let stats = scheduler.run_pending(now).await?;
    assert_eq!(stats.due, 2);
    assert_eq!(stats.completed, 2);
    assert_eq!(stats.failed, 0);
    assert_eq!(telemetry.snapshot().scheduler_tasks_due, 2);

    let tasks = automation::list_tasks(store.pool()).await?;
    let recurring_row = tasks
        .iter()
        .find(|row| row.id == recurring.id)
        .expect("recurring task");
    assert!(
        recurring_row.last_run_at.is_some(),
        "recurring task should record its run"
    );
    let next = recurring_row
        .next_run_at
        .expect("recurring task should stay scheduled");
    assert!(next > now, "next occurrence should be in the future");

    let one_shot_row = tasks
        .iter()
        .find(|row| row.id == one_shot.id)
        .expect("one-shot task");
    assert!(one_shot_row.last_run_at.is_some());
    assert!(
        one_shot_row.next_run_at.is_none(),
        "one-shot tasks retire after running"
    );

    let dormant_row = tasks
        .iter()
        .find(|row| row.id == dormant.id)
        .expect("dormant task");
    assert!(
        dormant_row.last_run_at.is_none(),
        "tasks that are not due stay untouched"
    );

    // A second sweep at the same instant finds nothing left to run.
    let stats = scheduler.run_pending(now).await?;
    assert_eq!(stats.due, 0);
    assert_eq!(telemetry.snapshot().scheduler_tasks_due, 0);
    Ok(())
}

#[tokio::test]
async fn poll_loop_runs_tasks_in_the_background() -> anyhow::Result<()> {
    let postgres = match start_postgres() {
        Ok(db) => db,
        Err(err) => {
            eprintln!("skipping poll_loop_runs_tasks_in_the_background: {err}");
            return Ok(());
        }
    };

    let store = Store::connect(postgres.connection_string()).await?;
    let telemetry = Metrics::new()?;

    let task = automation::insert_task(
        store.pool(),
        &NewTask {
            name: "background-run",
            script_id: None,
            frequency_seconds: 0,
            next_run_at: Some(Utc::now() - ChronoDuration::seconds(1)),
            enabled: true,
        },
    )
    .await?;

    let handle = Scheduler::new(store.clone(), Duration::from_millis(50), telemetry).start();

    let mut ran = false;
    for _ in 0..40 {
        tokio::time::sleep(Duration::from_millis(50)).await;
        let rows = automation::list_tasks(store.pool()).await?;
        if rows
            .iter()
            .any(|row| row.id == task.id && row.last_run_at.is_some())
        {
            ran = true;
            break;
        }
    }
    assert!(!handle.is_finished(), "poll loop should still be running");
    handle.shutdown().await;
    assert!(ran, "background sweep should run the due task");
    Ok(())
}
