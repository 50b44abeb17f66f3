use axum::body::Body;
use axum::http::{Request, StatusCode};
use patchbay_app::{AppOptions, build_app_with};
use patchbay_config::Settings;
use patchbay_data::automation;
use patchbay_test_support::postgres::start_postgres;
use tempfile::TempDir;
use tower::ServiceExt;

fn test_settings(database_url: &str, log_dir: &TempDir) -> anyhow::Result<Settings> {
    let mut settings = Settings::resolve(Some("debug"), database_url)?;
    settings.log_file = log_dir.path().join("error.log");
    Ok(settings)
}

fn health_request() -> anyhow::Result<Request<Body>> {
    Ok(Request::builder()
        .uri("/base/health")
        .body(Body::empty())?)
}

#[tokio::test]
async fn test_mode_builds_without_a_scheduler() -> anyhow::Result<()> {
    let postgres = match start_postgres() {
        Ok(db) => db,
        Err(err) => {
            eprintln!("skipping test_mode_builds_without_a_scheduler: {err}");
            return Ok(());
        }
    };
    let log_dir = tempfile::tempdir()?;
    let settings = test_settings(postgres.connection_string(), &log_dir)?;

    let app = build_app_with(settings, AppOptions { test: true }).await?;

    assert!(
        app.scheduler().is_none(),
        "test mode must not start the scheduler"
    );
    assert!(
        app.syslog().is_none(),
        "no syslog server record is configured"
    );

    // Path derivation feeds the upload alias back into the settings.
    assert!(app.paths().projects.ends_with("projects"));
    assert_eq!(
        app.settings().upload_dir.as_deref(),
        Some(app.paths().projects.as_path())
    );

    // Defaults are seeded before any request is served.
    let scripts = automation::list_scripts(app.state().store.pool()).await?;
    assert!(scripts.iter().any(|script| script.built_in));

    let health = app.api().router().oneshot(health_request()?).await?;
    assert_eq!(health.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn default_options_start_the_scheduler() -> anyhow::Result<()> {
    let postgres = match start_postgres() {
        Ok(db) => db,
        Err(err) => {
            eprintln!("skipping default_options_start_the_scheduler: {err}");
            return Ok(());
        }
    };
    let log_dir = tempfile::tempdir()?;
    let settings = test_settings(postgres.connection_string(), &log_dir)?;

    let app = build_app_with(settings, AppOptions::default()).await?;

    let scheduler = app.scheduler().expect("scheduler handle");
    assert!(!scheduler.is_finished(), "scheduler loop should be running");
    Ok(())
}

#[tokio::test]
async fn repeated_factory_calls_share_one_database() -> anyhow::Result<()> {
    let postgres = match start_postgres() {
        Ok(db) => db,
        Err(err) => {
            eprintln!("skipping repeated_factory_calls_share_one_database: {err}");
            return Ok(());
        }
    };
    let log_dir = tempfile::tempdir()?;

    let first = build_app_with(
        test_settings(postgres.connection_string(), &log_dir)?,
        AppOptions { test: true },
    )
    .await?;
    let seeded = automation::list_scripts(first.state().store.pool()).await?.len();

    let second = build_app_with(
        test_settings(postgres.connection_string(), &log_dir)?,
        AppOptions { test: true },
    )
    .await?;
    let reseeded = automation::list_scripts(second.state().store.pool())
        .await?
        .len();

    assert_eq!(seeded, reseeded, "re-seeding must not duplicate defaults");
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_requests_release_their_database_sessions() -> anyhow::Result<()> {
    let postgres = match start_postgres() {
        Ok(db) => db,
        Err(err) => {
            eprintln!("skipping concurrent_requests_release_their_database_sessions: {err}");
            return Ok(());
        }
    };
    let log_dir = tempfile::tempdir()?;
    let settings = test_settings(postgres.connection_string(), &log_dir)?;

    let app = build_app_with(settings, AppOptions { test: true }).await?;
    let router = app.api().router();

    // Far more in-flight requests than pool connections; each health check
    // holds a checkout, so these only all succeed if every request returns
    // its connection on completion.
    let mut joins = Vec::new();
    for _ in 0..32 {
        let router = router.clone();
        joins.push(tokio::spawn(async move {
            let response = router.oneshot(health_request()?).await?;
            anyhow::Ok(response.status())
        }));
    }
    for join in joins {
        assert_eq!(join.await??, StatusCode::OK);
    }
    Ok(())
}
