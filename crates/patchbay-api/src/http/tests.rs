//! End-to-end exercises of the assembled router against a disposable
//! Postgres instance. Every test provisions its own database and skips
//! itself when none can be started.

use std::path::Path;
use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use patchbay_config::{Settings, WorkspacePaths};
use patchbay_data::Store;
use patchbay_telemetry::Metrics;
use patchbay_test_support::postgres::{TestDatabase, start_postgres};

use crate::http::auth::{AuthManager, StoreIdentityProvider};
use crate::http::router::ApiServer;
use crate::state::ApiState;

struct TestContext {
    state: Arc<ApiState>,
    router: Router,
    // Keeps the disposable database alive for the test duration.
    _postgres: TestDatabase,
}

async fn build_context(postgres: TestDatabase) -> anyhow::Result<TestContext> {
    let settings = Settings::resolve(Some("debug"), postgres.connection_string())?;
    let store = Store::connect(postgres.connection_string()).await?;
    store.seed_defaults().await?;
    let auth = AuthManager::new(
        Arc::new(StoreIdentityProvider::new(store.clone())),
        settings.session_ttl,
    );
    let telemetry = Metrics::new()?;
    let paths = WorkspacePaths::derive(Path::new("/opt/patchbay/server"));
    let state = Arc::new(ApiState::new(settings, paths, store, auth, telemetry));
    let router = ApiServer::new(state.clone()).router();
    Ok(TestContext {
        state,
        router,
        _postgres: postgres,
    })
}

fn get(path: &str) -> Request<Body> {
    Request::builder().uri(path).body(Body::empty()).unwrap()
}

fn get_with_cookie(path: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .uri(path)
        .header(COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

fn post_with_cookie(path: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header(COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

fn post_json(path: &str, payload: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap()
}

fn post_json_with_cookie(path: &str, payload: &Value, cookie: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header(CONTENT_TYPE, "application/json")
        .header(COOKIE, cookie)
        .body(Body::from(payload.to_string()))
        .unwrap()
}

fn post_form(path: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> anyhow::Result<Value> {
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn session_cookie_pair(response: &axum::response::Response) -> Option<String> {
    let raw = response.headers().get(SET_COOKIE)?.to_str().ok()?;
    raw.split(';').next().map(str::to_string)
}

async fn signup_and_login(router: &Router, name: &str, password: &str) -> anyhow::Result<String> {
    let created = router
        .clone()
        .oneshot(post_json(
            "/admin/users",
            &json!({ "name": name, "password": password, "role": "admin" }),
        ))
        .await?;
    anyhow::ensure!(created.status() == StatusCode::CREATED, "signup failed");

    let login = router
        .clone()
        .oneshot(post_form(
            "/admin/login",
            &format!("name={name}&password={password}"),
        ))
        .await?;
    anyhow::ensure!(login.status() == StatusCode::OK, "login failed");
    session_cookie_pair(&login).ok_or_else(|| anyhow::anyhow!("login response had no cookie"))
}

#[tokio::test]
async fn base_endpoints_and_request_guard() -> anyhow::Result<()> {
    let postgres = match start_postgres() {
        Ok(db) => db,
        Err(err) => {
            eprintln!("skipping base_endpoints_and_request_guard: {err}");
            return Ok(());
        }
    };
    let ctx = build_context(postgres).await?;

    let health = ctx.router.clone().oneshot(get("/base/health")).await?;
    assert_eq!(health.status(), StatusCode::OK);
    let health_body = json_body(health).await?;
    assert_eq!(health_body["status"], "ok");
    assert_eq!(health_body["profile"], "Debug");

    let version = ctx.router.clone().oneshot(get("/base/version")).await?;
    assert_eq!(version.status(), StatusCode::OK);
    let version_body = json_body(version).await?;
    assert_eq!(version_body["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(version_body["profile"], "Debug");

    // No session and no form credentials: the guard turns the request away.
    let denied = ctx.router.clone().oneshot(get("/objects/devices")).await?;
    assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);
    let problem = json_body(denied).await?;
    assert_eq!(problem["title"], "authentication required");
    assert_eq!(problem["status"], 401);

    let metrics = ctx.router.clone().oneshot(get("/base/metrics")).await?;
    assert_eq!(metrics.status(), StatusCode::OK);
    let content_type = metrics
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("text/plain"));
    let bytes = to_bytes(metrics.into_body(), usize::MAX).await?;
    let exposition = String::from_utf8(bytes.to_vec())?;
    assert!(exposition.contains("http_requests_total"));
    assert!(exposition.contains("route=\"/base/health\""));
    Ok(())
}

#[tokio::test]
async fn signup_login_and_session_lifecycle() -> anyhow::Result<()> {
    let postgres = match start_postgres() {
        Ok(db) => db,
        Err(err) => {
            eprintln!("skipping signup_login_and_session_lifecycle: {err}");
            return Ok(());
        }
    };
    let ctx = build_context(postgres).await?;

    let created = ctx
        .router
        .clone()
        .oneshot(post_json(
            "/admin/users",
            &json!({ "name": "ada", "password": "hunter2", "role": "admin" }),
        ))
        .await?;
    assert_eq!(created.status(), StatusCode::CREATED);
    let created_body = json_body(created).await?;
    assert_eq!(created_body["name"], "ada");
    assert_eq!(created_body["role"], "admin");
    assert!(created_body.get("password_hash").is_none());

    let rejected = ctx
        .router
        .clone()
        .oneshot(post_form("/admin/login", "name=ada&password=wrong"))
        .await?;
    assert_eq!(rejected.status(), StatusCode::UNAUTHORIZED);
    assert!(rejected.headers().get(SET_COOKIE).is_none());

    let login = ctx
        .router
        .clone()
        .oneshot(post_form("/admin/login", "name=ada&password=hunter2"))
        .await?;
    assert_eq!(login.status(), StatusCode::OK);
    let cookie = session_cookie_pair(&login).expect("login should set a session cookie");
    assert!(cookie.starts_with("SID="));
    let login_body = json_body(login).await?;
    assert_eq!(login_body["user"]["name"], "ada");
    assert!(ctx.state.telemetry.snapshot().login_sessions_issued >= 1);

    let whoami = ctx
        .router
        .clone()
        .oneshot(get_with_cookie("/admin/whoami", &cookie))
        .await?;
    assert_eq!(whoami.status(), StatusCode::OK);
    assert_eq!(json_body(whoami).await?["name"], "ada");

    let listed = ctx
        .router
        .clone()
        .oneshot(get_with_cookie("/admin/users", &cookie))
        .await?;
    assert_eq!(listed.status(), StatusCode::OK);
    let listed_body = json_body(listed).await?;
    assert_eq!(listed_body.as_array().map(Vec::len), Some(1));

    let logout = ctx
        .router
        .clone()
        .oneshot(post_with_cookie("/admin/logout", &cookie))
        .await?;
    assert_eq!(logout.status(), StatusCode::NO_CONTENT);
    let cleared = logout
        .headers()
        .get(SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    assert!(cleared.contains("Max-Age=0"));

    let stale = ctx
        .router
        .clone()
        .oneshot(get_with_cookie("/admin/whoami", &cookie))
        .await?;
    assert_eq!(stale.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn form_name_credentials_satisfy_the_guard() -> anyhow::Result<()> {
    let postgres = match start_postgres() {
        Ok(db) => db,
        Err(err) => {
            eprintln!("skipping form_name_credentials_satisfy_the_guard: {err}");
            return Ok(());
        }
    };
    let ctx = build_context(postgres).await?;

    let created = ctx
        .router
        .clone()
        .oneshot(post_json(
            "/admin/users",
            &json!({ "name": "ada", "password": "hunter2" }),
        ))
        .await?;
    assert_eq!(created.status(), StatusCode::CREATED);
    assert_eq!(json_body(created).await?["role"], "user");

    // No session cookie: the guard falls back to the `name` form field.
    let request = Request::builder()
        .uri("/objects/filters")
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("name=ada"))?;
    let response = ctx.router.clone().oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let filters = json_body(response).await?;
    let names: Vec<&str> = filters
        .as_array()
        .expect("filters should be an array")
        .iter()
        .filter_map(|filter| filter["name"].as_str())
        .collect();
    assert!(names.contains(&"All devices"));

    let unknown = Request::builder()
        .uri("/objects/filters")
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("name=ghost"))?;
    let denied = ctx.router.clone().oneshot(unknown).await?;
    assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn inventory_round_trip_with_conflicts() -> anyhow::Result<()> {
    let postgres = match start_postgres() {
        Ok(db) => db,
        Err(err) => {
            eprintln!("skipping inventory_round_trip_with_conflicts: {err}");
            return Ok(());
        }
    };
    let ctx = build_context(postgres).await?;
    let cookie = signup_and_login(&ctx.router, "noc", "s3cret").await?;

    let first = ctx
        .router
        .clone()
        .oneshot(post_json_with_cookie(
            "/objects/devices",
            &json!({ "name": "edge-1", "longitude": 2.35, "latitude": 48.85 }),
            &cookie,
        ))
        .await?;
    assert_eq!(first.status(), StatusCode::CREATED);
    let first_body = json_body(first).await?;
    assert_eq!(first_body["device_type"], "router");
    let first_id = first_body["id"].as_str().unwrap().to_string();

    let duplicate = ctx
        .router
        .clone()
        .oneshot(post_json_with_cookie(
            "/objects/devices",
            &json!({ "name": "edge-1" }),
            &cookie,
        ))
        .await?;
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);
    assert_eq!(json_body(duplicate).await?["title"], "conflict");

    let unnamed = ctx
        .router
        .clone()
        .oneshot(post_json_with_cookie(
            "/objects/devices",
            &json!({ "name": "  " }),
            &cookie,
        ))
        .await?;
    assert_eq!(unnamed.status(), StatusCode::BAD_REQUEST);

    let dangling = ctx
        .router
        .clone()
        .oneshot(post_json_with_cookie(
            "/objects/links",
            &json!({
                "name": "edge-1--ghost",
                "source_id": first_id,
                "destination_id": Uuid::new_v4(),
            }),
            &cookie,
        ))
        .await?;
    assert_eq!(dangling.status(), StatusCode::BAD_REQUEST);

    let second = ctx
        .router
        .clone()
        .oneshot(post_json_with_cookie(
            "/objects/devices",
            &json!({ "name": "edge-2", "device_type": "switch" }),
            &cookie,
        ))
        .await?;
    assert_eq!(second.status(), StatusCode::CREATED);
    let second_id = json_body(second).await?["id"].as_str().unwrap().to_string();

    let link = ctx
        .router
        .clone()
        .oneshot(post_json_with_cookie(
            "/objects/links",
            &json!({
                "name": "edge-1--edge-2",
                "source_id": first_id,
                "destination_id": second_id,
            }),
            &cookie,
        ))
        .await?;
    assert_eq!(link.status(), StatusCode::CREATED);

    let devices = ctx
        .router
        .clone()
        .oneshot(get_with_cookie("/objects/devices", &cookie))
        .await?;
    assert_eq!(devices.status(), StatusCode::OK);
    let device_names: Vec<String> = json_body(devices)
        .await?
        .as_array()
        .expect("devices should be an array")
        .iter()
        .filter_map(|device| device["name"].as_str().map(str::to_string))
        .collect();
    assert_eq!(device_names, ["edge-1", "edge-2"]);

    let map = ctx
        .router
        .clone()
        .oneshot(get_with_cookie("/views/map", &cookie))
        .await?;
    assert_eq!(map.status(), StatusCode::OK);
    let points = json_body(map).await?;
    let edge_1 = points
        .as_array()
        .expect("map should be an array")
        .iter()
        .find(|point| point["name"] == "edge-1")
        .expect("edge-1 should be on the map")
        .clone();
    assert_eq!(edge_1["longitude"], 2.35);
    assert_eq!(edge_1["latitude"], 48.85);
    Ok(())
}

#[tokio::test]
async fn seeded_catalogs_and_task_scheduling() -> anyhow::Result<()> {
    let postgres = match start_postgres() {
        Ok(db) => db,
        Err(err) => {
            eprintln!("skipping seeded_catalogs_and_task_scheduling: {err}");
            return Ok(());
        }
    };
    let ctx = build_context(postgres).await?;
    let cookie = signup_and_login(&ctx.router, "ops", "s3cret").await?;

    let scripts = ctx
        .router
        .clone()
        .oneshot(get_with_cookie("/scripts", &cookie))
        .await?;
    assert_eq!(scripts.status(), StatusCode::OK);
    let scripts_body = json_body(scripts).await?;
    let show_version = scripts_body
        .as_array()
        .expect("scripts should be an array")
        .iter()
        .find(|script| script["name"] == "show_version")
        .expect("built-in script should be seeded")
        .clone();
    assert_eq!(show_version["built_in"], true);

    let script_id = show_version["id"].as_str().unwrap().to_string();
    let fetched = ctx
        .router
        .clone()
        .oneshot(get_with_cookie(&format!("/scripts/{script_id}"), &cookie))
        .await?;
    assert_eq!(fetched.status(), StatusCode::OK);

    let missing = ctx
        .router
        .clone()
        .oneshot(get_with_cookie(
            &format!("/scripts/{}", Uuid::new_v4()),
            &cookie,
        ))
        .await?;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let negative = ctx
        .router
        .clone()
        .oneshot(post_json_with_cookie(
            "/tasks",
            &json!({ "name": "nightly", "frequency_seconds": -5 }),
            &cookie,
        ))
        .await?;
    assert_eq!(negative.status(), StatusCode::BAD_REQUEST);

    let dangling = ctx
        .router
        .clone()
        .oneshot(post_json_with_cookie(
            "/tasks",
            &json!({
                "name": "nightly",
                "script_id": Uuid::new_v4(),
                "frequency_seconds": 3600,
            }),
            &cookie,
        ))
        .await?;
    assert_eq!(dangling.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(dangling).await?["detail"],
        "task references an unknown script"
    );

    let created = ctx
        .router
        .clone()
        .oneshot(post_json_with_cookie(
            "/tasks",
            &json!({
                "name": "nightly-config-pull",
                "script_id": script_id,
                "frequency_seconds": 3600,
            }),
            &cookie,
        ))
        .await?;
    assert_eq!(created.status(), StatusCode::CREATED);
    let created_body = json_body(created).await?;
    assert_eq!(created_body["enabled"], true);
    assert!(created_body["next_run_at"].is_string());

    let tasks = ctx
        .router
        .clone()
        .oneshot(get_with_cookie("/tasks", &cookie))
        .await?;
    assert_eq!(tasks.status(), StatusCode::OK);
    let task_names: Vec<String> = json_body(tasks)
        .await?
        .as_array()
        .expect("tasks should be an array")
        .iter()
        .filter_map(|task| task["name"].as_str().map(str::to_string))
        .collect();
    assert!(task_names.contains(&"nightly-config-pull".to_string()));

    let workflow = ctx
        .router
        .clone()
        .oneshot(post_json_with_cookie(
            "/workflows",
            &json!({ "name": "upgrade-campus" }),
            &cookie,
        ))
        .await?;
    assert_eq!(workflow.status(), StatusCode::CREATED);

    let workflows = ctx
        .router
        .clone()
        .oneshot(get_with_cookie("/workflows", &cookie))
        .await?;
    assert_eq!(workflows.status(), StatusCode::OK);
    assert_eq!(json_body(workflows).await?.as_array().map(Vec::len), Some(1));
    Ok(())
}
