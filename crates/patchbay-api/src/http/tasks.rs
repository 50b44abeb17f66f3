//! Scheduled task endpoints.

use std::sync::Arc;

use axum::{Json, Router, extract::State, http::StatusCode, middleware, routing::get};
use chrono::Utc;

use patchbay_data::automation::{self, NewTask};

use crate::http::auth::require_session;
use crate::http::errors::{ApiError, map_data_error};
use crate::models::{CreateTaskRequest, TaskView};
use crate::state::ApiState;

/// Routes for the `tasks` namespace; every route requires a session.
pub(crate) fn routes(state: &Arc<ApiState>) -> Router<Arc<ApiState>> {
    Router::new()
        .route("/", get(list_tasks).post(create_task))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ))
}

pub(crate) async fn list_tasks(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<Vec<TaskView>>, ApiError> {
    let rows = automation::list_tasks(state.store.pool())
        .await
        .map_err(|err| map_data_error(&err, "list_tasks"))?;
    Ok(Json(rows.into_iter().map(TaskView::from).collect()))
}

pub(crate) async fn create_task(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<TaskView>), ApiError> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("name must not be empty"));
    }
    if request.frequency_seconds < 0 {
        return Err(ApiError::bad_request(
            "frequency_seconds must not be negative",
        ));
    }
    let first_run = chrono::Duration::try_seconds(request.frequency_seconds)
        .and_then(|delta| Utc::now().checked_add_signed(delta))
        .ok_or_else(|| ApiError::bad_request("frequency_seconds is out of range"))?;
    if let Some(script_id) = request.script_id {
        let script = automation::fetch_script_by_id(state.store.pool(), script_id)
            .await
            .map_err(|err| map_data_error(&err, "fetch_script_by_id"))?;
        if script.is_none() {
            return Err(ApiError::bad_request("task references an unknown script"));
        }
    }
    let task = NewTask {
        name,
        script_id: request.script_id,
        frequency_seconds: request.frequency_seconds,
        next_run_at: Some(first_run),
        enabled: request.enabled.unwrap_or(true),
    };
    let row = automation::insert_task(state.store.pool(), &task)
        .await
        .map_err(|err| map_data_error(&err, "insert_task"))?;
    Ok((StatusCode::CREATED, Json(TaskView::from(row))))
}
