//! Workflow endpoints.

use std::sync::Arc;

use axum::{Json, Router, extract::State, http::StatusCode, middleware, routing::get};

use patchbay_data::automation;

use crate::http::auth::require_session;
use crate::http::errors::{ApiError, map_data_error};
use crate::models::{CreateWorkflowRequest, WorkflowView};
use crate::state::ApiState;

/// Routes for the `workflows` namespace; every route requires a session.
pub(crate) fn routes(state: &Arc<ApiState>) -> Router<Arc<ApiState>> {
    Router::new()
        .route("/", get(list_workflows).post(create_workflow))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ))
}

pub(crate) async fn list_workflows(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<Vec<WorkflowView>>, ApiError> {
    let rows = automation::list_workflows(state.store.pool())
        .await
        .map_err(|err| map_data_error(&err, "list_workflows"))?;
    Ok(Json(rows.into_iter().map(WorkflowView::from).collect()))
}

pub(crate) async fn create_workflow(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<CreateWorkflowRequest>,
) -> Result<(StatusCode, Json<WorkflowView>), ApiError> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("name must not be empty"));
    }
    let row = automation::insert_workflow(state.store.pool(), name, request.description.as_deref())
        .await
        .map_err(|err| map_data_error(&err, "insert_workflow"))?;
    Ok((StatusCode::CREATED, Json(WorkflowView::from(row))))
}
