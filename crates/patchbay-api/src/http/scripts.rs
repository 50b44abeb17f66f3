//! Automation script endpoints.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    routing::get,
};
use uuid::Uuid;

use patchbay_data::automation::{self, NewScript};

use crate::http::auth::require_session;
use crate::http::errors::{ApiError, map_data_error};
use crate::models::{CreateScriptRequest, ScriptView};
use crate::state::ApiState;

/// Routes for the `scripts` namespace; every route requires a session.
pub(crate) fn routes(state: &Arc<ApiState>) -> Router<Arc<ApiState>> {
    Router::new()
        .route("/", get(list_scripts).post(create_script))
        .route("/{id}", get(get_script))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ))
}

pub(crate) async fn list_scripts(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<Vec<ScriptView>>, ApiError> {
    let rows = automation::list_scripts(state.store.pool())
        .await
        .map_err(|err| map_data_error(&err, "list_scripts"))?;
    Ok(Json(rows.into_iter().map(ScriptView::from).collect()))
}

pub(crate) async fn create_script(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<CreateScriptRequest>,
) -> Result<(StatusCode, Json<ScriptView>), ApiError> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("name must not be empty"));
    }
    let script = NewScript {
        name,
        description: request.description.as_deref(),
        content: &request.content,
    };
    let row = automation::insert_script(state.store.pool(), &script)
        .await
        .map_err(|err| map_data_error(&err, "insert_script"))?;
    Ok((StatusCode::CREATED, Json(ScriptView::from(row))))
}

pub(crate) async fn get_script(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ScriptView>, ApiError> {
    let Some(row) = automation::fetch_script_by_id(state.store.pool(), id)
        .await
        .map_err(|err| map_data_error(&err, "fetch_script_by_id"))?
    else {
        return Err(ApiError::not_found("no script with this id"));
    };
    Ok(Json(ScriptView::from(row)))
}
