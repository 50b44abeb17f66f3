//! Visualisation endpoints.

use std::sync::Arc;

use axum::{Json, Router, extract::State, middleware, routing::get};

use patchbay_data::inventory;

use crate::http::auth::require_session;
use crate::http::errors::{ApiError, map_data_error};
use crate::models::MapPointView;
use crate::state::ApiState;

/// Routes for the `views` namespace; every route requires a session.
pub(crate) fn routes(state: &Arc<ApiState>) -> Router<Arc<ApiState>> {
    Router::new()
        .route("/map", get(map_points))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ))
}

/// Device coordinates for the geographical view.
pub(crate) async fn map_points(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<Vec<MapPointView>>, ApiError> {
    let rows = inventory::list_devices(state.store.pool())
        .await
        .map_err(|err| map_data_error(&err, "list_devices"))?;
    Ok(Json(rows.into_iter().map(MapPointView::from).collect()))
}
