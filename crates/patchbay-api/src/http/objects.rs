//! Inventory endpoints: devices, links, and saved filters.

use std::sync::Arc;

use axum::{Json, Router, extract::State, http::StatusCode, middleware, routing::get};

use patchbay_data::inventory::{self, NewDevice, NewLink};

use crate::http::auth::require_session;
use crate::http::errors::{ApiError, map_data_error};
use crate::models::{CreateDeviceRequest, CreateLinkRequest, DeviceView, FilterView, LinkView};
use crate::state::ApiState;

const DEFAULT_DEVICE_TYPE: &str = "router";

/// Routes for the `objects` namespace; every route requires a session.
pub(crate) fn routes(state: &Arc<ApiState>) -> Router<Arc<ApiState>> {
    Router::new()
        .route("/devices", get(list_devices).post(create_device))
        .route("/links", get(list_links).post(create_link))
        .route("/filters", get(list_filters))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ))
}

pub(crate) async fn list_devices(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<Vec<DeviceView>>, ApiError> {
    let rows = inventory::list_devices(state.store.pool())
        .await
        .map_err(|err| map_data_error(&err, "list_devices"))?;
    Ok(Json(rows.into_iter().map(DeviceView::from).collect()))
}

pub(crate) async fn create_device(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<CreateDeviceRequest>,
) -> Result<(StatusCode, Json<DeviceView>), ApiError> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("name must not be empty"));
    }
    let device = NewDevice {
        name,
        device_type: request
            .device_type
            .as_deref()
            .unwrap_or(DEFAULT_DEVICE_TYPE),
        description: request.description.as_deref(),
        location: request.location.as_deref(),
        vendor: request.vendor.as_deref(),
        operating_system: request.operating_system.as_deref(),
        os_version: request.os_version.as_deref(),
        ip_address: request.ip_address.as_deref(),
        longitude: request.longitude.unwrap_or_default(),
        latitude: request.latitude.unwrap_or_default(),
    };
    let row = inventory::insert_device(state.store.pool(), &device)
        .await
        .map_err(|err| map_data_error(&err, "insert_device"))?;
    Ok((StatusCode::CREATED, Json(DeviceView::from(row))))
}

pub(crate) async fn list_links(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<Vec<LinkView>>, ApiError> {
    let rows = inventory::list_links(state.store.pool())
        .await
        .map_err(|err| map_data_error(&err, "list_links"))?;
    Ok(Json(rows.into_iter().map(LinkView::from).collect()))
}

pub(crate) async fn create_link(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<CreateLinkRequest>,
) -> Result<(StatusCode, Json<LinkView>), ApiError> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("name must not be empty"));
    }
    let link = NewLink {
        name,
        description: request.description.as_deref(),
        location: request.location.as_deref(),
        vendor: request.vendor.as_deref(),
        source_id: request.source_id,
        destination_id: request.destination_id,
    };
    let row = inventory::insert_link(state.store.pool(), &link)
        .await
        .map_err(|err| map_data_error(&err, "insert_link"))?;
    Ok((StatusCode::CREATED, Json(LinkView::from(row))))
}

pub(crate) async fn list_filters(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<Vec<FilterView>>, ApiError> {
    let rows = inventory::list_filters(state.store.pool())
        .await
        .map_err(|err| map_data_error(&err, "list_filters"))?;
    Ok(Json(rows.into_iter().map(FilterView::from).collect()))
}
