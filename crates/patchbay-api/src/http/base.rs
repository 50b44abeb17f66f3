//! Health and diagnostics endpoints.

use std::sync::Arc;

use axum::{
    Json, Router, body::Body, extract::State, http::StatusCode, response::Response, routing::get,
};
use serde::Serialize;
use tracing::{error, warn};

use crate::http::errors::ApiError;
use crate::state::ApiState;

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    pub(crate) status: &'static str,
    pub(crate) profile: &'static str,
}

#[derive(Serialize)]
pub(crate) struct VersionResponse {
    pub(crate) version: &'static str,
    pub(crate) profile: &'static str,
}

/// Routes for the `base` namespace. All of them are public.
pub(crate) fn routes(_state: &Arc<ApiState>) -> Router<Arc<ApiState>> {
    Router::new()
        .route("/health", get(health))
        .route("/version", get(version))
        .route("/metrics", get(metrics))
}

pub(crate) async fn health(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<HealthResponse>, ApiError> {
    match patchbay_data::ping(state.store.pool()).await {
        Ok(()) => Ok(Json(HealthResponse {
            status: "ok",
            profile: state.settings.profile.as_str(),
        })),
        Err(err) => {
            warn!(error = %err, "health check failed to reach database");
            Err(ApiError::service_unavailable(
                "database is currently unavailable",
            ))
        }
    }
}

pub(crate) async fn version(State(state): State<Arc<ApiState>>) -> Json<VersionResponse> {
    Json(VersionResponse {
        version: env!("CARGO_PKG_VERSION"),
        profile: state.settings.profile.as_str(),
    })
}

pub(crate) async fn metrics(State(state): State<Arc<ApiState>>) -> Result<Response, ApiError> {
    match state.telemetry.render() {
        Ok(body) => Response::builder()
            .status(StatusCode::OK)
            .header(
                axum::http::header::CONTENT_TYPE,
                "text/plain; version=0.0.4",
            )
            .body(Body::from(body))
            .map_err(|err| {
                error!(error = %err, "failed to build metrics response");
                ApiError::internal("failed to build metrics response")
            }),
        Err(err) => {
            error!(error = %err, "failed to render metrics");
            Err(ApiError::internal("failed to render metrics"))
        }
    }
}
