//! Router construction and server host for the API.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    http::{Method, Request, header::CONTENT_TYPE},
};
use patchbay_telemetry::{propagate_request_id_layer, set_request_id_layer};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{Span, debug};

use crate::error::{ApiServerError, ApiServerResult};
use crate::http::constants::HEADER_REQUEST_ID;
use crate::http::telemetry::HttpMetricsLayer;
use crate::http::{admin, base, objects, scripts, tasks, views, workflows};
use crate::state::ApiState;

/// One mounted route group.
struct RouteGroup {
    /// URL namespace the group nests under.
    namespace: &'static str,
    /// Builder producing the group's routes.
    builder: fn(&Arc<ApiState>) -> Router<Arc<ApiState>>,
}

/// The complete, ordered registry of route groups.
///
/// Registration order is part of the API's contract and the registry is
/// checked for duplicate namespaces before anything is mounted, so a bad
/// entry fails at startup rather than shadowing routes at request time.
const ROUTE_GROUPS: &[RouteGroup] = &[
    RouteGroup {
        namespace: "base",
        builder: base::routes,
    },
    RouteGroup {
        namespace: "objects",
        builder: objects::routes,
    },
    RouteGroup {
        namespace: "scripts",
        builder: scripts::routes,
    },
    RouteGroup {
        namespace: "workflows",
        builder: workflows::routes,
    },
    RouteGroup {
        namespace: "tasks",
        builder: tasks::routes,
    },
    RouteGroup {
        namespace: "admin",
        builder: admin::routes,
    },
    RouteGroup {
        namespace: "views",
        builder: views::routes,
    },
];

/// Axum router wrapper that hosts the patchbay API services.
pub struct ApiServer {
    router: Router,
}

impl ApiServer {
    /// Construct a new API server with shared dependencies wired through
    /// application state.
    #[must_use]
    pub fn new(state: Arc<ApiState>) -> Self {
        let cors_layer = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([CONTENT_TYPE]);
        let trace_layer = TraceLayer::new_for_http()
            .make_span_with(|request: &Request<_>| {
                let method = request.method().clone();
                let uri_path = request.uri().path();
                let request_id = request
                    .headers()
                    .get(HEADER_REQUEST_ID)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("")
                    .to_string();

                tracing::info_span!(
                    "http.request",
                    method = %method,
                    route = %uri_path,
                    request_id = %request_id,
                    status_code = tracing::field::Empty,
                    latency_ms = tracing::field::Empty
                )
            })
            .on_request(|_request: &Request<_>, _span: &Span| {})
            .on_response(
                |response: &axum::response::Response, latency: Duration, span: &Span| {
                    let status = response.status().as_u16();
                    span.record("status_code", status);
                    let latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
                    span.record("latency_ms", latency_ms);
                },
            );
        let layered = ServiceBuilder::new()
            .layer(propagate_request_id_layer())
            .layer(set_request_id_layer())
            .layer(trace_layer)
            .layer(HttpMetricsLayer::new(state.telemetry.clone()));

        let router = Self::build_router(&state)
            .layer(cors_layer)
            .route_layer(layered)
            .with_state(state);

        Self { router }
    }

    fn build_router(state: &Arc<ApiState>) -> Router<Arc<ApiState>> {
        let namespaces = distinct_namespaces(ROUTE_GROUPS);
        debug!(?namespaces, "mounting route groups");
        let mut router = Router::new();
        for group in ROUTE_GROUPS {
            router = router.nest(&format!("/{}", group.namespace), (group.builder)(state));
        }
        router
    }

    /// Serve the API using the configured router on the supplied address.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener fails to bind or the server
    /// terminates unexpectedly.
    pub async fn serve(self, addr: SocketAddr) -> ApiServerResult<()> {
        tracing::info!("Starting API on {}", addr);
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ApiServerError::Bind { addr, source })?;
        axum::serve(listener, self.router.into_make_service())
            .await
            .map_err(|source| ApiServerError::Serve { source })?;
        Ok(())
    }

    /// Snapshot of the underlying router, for embedding and tests.
    #[must_use]
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

/// Collects the registry's namespaces, panicking on a duplicate.
fn distinct_namespaces(groups: &[RouteGroup]) -> Vec<&'static str> {
    let mut seen = Vec::with_capacity(groups.len());
    for group in groups {
        assert!(
            !seen.contains(&group.namespace),
            "route group namespace registered twice: {}",
            group.namespace
        );
        seen.push(group.namespace);
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_groups_cover_the_fixed_namespaces_in_order() {
        let namespaces = distinct_namespaces(ROUTE_GROUPS);
        assert_eq!(
            namespaces,
            ["base", "objects", "scripts", "workflows", "tasks", "admin", "views"]
        );
    }

    #[test]
    #[should_panic(expected = "route group namespace registered twice: base")]
    fn duplicate_namespaces_fail_loudly() {
        let duplicated = [
            RouteGroup {
                namespace: "base",
                builder: base::routes,
            },
            RouteGroup {
                namespace: "base",
                builder: base::routes,
            },
        ];
        distinct_namespaces(&duplicated);
    }
}
