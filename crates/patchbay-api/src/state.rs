//! Shared state handed to every request handler.

use patchbay_config::{Settings, WorkspacePaths};
use patchbay_data::Store;
use patchbay_telemetry::Metrics;

use crate::http::auth::AuthManager;

/// Application state threaded through the router.
///
/// One value is built per application instance; handlers receive it behind an
/// `Arc` so no global registry is involved.
#[derive(Clone)]
pub struct ApiState {
    /// Resolved runtime settings.
    pub settings: Settings,
    /// Workspace directory layout.
    pub paths: WorkspacePaths,
    /// Database handle.
    pub store: Store,
    /// Session and identity management.
    pub auth: AuthManager,
    /// Metrics registry shared with background services.
    pub telemetry: Metrics,
}

impl ApiState {
    /// Bundles the fully-initialized subsystems into one handle.
    #[must_use]
    pub const fn new(
        settings: Settings,
        paths: WorkspacePaths,
        store: Store,
        auth: AuthManager,
        telemetry: Metrics,
    ) -> Self {
        Self {
            settings,
            paths,
            store,
            auth,
            telemetry,
        }
    }
}
