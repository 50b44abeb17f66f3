use std::sync::Arc;

use patchbay_api::{ApiServer, ApiState, AuthManager, StoreIdentityProvider};
use patchbay_config::{Settings, WorkspacePaths};
use patchbay_data::Store;
use patchbay_scheduler::{Scheduler, SchedulerHandle};
use patchbay_syslog::SyslogHandle;
use patchbay_telemetry::{LoggingConfig, Metrics, init_logging};
use tracing::info;

use crate::error::{AppError, AppResult};

/// Caller-supplied bootstrap options.
#[derive(Debug, Clone, Copy, Default)]
pub struct AppOptions {
    /// Suppresses scheduler construction and start for isolated test runs.
    pub test: bool,
}

/// A fully assembled application instance.
///
/// Every factory call produces fresh handles; nothing is shared through
/// process-wide state, so several instances can coexist in one process.
pub struct Application {
    settings: Settings,
    paths: WorkspacePaths,
    state: Arc<ApiState>,
    api: ApiServer,
    scheduler: Option<SchedulerHandle>,
    syslog: Option<SyslogHandle>,
}

impl Application {
    /// Resolved runtime settings, including the upload directory alias.
    #[must_use]
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Workspace directory layout derived from the install location.
    #[must_use]
    pub const fn paths(&self) -> &WorkspacePaths {
        &self.paths
    }

    /// Shared state handed to request handlers.
    #[must_use]
    pub const fn state(&self) -> &Arc<ApiState> {
        &self.state
    }

    /// The wired API server.
    #[must_use]
    pub const fn api(&self) -> &ApiServer {
        &self.api
    }

    /// Handle to the background scheduler, absent in test mode.
    #[must_use]
    pub const fn scheduler(&self) -> Option<&SchedulerHandle> {
        self.scheduler.as_ref()
    }

    /// Handle to the syslog listener, absent unless a server record
    /// activated.
    #[must_use]
    pub const fn syslog(&self) -> Option<&SyslogHandle> {
        self.syslog.as_ref()
    }

    /// Serve the API on the configured address until shutdown.
    ///
    /// Background subsystems are wound down once the listener returns.
    ///
    /// # Errors
    ///
    /// Returns an error when the listener cannot bind or terminates
    /// unexpectedly.
    pub async fn serve(self) -> AppResult<()> {
        let addr = self.settings.listen_addr();
        let serve_result = self.api.serve(addr).await;

        if let Some(scheduler) = self.scheduler {
            scheduler.shutdown().await;
        }
        if let Some(syslog) = self.syslog {
            syslog.shutdown().await;
        }

        serve_result.map_err(|err| AppError::api_server("api_server.serve", err))?;
        info!("api server shutdown complete");
        Ok(())
    }
}

/// Build the application from the process environment and serve until
/// shutdown.
///
/// # Errors
///
/// Returns an error when environment resolution, any factory step, or the
/// listener fails.
pub async fn run_app() -> AppResult<()> {
    let application = build_app(AppOptions::default()).await?;
    application.serve().await
}

/// Build an application from the process environment.
///
/// # Errors
///
/// Returns an error when environment resolution or any factory step fails.
pub async fn build_app(options: AppOptions) -> AppResult<Application> {
    let settings =
        Settings::from_env().map_err(|err| AppError::config("settings.from_env", err))?;
    build_app_with(settings, options).await
}

/// Factory pipeline that relies on injected settings to simplify testing.
///
/// Steps run strictly in order: derive workspace paths, connect the store
/// and run migrations, build the authentication manager around the store's
/// identity provider, construct the scheduler (skipped in test mode), mount
/// the route groups, seed default records, start the scheduler, activate
/// syslog ingest, and finally install logging.
///
/// # Errors
///
/// Returns an error when any step other than syslog activation fails;
/// syslog activation is best-effort and only logs its failures.
pub async fn build_app_with(mut settings: Settings, options: AppOptions) -> AppResult<Application> {
    let install_dir = WorkspacePaths::install_dir()
        .map_err(|err| AppError::io("paths.install_dir", None, err))?;
    let paths = WorkspacePaths::derive(&install_dir);
    settings.set_upload_dir(paths.projects.clone());

    let telemetry = Metrics::new().map_err(|err| AppError::telemetry("telemetry.metrics", err))?;

    let store = Store::connect(&settings.database_url)
        .await
        .map_err(|err| AppError::data("store.connect", err))?;
    let auth = AuthManager::new(
        Arc::new(StoreIdentityProvider::new(store.clone())),
        settings.session_ttl,
    );
    let scheduler = (!options.test)
        .then(|| Scheduler::new(store.clone(), settings.scheduler_interval, telemetry.clone()));

    let state = Arc::new(ApiState::new(
        settings.clone(),
        paths.clone(),
        store.clone(),
        auth,
        telemetry.clone(),
    ));
    let api = ApiServer::new(Arc::clone(&state));

    store
        .seed_defaults()
        .await
        .map_err(|err| AppError::data("store.seed_defaults", err))?;

    let scheduler = scheduler.map(Scheduler::start);
    let syslog = patchbay_syslog::activate(store, telemetry).await;

    let logging = LoggingConfig {
        level: settings.log_level,
        file: &settings.log_file,
        profile: settings.profile.as_str(),
    };
    init_logging(&logging).map_err(|err| AppError::telemetry("telemetry.logging", err))?;

    info!(
        profile = settings.profile.as_str(),
        addr = %settings.listen_addr(),
        scheduler = scheduler.is_some(),
        syslog = syslog.is_some(),
        "patchbay application assembled"
    );

    Ok(Application {
        settings,
        paths,
        state,
        api,
        scheduler,
        syslog,
    })
}
