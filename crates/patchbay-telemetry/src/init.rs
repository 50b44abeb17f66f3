//! Tracing subscriber installation.
//!
//! # Design
//!
//! Two sinks hang off one registry: a file sink that captures everything at
//! debug level, and a console sink that runs at the profile's level while
//! duplicating the device transport target at debug. The console filter obeys
//! `RUST_LOG` when set. Installation is idempotent per process; the first
//! subscriber wins and later calls leave it in place.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// Console level applied when neither the profile nor `RUST_LOG` says
/// otherwise.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Log target used by device transport sessions.
///
/// Events under this target land in the log file like everything else and are
/// additionally mirrored to the console at debug level, so operators can watch
/// live device chatter without raising the global level.
pub const DRIVER_LOG_TARGET: &str = "device_driver";

static ACTIVE_PROFILE: OnceCell<String> = OnceCell::new();

/// Logging configuration supplied by the application bootstrap.
#[derive(Debug, Clone)]
pub struct LoggingConfig<'a> {
    /// Base console level, e.g. `info` or `debug`.
    pub level: &'a str,
    /// File appended with every event at debug level and above.
    pub file: &'a Path,
    /// Configuration profile recorded for later lookup.
    pub profile: &'a str,
}

/// Configure and install the global tracing subscriber.
///
/// Also records the active profile so [`active_profile`] can report it; a
/// profile recorded by an earlier call is kept.
///
/// # Errors
///
/// Returns an error when the log file cannot be opened for append. A
/// subscriber already installed by this process is not an error; the existing
/// one keeps running.
pub fn init_logging(config: &LoggingConfig<'_>) -> Result<()> {
    let _ = ACTIVE_PROFILE.set(config.profile.to_string());

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(config.file)
        .with_context(|| format!("failed to open log file {}", config.file.display()))?;

    let file_layer = fmt::layer()
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .with_filter(LevelFilter::DEBUG);

    let console_layer = fmt::layer().with_filter(console_filter(config.level));

    if tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .is_err()
    {
        tracing::debug!("tracing subscriber already installed; keeping the existing one");
    }

    Ok(())
}

/// Profile recorded by [`init_logging`], or `unset` before any installation.
#[must_use]
pub fn active_profile() -> &'static str {
    ACTIVE_PROFILE.get().map_or("unset", String::as_str)
}

fn console_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(console_directives(level)))
}

fn console_directives(level: &str) -> String {
    format!("{level},{DRIVER_LOG_TARGET}=debug")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn console_directives_mirror_driver_target() {
        assert_eq!(console_directives("info"), "info,device_driver=debug");
        assert_eq!(console_directives("debug"), "debug,device_driver=debug");
    }

    #[test]
    fn repeated_installation_is_tolerated() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let file = dir.path().join("error.log");
        let config = LoggingConfig {
            level: DEFAULT_LOG_LEVEL,
            file: &file,
            profile: "Production",
        };

        init_logging(&config)?;
        init_logging(&config)?;

        assert!(file.exists());
        assert_eq!(active_profile(), "Production");
        Ok(())
    }

    #[test]
    fn unwritable_log_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = LoggingConfig {
            level: DEFAULT_LOG_LEVEL,
            // The parent directory does not exist, so the append open fails.
            file: &dir.path().join("missing").join("error.log"),
            profile: "Production",
        };

        assert!(init_logging(&config).is_err());
    }
}
