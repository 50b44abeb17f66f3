//! Resolved settings bundle and environment lookup.

use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ConfigError, ConfigResult};
use crate::profile::Profile;

/// Environment variable selecting the runtime profile.
pub const CONFIG_MODE_VAR: &str = "PATCHBAY_CONFIG_MODE";

/// Environment variable carrying the `PostgreSQL` connection string.
pub const DATABASE_URL_VAR: &str = "PATCHBAY_DATABASE_URL";

/// Resolved configuration for one application instance.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Active runtime profile.
    pub profile: Profile,
    /// Whether interactive debugging behavior is enabled.
    pub debug: bool,
    /// Console log level derived from the profile.
    pub log_level: &'static str,
    /// `PostgreSQL` connection string.
    pub database_url: String,
    /// Address the HTTP listener binds.
    pub bind_addr: IpAddr,
    /// Port the HTTP listener binds.
    pub http_port: u16,
    /// Log file appended in the working directory.
    pub log_file: PathBuf,
    /// Lifetime of issued login sessions.
    pub session_ttl: Duration,
    /// Interval between scheduler polls for due tasks.
    pub scheduler_interval: Duration,
    /// Upload directory alias, filled once workspace paths are derived.
    pub upload_dir: Option<PathBuf>,
}

impl Settings {
    /// Resolve settings from an explicit mode string and database URL.
    ///
    /// A `None` mode selects the Production profile. Unknown modes are
    /// fatal: there is no fallback profile.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownProfile`] when the mode does not name
    /// a registered profile.
    pub fn resolve(mode: Option<&str>, database_url: impl Into<String>) -> ConfigResult<Self> {
        let profile = match mode {
            Some(raw) => raw.parse::<Profile>()?,
            None => Profile::Production,
        };

        Ok(Self {
            profile,
            debug: profile.debug(),
            log_level: profile.log_level(),
            database_url: database_url.into(),
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            http_port: 5100,
            log_file: PathBuf::from("error.log"),
            session_ttl: Duration::from_secs(8 * 60 * 60),
            scheduler_interval: Duration::from_secs(30),
            upload_dir: None,
        })
    }

    /// Resolve settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownProfile`] for an unregistered
    /// [`CONFIG_MODE_VAR`] value and [`ConfigError::MissingEnv`] when
    /// [`DATABASE_URL_VAR`] is absent.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Resolve settings through an injected environment lookup.
    ///
    /// # Errors
    ///
    /// Same contract as [`Settings::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        let mode = lookup(CONFIG_MODE_VAR);
        let database_url = lookup(DATABASE_URL_VAR).ok_or(ConfigError::MissingEnv {
            name: DATABASE_URL_VAR,
        })?;
        Self::resolve(mode.as_deref(), database_url)
    }

    /// Record the upload directory alias derived by the path initializer.
    pub fn set_upload_dir(&mut self, dir: PathBuf) {
        self.upload_dir = Some(dir);
    }

    /// Socket address the HTTP listener binds.
    #[must_use]
    pub const fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.http_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "postgres://localhost/patchbay";

    #[test]
    fn absent_mode_selects_production() {
        let settings = Settings::resolve(None, URL).unwrap();
        assert_eq!(settings.profile, Profile::Production);
        assert!(!settings.debug);
        assert_eq!(settings.log_level, "info");
        assert_eq!(settings.http_port, 5100);
        assert_eq!(settings.listen_addr().to_string(), "0.0.0.0:5100");
        assert_eq!(settings.log_file, PathBuf::from("error.log"));
        assert!(settings.upload_dir.is_none());
    }

    #[test]
    fn mode_casing_does_not_matter() {
        for raw in ["debug", "Debug", "DEBUG"] {
            let settings = Settings::resolve(Some(raw), URL).unwrap();
            assert_eq!(settings.profile, Profile::Debug);
            assert!(settings.debug);
            assert_eq!(settings.log_level, "debug");
        }
    }

    #[test]
    fn unknown_mode_is_fatal() {
        let err = Settings::resolve(Some("staging"), URL).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownProfile { value } if value == "staging"));
    }

    #[test]
    fn lookup_reads_mode_and_database_url() {
        let settings = Settings::from_lookup(|name| match name {
            CONFIG_MODE_VAR => Some("debug".to_string()),
            DATABASE_URL_VAR => Some(URL.to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(settings.profile, Profile::Debug);
        assert_eq!(settings.database_url, URL);
    }

    #[test]
    fn lookup_requires_database_url() {
        let err = Settings::from_lookup(|_name| None).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnv { name } if name == DATABASE_URL_VAR));
    }

    #[test]
    fn upload_alias_is_recorded() {
        let mut settings = Settings::resolve(None, URL).unwrap();
        settings.set_upload_dir(PathBuf::from("/srv/projects"));
        assert_eq!(settings.upload_dir, Some(PathBuf::from("/srv/projects")));
    }
}
