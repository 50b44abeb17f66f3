//! Fixed registry of runtime profiles.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Named configuration bundle selected once at startup.
///
/// The registry is closed: exactly these profiles exist, and lookup is
/// case-insensitive so `production`, `PRODUCTION`, and `Production` all
/// resolve to the same entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Default operational profile.
    Production,
    /// Verbose profile for local development.
    Debug,
}

impl FromStr for Profile {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "production" => Ok(Self::Production),
            "debug" => Ok(Self::Debug),
            _ => Err(ConfigError::UnknownProfile {
                value: s.to_string(),
            }),
        }
    }
}

impl Profile {
    /// Render the profile as its canonical capitalized name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Production => "Production",
            Self::Debug => "Debug",
        }
    }

    /// Whether interactive debugging behavior is enabled.
    #[must_use]
    pub const fn debug(self) -> bool {
        matches!(self, Self::Debug)
    }

    /// Default console log level for the profile.
    #[must_use]
    pub const fn log_level(self) -> &'static str {
        match self {
            Self::Production => "info",
            Self::Debug => "debug",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_registered_names_in_any_case() {
        for raw in ["production", "PRODUCTION", "Production", "pRoDucTion"] {
            assert_eq!(raw.parse::<Profile>().unwrap(), Profile::Production);
        }
        for raw in ["debug", "DEBUG", "Debug"] {
            assert_eq!(raw.parse::<Profile>().unwrap(), Profile::Debug);
        }
    }

    #[test]
    fn rejects_unregistered_names() {
        let err = "Staging".parse::<Profile>().unwrap_err();
        match err {
            ConfigError::UnknownProfile { value } => assert_eq!(value, "Staging"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn per_profile_defaults() {
        assert!(!Profile::Production.debug());
        assert_eq!(Profile::Production.log_level(), "info");
        assert!(Profile::Debug.debug());
        assert_eq!(Profile::Debug.log_level(), "debug");
    }
}
