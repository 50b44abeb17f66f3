//! Error types for configuration resolution.

use thiserror::Error;

/// Primary error type for configuration resolution.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Requested mode does not name a registered profile.
    #[error("unknown configuration profile")]
    UnknownProfile {
        /// Mode string supplied by the environment.
        value: String,
    },
    /// A required environment variable is absent.
    #[error("missing required environment variable")]
    MissingEnv {
        /// Name of the missing variable.
        name: &'static str,
    },
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;
