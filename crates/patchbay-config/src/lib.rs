#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Environment-driven configuration for the patchbay application.
//!
//! Layout: `profile.rs` (the fixed profile registry), `settings.rs` (resolved
//! settings bundle + environment lookup), `paths.rs` (workspace directory
//! derivation), `error.rs` (error types).

pub mod error;
pub mod paths;
pub mod profile;
pub mod settings;

pub use error::{ConfigError, ConfigResult};
pub use paths::WorkspacePaths;
pub use profile::Profile;
pub use settings::{CONFIG_MODE_VAR, DATABASE_URL_VAR, Settings};
