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

//! Patchbay application bootstrap wiring.
//!
//! Layout: `bootstrap.rs` (factory pipeline and serving), `error.rs`
//! (application-level errors).

/// Application factory and serving.
pub mod bootstrap;
/// Application-level error type.
pub mod error;

pub use bootstrap::{AppOptions, Application, build_app, build_app_with, run_app};
pub use error::{AppError, AppResult};
