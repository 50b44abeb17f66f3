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

//! Telemetry primitives shared across the patchbay workspace.
//!
//! Layout:
//! - `init`: tracing subscriber installation (file sink plus console).
//! - `metrics`: Prometheus collectors and the exposition helper.
//! - `layers`: request-id middleware factories for the HTTP stack.

pub mod init;
pub mod layers;
pub mod metrics;

pub use init::{DEFAULT_LOG_LEVEL, DRIVER_LOG_TARGET, LoggingConfig, active_profile, init_logging};
pub use layers::{propagate_request_id_layer, set_request_id_layer};
pub use metrics::{Metrics, MetricsSnapshot};
