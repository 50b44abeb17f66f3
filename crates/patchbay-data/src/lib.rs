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

//! Persistence layer for patchbay: migrations, row types, and query helpers.
//!
//! Layout: `store.rs` (pool lifecycle + startup seeding), `users.rs`
//! (accounts), `inventory.rs` (devices, links, filters), `automation.rs`
//! (scripts, workflows, tasks), `syslog.rs` (server records + ingest log),
//! `seed.rs` (built-in defaults), `error.rs` (error types).

pub mod automation;
pub mod error;
pub mod inventory;
pub mod seed;
pub mod store;
pub mod syslog;
pub mod users;

pub use error::{DataError, Result as DataResult};
pub use store::{Store, ping, run_migrations};
