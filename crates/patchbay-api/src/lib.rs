//! HTTP surface for the patchbay application.
//!
//! The crate exposes [`ApiServer`], which assembles the fixed set of route
//! groups over a shared [`ApiState`], plus the session machinery
//! ([`AuthManager`], [`IdentityProvider`]) the groups authenticate against.
//! Route handlers live under [`http`]; request/response DTOs under
//! [`models`].

pub mod error;
pub mod http;
pub mod models;
pub mod state;

pub use error::{ApiServerError, ApiServerResult};
pub use http::auth::{AuthManager, CurrentUser, IdentityProvider, IssuedSession, StoreIdentityProvider};
pub use http::router::ApiServer;
pub use state::ApiState;
