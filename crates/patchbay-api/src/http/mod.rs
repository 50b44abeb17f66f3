//! HTTP surface: route groups, middleware, and error mapping.

/// Administration endpoints: users, login, logout.
pub mod admin;
/// Session management and the identity-resolution seam.
pub mod auth;
/// Health, version, and metrics endpoints.
pub mod base;
/// Route paths, cookie names, and problem-type URIs.
pub mod constants;
/// API error envelope and persistence-error mapping.
pub mod errors;
/// Inventory endpoints: devices, links, filters.
pub mod objects;
/// Router assembly and the HTTP server entry point.
pub mod router;
/// Automation script endpoints.
pub mod scripts;
/// Scheduled task endpoints.
pub mod tasks;
/// Per-request metrics recording.
pub mod telemetry;
/// Visualisation endpoints.
pub mod views;
/// Workflow endpoints.
pub mod workflows;

#[cfg(test)]
mod tests;
