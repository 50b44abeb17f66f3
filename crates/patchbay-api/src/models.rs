//! Shared HTTP DTOs for the patchbay API.
//!
//! These types shape the JSON contract; the conversions from storage rows
//! live here so the mapping from persistence types stays a single source of
//! truth. Password hashes never cross this boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use patchbay_data::automation::{ScriptRow, TaskRow, WorkflowRow};
use patchbay_data::inventory::{DeviceRow, FilterRow, LinkRow};
use patchbay_data::users::UserRow;

/// RFC9457-compatible problem document surfaced on validation/runtime errors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProblemDetails {
    /// Problem type URI.
    #[serde(rename = "type")]
    pub kind: String,
    /// Short human-readable summary.
    pub title: String,
    /// HTTP status code duplicated into the body.
    pub status: u16,
    /// Occurrence-specific explanation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Inventory device as served by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceView {
    pub id: Uuid,
    pub name: String,
    pub device_type: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub vendor: Option<String>,
    pub operating_system: Option<String>,
    pub os_version: Option<String>,
    pub ip_address: Option<String>,
    pub longitude: f64,
    pub latitude: f64,
    pub created_at: DateTime<Utc>,
}

impl From<DeviceRow> for DeviceView {
    fn from(row: DeviceRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            device_type: row.device_type,
            description: row.description,
            location: row.location,
            vendor: row.vendor,
            operating_system: row.operating_system,
            os_version: row.os_version,
            ip_address: row.ip_address,
            longitude: row.longitude,
            latitude: row.latitude,
            created_at: row.created_at,
        }
    }
}

/// Payload for creating an inventory device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDeviceRequest {
    pub name: String,
    /// Device class; defaults to `router` when omitted.
    pub device_type: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub vendor: Option<String>,
    pub operating_system: Option<String>,
    pub os_version: Option<String>,
    pub ip_address: Option<String>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
}

/// Inventory link between two devices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkView {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub vendor: Option<String>,
    pub source_id: Uuid,
    pub destination_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<LinkRow> for LinkView {
    fn from(row: LinkRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            location: row.location,
            vendor: row.vendor,
            source_id: row.source_id,
            destination_id: row.destination_id,
            created_at: row.created_at,
        }
    }
}

/// Payload for creating an inventory link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLinkRequest {
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub vendor: Option<String>,
    pub source_id: Uuid,
    pub destination_id: Uuid,
}

/// Saved device filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterView {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub device_name_pattern: Option<String>,
    pub location_pattern: Option<String>,
    pub vendor_pattern: Option<String>,
    pub built_in: bool,
}

impl From<FilterRow> for FilterView {
    fn from(row: FilterRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            device_name_pattern: row.device_name_pattern,
            location_pattern: row.location_pattern,
            vendor_pattern: row.vendor_pattern,
            built_in: row.built_in,
        }
    }
}

/// Automation script.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptView {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub content: String,
    pub built_in: bool,
    pub created_at: DateTime<Utc>,
}

impl From<ScriptRow> for ScriptView {
    fn from(row: ScriptRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            content: row.content,
            built_in: row.built_in,
            created_at: row.created_at,
        }
    }
}

/// Payload for creating an automation script.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateScriptRequest {
    pub name: String,
    pub description: Option<String>,
    pub content: String,
}

/// Automation workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowView {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<WorkflowRow> for WorkflowView {
    fn from(row: WorkflowRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            created_at: row.created_at,
        }
    }
}

/// Payload for creating a workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWorkflowRequest {
    pub name: String,
    pub description: Option<String>,
}

/// Scheduled task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskView {
    pub id: Uuid,
    pub name: String,
    pub script_id: Option<Uuid>,
    pub frequency_seconds: i64,
    pub next_run_at: Option<DateTime<Utc>>,
    pub last_run_at: Option<DateTime<Utc>>,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
}

impl From<TaskRow> for TaskView {
    fn from(row: TaskRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            script_id: row.script_id,
            frequency_seconds: row.frequency_seconds,
            next_run_at: row.next_run_at,
            last_run_at: row.last_run_at,
            enabled: row.enabled,
            created_at: row.created_at,
        }
    }
}

/// Payload for creating a scheduled task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    pub name: String,
    pub script_id: Option<Uuid>,
    /// Seconds between runs; zero schedules a one-shot task.
    pub frequency_seconds: i64,
    /// Defaults to enabled when omitted.
    pub enabled: Option<bool>,
}

/// User account as served by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserView {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl From<UserRow> for UserView {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            role: row.role,
            created_at: row.created_at,
        }
    }
}

/// Payload for creating a user account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub password: String,
    pub email: Option<String>,
    /// Defaults to `user` when omitted.
    pub role: Option<String>,
}

/// Form credentials submitted to the login endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub name: String,
    pub password: String,
}

/// Response to a successful login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionView {
    pub user: UserView,
}

/// Device projection for the geographical map view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapPointView {
    pub id: Uuid,
    pub name: String,
    pub device_type: String,
    pub longitude: f64,
    pub latitude: f64,
}

impl From<DeviceRow> for MapPointView {
    fn from(row: DeviceRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            device_type: row.device_type,
            longitude: row.longitude,
            latitude: row.latitude,
        }
    }
}
