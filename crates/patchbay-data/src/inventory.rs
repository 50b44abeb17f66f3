//! Inventory rows and queries: devices, the links between them, and the
//! saved filters that select device subsets.

use chrono::{DateTime, Utc};
use sqlx::{Executor, FromRow, Postgres};
use uuid::Uuid;

use crate::error::{Result, map_query_err};

/// Raw projection of the `devices` table.
#[derive(Debug, Clone, FromRow)]
pub struct DeviceRow {
    /// Primary key.
    pub id: Uuid,
    /// Unique device name.
    pub name: String,
    /// Device class (router, switch, firewall, ...).
    pub device_type: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Physical location.
    pub location: Option<String>,
    /// Hardware vendor.
    pub vendor: Option<String>,
    /// Operating system family.
    pub operating_system: Option<String>,
    /// Operating system version.
    pub os_version: Option<String>,
    /// Management IP address.
    pub ip_address: Option<String>,
    /// Map longitude.
    pub longitude: f64,
    /// Map latitude.
    pub latitude: f64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Raw projection of the `links` table.
#[derive(Debug, Clone, FromRow)]
pub struct LinkRow {
    /// Primary key.
    pub id: Uuid,
    /// Unique link name.
    pub name: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Physical location.
    pub location: Option<String>,
    /// Hardware vendor.
    pub vendor: Option<String>,
    /// Source device.
    pub source_id: Uuid,
    /// Destination device.
    pub destination_id: Uuid,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Raw projection of the `filters` table.
#[derive(Debug, Clone, FromRow)]
pub struct FilterRow {
    /// Primary key.
    pub id: Uuid,
    /// Unique filter name.
    pub name: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Regex applied to device names; `NULL` matches everything.
    pub device_name_pattern: Option<String>,
    /// Regex applied to device locations; `NULL` matches everything.
    pub location_pattern: Option<String>,
    /// Regex applied to device vendors; `NULL` matches everything.
    pub vendor_pattern: Option<String>,
    /// Whether the filter ships with the application.
    pub built_in: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a device.
#[derive(Debug, Clone, Copy)]
pub struct NewDevice<'a> {
    /// Unique device name.
    pub name: &'a str,
    /// Device class.
    pub device_type: &'a str,
    /// Free-form description.
    pub description: Option<&'a str>,
    /// Physical location.
    pub location: Option<&'a str>,
    /// Hardware vendor.
    pub vendor: Option<&'a str>,
    /// Operating system family.
    pub operating_system: Option<&'a str>,
    /// Operating system version.
    pub os_version: Option<&'a str>,
    /// Management IP address.
    pub ip_address: Option<&'a str>,
    /// Map longitude.
    pub longitude: f64,
    /// Map latitude.
    pub latitude: f64,
}

/// Insert payload for a link.
#[derive(Debug, Clone, Copy)]
pub struct NewLink<'a> {
    /// Unique link name.
    pub name: &'a str,
    /// Free-form description.
    pub description: Option<&'a str>,
    /// Physical location.
    pub location: Option<&'a str>,
    /// Hardware vendor.
    pub vendor: Option<&'a str>,
    /// Source device.
    pub source_id: Uuid,
    /// Destination device.
    pub destination_id: Uuid,
}

/// Insert a device and return the stored row.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub async fn insert_device<'e, E>(executor: E, device: &NewDevice<'_>) -> Result<DeviceRow>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as::<_, DeviceRow>(
        "INSERT INTO devices (id, name, device_type, description, location, vendor,
                              operating_system, os_version, ip_address, longitude, latitude)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
         RETURNING id, name, device_type, description, location, vendor,
                   operating_system, os_version, ip_address, longitude, latitude, created_at",
    )
    .bind(Uuid::new_v4())
    .bind(device.name)
    .bind(device.device_type)
    .bind(device.description)
    .bind(device.location)
    .bind(device.vendor)
    .bind(device.operating_system)
    .bind(device.os_version)
    .bind(device.ip_address)
    .bind(device.longitude)
    .bind(device.latitude)
    .fetch_one(executor)
    .await
    .map_err(map_query_err("insert device"))
}

/// Insert a link and return the stored row.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub async fn insert_link<'e, E>(executor: E, link: &NewLink<'_>) -> Result<LinkRow>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as::<_, LinkRow>(
        "INSERT INTO links (id, name, description, location, vendor, source_id, destination_id)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         RETURNING id, name, description, location, vendor, source_id, destination_id, created_at",
    )
    .bind(Uuid::new_v4())
    .bind(link.name)
    .bind(link.description)
    .bind(link.location)
    .bind(link.vendor)
    .bind(link.source_id)
    .bind(link.destination_id)
    .fetch_one(executor)
    .await
    .map_err(map_query_err("insert link"))
}

/// List all devices, ordered by name.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn list_devices<'e, E>(executor: E) -> Result<Vec<DeviceRow>>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as::<_, DeviceRow>(
        "SELECT id, name, device_type, description, location, vendor,
                operating_system, os_version, ip_address, longitude, latitude, created_at
         FROM devices ORDER BY name",
    )
    .fetch_all(executor)
    .await
    .map_err(map_query_err("list devices"))
}

/// List all links, ordered by name.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn list_links<'e, E>(executor: E) -> Result<Vec<LinkRow>>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as::<_, LinkRow>(
        "SELECT id, name, description, location, vendor, source_id, destination_id, created_at
         FROM links ORDER BY name",
    )
    .fetch_all(executor)
    .await
    .map_err(map_query_err("list links"))
}

/// List all device filters, ordered by name.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn list_filters<'e, E>(executor: E) -> Result<Vec<FilterRow>>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as::<_, FilterRow>(
        "SELECT id, name, description, device_name_pattern, location_pattern,
                vendor_pattern, built_in, created_at
         FROM filters ORDER BY name",
    )
    .fetch_all(executor)
    .await
    .map_err(map_query_err("list filters"))
}
