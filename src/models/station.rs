//! Station records merged from the live status and information feeds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UnlocatedReport;

/// One station with live availability joined to its static metadata.
///
/// The nested `num_bikes_available_types` structure from the status feed is
/// already flattened into the `mechanical` / `ebike` fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationRecord {
    pub station_id: i64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub station_code: Option<String>,

    pub name: String,

    pub lat: f64,
    pub lon: f64,

    /// Total dock count from the information feed.
    pub capacity: u32,

    pub bikes_available: u32,
    pub mechanical: u32,
    pub ebike: u32,
    pub docks_available: u32,

    pub is_installed: bool,
    pub is_renting: bool,
    pub is_returning: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_reported: Option<DateTime<Utc>>,

    /// Department code from region resolution, when located.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,

    /// Commune name from region resolution, when located.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commune: Option<String>,
}

/// A fetched-and-annotated view of the whole network at one instant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Feed publication timestamp (`lastUpdatedOther`).
    pub last_updated: DateTime<Utc>,

    pub stations: Vec<StationRecord>,

    /// Stations the resolver could not attach to a region.
    #[serde(default)]
    pub unlocated: UnlocatedReport,
}
