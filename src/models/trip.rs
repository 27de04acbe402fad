//! Historical trip records handed over by the warehouse.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One completed trip as exported from the trip fact table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripRecord {
    pub bike_id: String,
    pub is_electric: bool,

    pub start_station_id: i64,
    pub start_station_name: String,
    pub end_station_id: i64,
    pub end_station_name: String,

    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,

    pub duration_min: f64,
    pub distance_km: f64,
    pub avg_speed_kmh: f64,
}
