//! Wire models for the GBFS-style station feeds.

use serde::Deserialize;
use std::collections::HashMap;

/// Feed envelope shared by both endpoints.
#[derive(Debug, Deserialize)]
pub struct Feed<T> {
    pub data: FeedData<T>,

    /// Publication timestamp, epoch seconds.
    #[serde(rename = "lastUpdatedOther")]
    pub last_updated: i64,

    #[serde(default)]
    pub ttl: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct FeedData<T> {
    pub stations: Vec<T>,
}

/// Per-station availability from `station_status.json`.
#[derive(Debug, Deserialize)]
pub struct RawStationStatus {
    pub station_id: i64,

    #[serde(rename = "stationCode")]
    pub station_code: Option<String>,

    pub num_bikes_available: u32,

    /// Nested per-type availability: a list of one-entry maps,
    /// `[{"mechanical": 9}, {"ebike": 2}]`.
    #[serde(default)]
    pub num_bikes_available_types: Vec<HashMap<String, u32>>,

    pub num_docks_available: u32,

    #[serde(default)]
    pub is_installed: u8,
    #[serde(default)]
    pub is_renting: u8,
    #[serde(default)]
    pub is_returning: u8,

    #[serde(default)]
    pub last_reported: Option<i64>,
}

/// Per-station metadata from `station_information.json`.
#[derive(Debug, Deserialize)]
pub struct RawStationInformation {
    pub station_id: i64,

    #[serde(rename = "stationCode")]
    pub station_code: Option<String>,

    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub capacity: u32,
}

/// Flattened per-type bike counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BikeCounts {
    pub mechanical: u32,
    pub ebike: u32,
}

/// Flatten the nested availability structure into two counters.
///
/// Counts are summed per key across entries, so a feed that merges or
/// reorders the per-type maps still flattens correctly; absent keys
/// contribute zero.
pub fn split_bike_types(entries: &[HashMap<String, u32>]) -> BikeCounts {
    let mut counts = BikeCounts::default();
    for entry in entries {
        counts.mechanical += entry.get("mechanical").copied().unwrap_or(0);
        counts.ebike += entry.get("ebike").copied().unwrap_or(0);
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_split_bike_types_sums_per_key() {
        let entries: Vec<HashMap<String, u32>> = vec![
            HashMap::from([("mechanical".to_string(), 9)]),
            HashMap::from([("ebike".to_string(), 2)]),
        ];
        assert_eq!(
            split_bike_types(&entries),
            BikeCounts {
                mechanical: 9,
                ebike: 2
            }
        );
    }

    #[test]
    fn test_split_bike_types_handles_empty_and_merged_entries() {
        assert_eq!(split_bike_types(&[]), BikeCounts::default());

        let merged: Vec<HashMap<String, u32>> = vec![HashMap::from([
            ("mechanical".to_string(), 3),
            ("ebike".to_string(), 4),
        ])];
        assert_eq!(
            split_bike_types(&merged),
            BikeCounts {
                mechanical: 3,
                ebike: 4
            }
        );
    }

    #[test]
    fn test_status_feed_deserialization() {
        let body = json!({
            "lastUpdatedOther": 1722500000,
            "ttl": 60,
            "data": {
                "stations": [
                    {
                        "station_id": 213688169,
                        "stationCode": "16107",
                        "num_bikes_available": 11,
                        "num_bikes_available_types": [{"mechanical": 9}, {"ebike": 2}],
                        "num_docks_available": 24,
                        "is_installed": 1,
                        "is_renting": 1,
                        "is_returning": 1,
                        "last_reported": 1722499930
                    }
                ]
            }
        });

        let feed: Feed<RawStationStatus> = serde_json::from_value(body).unwrap();
        assert_eq!(feed.last_updated, 1722500000);
        assert_eq!(feed.data.stations.len(), 1);

        let station = &feed.data.stations[0];
        assert_eq!(station.station_id, 213688169);
        assert_eq!(station.num_bikes_available, 11);
        assert_eq!(split_bike_types(&station.num_bikes_available_types).mechanical, 9);
    }

    #[test]
    fn test_information_feed_deserialization() {
        let body = json!({
            "lastUpdatedOther": 1722500000,
            "data": {
                "stations": [
                    {
                        "station_id": 213688169,
                        "stationCode": "16107",
                        "name": "Benjamin Godard - Victor Hugo",
                        "lat": 48.865983,
                        "lon": 2.275725,
                        "capacity": 35
                    }
                ]
            }
        });

        let feed: Feed<RawStationInformation> = serde_json::from_value(body).unwrap();
        let station = &feed.data.stations[0];
        assert_eq!(station.name, "Benjamin Godard - Victor Hugo");
        assert_eq!(station.capacity, 35);
    }
}
