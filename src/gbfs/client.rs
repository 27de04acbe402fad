//! HTTP client for the open-data station feeds.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use hashbrown::HashMap;
use reqwest::Client;
use tracing::{debug, info};
use url::Url;

use super::types::{split_bike_types, Feed, RawStationInformation, RawStationStatus};
use crate::models::{Snapshot, StationRecord, UnlocatedReport};

pub const DEFAULT_STATUS_URL: &str =
    "https://velib-metropole-opendata.smovengo.cloud/opendata/Velib_Metropole/station_status.json";
pub const DEFAULT_INFORMATION_URL: &str =
    "https://velib-metropole-opendata.smovengo.cloud/opendata/Velib_Metropole/station_information.json";

/// Fetches the status and information feeds and joins them into station
/// records.
pub struct FeedClient {
    client: Client,
    status_url: Url,
    information_url: Url,
}

impl FeedClient {
    pub fn new(status_url: &str, information_url: &str) -> Result<Self> {
        let status_url = Url::parse(status_url).context("Invalid status feed URL")?;
        let information_url =
            Url::parse(information_url).context("Invalid information feed URL")?;

        let client = Client::builder()
            .user_agent("velibstat/0.1")
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            status_url,
            information_url,
        })
    }

    pub async fn fetch_status(&self) -> Result<Feed<RawStationStatus>> {
        self.fetch(self.status_url.clone(), "status").await
    }

    pub async fn fetch_information(&self) -> Result<Feed<RawStationInformation>> {
        self.fetch(self.information_url.clone(), "information").await
    }

    async fn fetch<T: serde::de::DeserializeOwned>(&self, url: Url, feed: &str) -> Result<T> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Request for {} feed failed", feed))?;

        let response = response
            .error_for_status()
            .with_context(|| format!("{} feed returned an error status", feed))?;

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse {} feed", feed))
    }

    /// Fetch both feeds and join them on `station_id`.
    ///
    /// Region annotation is left to the caller; the returned snapshot has an
    /// empty unlocated report.
    pub async fn fetch_snapshot(&self) -> Result<Snapshot> {
        let status = self.fetch_status().await?;
        let information = self.fetch_information().await?;

        let last_updated =
            DateTime::from_timestamp(status.last_updated, 0).unwrap_or_else(Utc::now);
        let stations = merge_feeds(status.data.stations, information.data.stations);

        info!("Fetched snapshot with {} stations", stations.len());

        Ok(Snapshot {
            last_updated,
            stations,
            unlocated: UnlocatedReport::default(),
        })
    }
}

/// Join the two feeds on `station_id`, flattening per-type bike counts.
///
/// Stations present in only one feed are dropped.
pub fn merge_feeds(
    statuses: Vec<RawStationStatus>,
    information: Vec<RawStationInformation>,
) -> Vec<StationRecord> {
    let mut info_by_id: HashMap<i64, RawStationInformation> = information
        .into_iter()
        .map(|info| (info.station_id, info))
        .collect();

    let mut stations = Vec::with_capacity(statuses.len());

    for status in statuses {
        let info = match info_by_id.remove(&status.station_id) {
            Some(info) => info,
            None => {
                debug!(
                    "Station {} missing from information feed",
                    status.station_id
                );
                continue;
            }
        };

        let bikes = split_bike_types(&status.num_bikes_available_types);

        stations.push(StationRecord {
            station_id: status.station_id,
            station_code: status.station_code.or(info.station_code),
            name: info.name,
            lat: info.lat,
            lon: info.lon,
            capacity: info.capacity,
            bikes_available: status.num_bikes_available,
            mechanical: bikes.mechanical,
            ebike: bikes.ebike,
            docks_available: status.num_docks_available,
            is_installed: status.is_installed == 1,
            is_renting: status.is_renting == 1,
            is_returning: status.is_returning == 1,
            last_reported: status
                .last_reported
                .and_then(|t| DateTime::from_timestamp(t, 0)),
            department: None,
            commune: None,
        });
    }

    if !info_by_id.is_empty() {
        debug!("{} stations missing from status feed", info_by_id.len());
    }

    stations
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(id: i64, mechanical: u32, ebike: u32) -> RawStationStatus {
        RawStationStatus {
            station_id: id,
            station_code: None,
            num_bikes_available: mechanical + ebike,
            num_bikes_available_types: vec![
                std::collections::HashMap::from([("mechanical".to_string(), mechanical)]),
                std::collections::HashMap::from([("ebike".to_string(), ebike)]),
            ],
            num_docks_available: 10,
            is_installed: 1,
            is_renting: 1,
            is_returning: 0,
            last_reported: Some(1722499930),
        }
    }

    fn info(id: i64, name: &str) -> RawStationInformation {
        RawStationInformation {
            station_id: id,
            station_code: Some(format!("{}", id)),
            name: name.to_string(),
            lat: 48.86,
            lon: 2.35,
            capacity: 30,
        }
    }

    #[test]
    fn test_merge_joins_on_station_id() {
        let stations = merge_feeds(
            vec![status(1, 3, 2), status(2, 0, 5)],
            vec![info(2, "Deux"), info(1, "Un")],
        );

        assert_eq!(stations.len(), 2);
        let first = stations.iter().find(|s| s.station_id == 1).unwrap();
        assert_eq!(first.name, "Un");
        assert_eq!(first.mechanical, 3);
        assert_eq!(first.ebike, 2);
        assert!(first.is_installed);
        assert!(!first.is_returning);
    }

    #[test]
    fn test_merge_drops_unmatched_stations() {
        // Station 3 has no metadata, station 4 has no live status
        let stations = merge_feeds(
            vec![status(1, 1, 1), status(3, 2, 0)],
            vec![info(1, "Un"), info(4, "Quatre")],
        );

        assert_eq!(stations.len(), 1);
        assert_eq!(stations[0].station_id, 1);
    }
}
