//! Aggregates over historical trip records.

use std::collections::BTreeMap;

use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use hashbrown::HashMap;
use serde::Serialize;

use crate::models::TripRecord;

/// Trips whose start falls inside the last `days` whole days.
///
/// The window opens at midnight UTC, `days` days before `now`.
pub fn within_window(trips: &[TripRecord], now: DateTime<Utc>, days: u64) -> Vec<TripRecord> {
    let cutoff = window_start(now, days);
    trips
        .iter()
        .filter(|t| t.start_time >= cutoff)
        .cloned()
        .collect()
}

fn window_start(now: DateTime<Utc>, days: u64) -> DateTime<Utc> {
    let date = now.date_naive() - Days::new(days);
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// Usage count of one bike.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BikeUsage {
    pub bike_id: String,
    pub trips: usize,
}

/// Headline numbers over a trip window.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TripTotals {
    pub trips: usize,
    pub bikes: usize,
    pub top_bike: Option<BikeUsage>,
    pub mean_duration_min: Option<f64>,
    pub median_duration_min: Option<f64>,
    pub longest_trip: Option<TripRecord>,
}

impl TripTotals {
    pub fn compute(trips: &[TripRecord]) -> Self {
        let mut per_bike: HashMap<&str, usize> = HashMap::new();
        for trip in trips {
            *per_bike.entry(trip.bike_id.as_str()).or_insert(0) += 1;
        }

        let top_bike = per_bike
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
            .map(|(id, count)| BikeUsage {
                bike_id: id.to_string(),
                trips: *count,
            });

        let durations: Vec<f64> = trips.iter().map(|t| t.duration_min).collect();

        let longest_trip = trips
            .iter()
            .max_by(|a, b| a.duration_min.total_cmp(&b.duration_min))
            .cloned();

        Self {
            trips: trips.len(),
            bikes: per_bike.len(),
            top_bike,
            mean_duration_min: mean(&durations),
            median_duration_min: median(&durations),
            longest_trip,
        }
    }
}

/// The single trip covering the most distance.
pub fn longest_by_distance(trips: &[TripRecord]) -> Option<&TripRecord> {
    trips
        .iter()
        .max_by(|a, b| a.distance_km.total_cmp(&b.distance_km))
}

/// Departure/arrival activity of one station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StationActivity {
    pub station_id: i64,
    pub name: String,
    pub departures: usize,
    pub arrivals: usize,
    pub total: usize,
}

/// Per-station activity, most active first.
///
/// Stations appearing only as a start or only as an end still get a row
/// (the join is outer, as in the source tables).
pub fn station_activity(trips: &[TripRecord]) -> Vec<StationActivity> {
    let mut rows: HashMap<i64, StationActivity> = HashMap::new();

    for trip in trips {
        let row = rows
            .entry(trip.start_station_id)
            .or_insert_with(|| StationActivity {
                station_id: trip.start_station_id,
                name: trip.start_station_name.clone(),
                departures: 0,
                arrivals: 0,
                total: 0,
            });
        row.departures += 1;

        let row = rows
            .entry(trip.end_station_id)
            .or_insert_with(|| StationActivity {
                station_id: trip.end_station_id,
                name: trip.end_station_name.clone(),
                departures: 0,
                arrivals: 0,
                total: 0,
            });
        row.arrivals += 1;
    }

    let mut rows: Vec<StationActivity> = rows
        .into_values()
        .map(|mut row| {
            row.total = row.departures + row.arrivals;
            row
        })
        .collect();

    rows.sort_by(|a, b| b.total.cmp(&a.total).then(a.station_id.cmp(&b.station_id)));
    rows
}

/// One day of a series split by propulsion type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySplit {
    pub date: NaiveDate,
    pub electric: f64,
    pub mechanical: f64,
}

/// Trips per day, electric vs mechanical.
pub fn trips_per_day(trips: &[TripRecord]) -> Vec<DailySplit> {
    daily_split(trips, |_| 1.0)
}

/// Distance covered per day in km, electric vs mechanical.
pub fn distance_per_day(trips: &[TripRecord]) -> Vec<DailySplit> {
    daily_split(trips, |t| t.distance_km)
}

fn daily_split(trips: &[TripRecord], value: impl Fn(&TripRecord) -> f64) -> Vec<DailySplit> {
    let mut days: BTreeMap<NaiveDate, (f64, f64)> = BTreeMap::new();

    for trip in trips {
        let slot = days.entry(trip.start_time.date_naive()).or_insert((0.0, 0.0));
        if trip.is_electric {
            slot.0 += value(trip);
        } else {
            slot.1 += value(trip);
        }
    }

    days.into_iter()
        .map(|(date, (electric, mechanical))| DailySplit {
            date,
            electric,
            mechanical,
        })
        .collect()
}

/// Trip starts per hour of day.
pub fn hourly_profile(trips: &[TripRecord]) -> [u64; 24] {
    let mut profile = [0u64; 24];
    for trip in trips {
        profile[trip.start_time.hour() as usize] += 1;
    }
    profile
}

/// Trip duration distribution, right-inclusive bins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DurationHistogram {
    pub under_5: usize,
    pub from_5_to_15: usize,
    pub from_15_to_30: usize,
    pub over_30: usize,
}

/// Bin trips by duration: (0,5], (5,15], (15,30], (30,∞) minutes.
///
/// Zero and negative durations fall outside every bin.
pub fn duration_histogram(trips: &[TripRecord]) -> DurationHistogram {
    let mut histogram = DurationHistogram::default();
    for trip in trips {
        let d = trip.duration_min;
        if d <= 0.0 {
            continue;
        } else if d <= 5.0 {
            histogram.under_5 += 1;
        } else if d <= 15.0 {
            histogram.from_5_to_15 += 1;
        } else if d <= 30.0 {
            histogram.from_15_to_30 += 1;
        } else {
            histogram.over_30 += 1;
        }
    }
    histogram
}

/// Share of trips shorter than 5 minutes, in percent.
pub fn short_trip_share(trips: &[TripRecord]) -> Option<f64> {
    if trips.is_empty() {
        return None;
    }
    let short = trips.iter().filter(|t| t.duration_min < 5.0).count();
    Some(100.0 * short as f64 / trips.len() as f64)
}

/// One origin/destination pair with its trip count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StationPair {
    pub start: String,
    pub end: String,
    pub trips: usize,
}

/// The `n` most ridden station pairs, busiest first.
pub fn top_station_pairs(trips: &[TripRecord], n: usize) -> Vec<StationPair> {
    let mut pairs: HashMap<(&str, &str), usize> = HashMap::new();
    for trip in trips {
        *pairs
            .entry((
                trip.start_station_name.as_str(),
                trip.end_station_name.as_str(),
            ))
            .or_insert(0) += 1;
    }

    let mut pairs: Vec<StationPair> = pairs
        .into_iter()
        .map(|((start, end), trips)| StationPair {
            start: start.to_string(),
            end: end.to_string(),
            trips,
        })
        .collect();

    pairs.sort_by(|a, b| {
        b.trips
            .cmp(&a.trips)
            .then_with(|| a.start.cmp(&b.start))
            .then_with(|| a.end.cmp(&b.end))
    });
    pairs.truncate(n);
    pairs
}

/// Electric vs mechanical comparison over a window.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ModeComparison {
    pub electric_trips: usize,
    pub mechanical_trips: usize,
    pub electric_distance_km: f64,
    pub mechanical_distance_km: f64,
    pub electric_median_speed_kmh: Option<f64>,
    pub mechanical_median_speed_kmh: Option<f64>,
}

pub fn mode_comparison(trips: &[TripRecord]) -> ModeComparison {
    let mut comparison = ModeComparison::default();
    let mut electric_speeds = Vec::new();
    let mut mechanical_speeds = Vec::new();

    for trip in trips {
        if trip.is_electric {
            comparison.electric_trips += 1;
            comparison.electric_distance_km += trip.distance_km;
            electric_speeds.push(trip.avg_speed_kmh);
        } else {
            comparison.mechanical_trips += 1;
            comparison.mechanical_distance_km += trip.distance_km;
            mechanical_speeds.push(trip.avg_speed_kmh);
        }
    }

    comparison.electric_median_speed_kmh = median(&electric_speeds);
    comparison.mechanical_median_speed_kmh = median(&mechanical_speeds);
    comparison
}

/// Mean/median distance and speed over a window.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PaceStats {
    pub mean_distance_km: Option<f64>,
    pub median_distance_km: Option<f64>,
    pub mean_speed_kmh: Option<f64>,
    pub median_speed_kmh: Option<f64>,
}

pub fn pace_stats(trips: &[TripRecord]) -> PaceStats {
    let distances: Vec<f64> = trips.iter().map(|t| t.distance_km).collect();
    let speeds: Vec<f64> = trips.iter().map(|t| t.avg_speed_kmh).collect();

    PaceStats {
        mean_distance_km: mean(&distances),
        median_distance_km: median(&distances),
        mean_speed_kmh: mean(&speeds),
        median_speed_kmh: median(&speeds),
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    }
}
