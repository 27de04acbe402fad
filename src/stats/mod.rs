//! Aggregate statistics over station and trip records.
//!
//! Pure computation: records come in already fetched, tables and series go
//! out ready for display. No I/O happens here.

pub mod network;
pub mod trips;

pub use network::{by_department, commune_filter_options, DepartmentMetrics, NetworkTotals};
pub use trips::{
    distance_per_day, duration_histogram, hourly_profile, longest_by_distance, mode_comparison,
    pace_stats, short_trip_share, station_activity, top_station_pairs, trips_per_day,
    within_window, BikeUsage, DailySplit, DurationHistogram, ModeComparison, PaceStats,
    StationActivity, StationPair, TripTotals,
};
