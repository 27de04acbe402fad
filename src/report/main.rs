//! One-shot snapshot report.
//!
//! Fetches the live feeds, resolves every station against the contour
//! dataset, and logs network and per-department metrics plus the
//! unlocated-station diagnostic. Optionally summarizes a warehouse trip
//! export.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use velibstat::gbfs::{FeedClient, DEFAULT_INFORMATION_URL, DEFAULT_STATUS_URL};
use velibstat::locate::RegionResolver;
use velibstat::models::{TripRecord, UnlocatedReport};
use velibstat::stats::{
    by_department, duration_histogram, longest_by_distance, mode_comparison, pace_stats,
    short_trip_share, station_activity, top_station_pairs, within_window, NetworkTotals,
    TripTotals,
};

#[derive(Parser, Debug)]
#[command(name = "report")]
#[command(about = "One-shot station and trip report")]
struct Args {
    /// Commune contour dataset (GeoJSON-style)
    #[arg(short, long, default_value = "geo-limit/communes.json")]
    contours: PathBuf,

    /// Status feed URL
    #[arg(long, default_value = DEFAULT_STATUS_URL)]
    status_url: String,

    /// Information feed URL
    #[arg(long, default_value = DEFAULT_INFORMATION_URL)]
    information_url: String,

    /// Warehouse trip export (JSON array of trip records)
    #[arg(long)]
    trips_file: Option<PathBuf>,

    /// Trip window in days
    #[arg(long, default_value = "7")]
    days: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    info!("Velibstat Report");
    info!("Contours: {}", args.contours.display());

    let resolver = RegionResolver::from_path(&args.contours)
        .context("Failed to build region resolver")?;

    let client = FeedClient::new(&args.status_url, &args.information_url)?;
    let mut snapshot = client
        .fetch_snapshot()
        .await
        .context("Failed to fetch station feeds")?;
    info!("Feed published at {}", snapshot.last_updated);

    // Resolve every station
    let pb = ProgressBar::new(snapshot.stations.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})",
            )?
            .progress_chars("#>-"),
    );

    let mut unlocated = UnlocatedReport::default();
    for station in snapshot.stations.iter_mut() {
        resolver.annotate_station(station, &mut unlocated);
        pb.inc(1);
    }
    pb.finish_and_clear();
    snapshot.unlocated = unlocated;

    let totals = NetworkTotals::compute(&snapshot.stations);
    info!(
        "Stations: {} total, {} in service",
        totals.stations, totals.in_service
    );
    info!(
        "Bikes available: {} ({} mechanical, {} ebike)",
        totals.bikes_available, totals.mechanical, totals.ebike
    );
    info!(
        "Docks: {} free of {} total",
        totals.free_docks, totals.capacity
    );

    for row in by_department(&snapshot.stations) {
        info!(
            "Department {}: {} stations ({} working), {} bikes ({} mech / {} ebike), {} docks",
            row.department,
            row.total_stations,
            row.working_stations,
            row.total_bikes,
            row.mechanical_bikes,
            row.ebikes,
            row.total_docks
        );
    }

    if !snapshot.unlocated.is_empty() {
        warn!(
            "{} stations could not be attached to a department or commune",
            snapshot.unlocated.count()
        );
        for station in &snapshot.unlocated.stations {
            warn!(
                "  {} ({}) at lon={} lat={}",
                station.name, station.station_id, station.lon, station.lat
            );
        }
    }

    if let Some(path) = &args.trips_file {
        report_trips(path, args.days)?;
    }

    Ok(())
}

fn report_trips(path: &Path, days: u64) -> Result<()> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open trips file {}", path.display()))?;
    let trips: Vec<TripRecord> =
        serde_json::from_reader(BufReader::new(file)).context("Failed to parse trips file")?;

    let window = within_window(&trips, Utc::now(), days);
    info!(
        "Trips in the last {} days: {} of {} exported",
        days,
        window.len(),
        trips.len()
    );

    let totals = TripTotals::compute(&window);
    if let Some(top) = &totals.top_bike {
        info!(
            "Most used bike: {} ({} trips, {} bikes seen)",
            top.bike_id, top.trips, totals.bikes
        );
    }
    if let (Some(mean), Some(median)) = (totals.mean_duration_min, totals.median_duration_min) {
        info!("Duration: mean {:.1} min, median {:.1} min", mean, median);
    }
    if let Some(longest) = &totals.longest_trip {
        info!(
            "Longest trip: {:.0} min on bike {}",
            longest.duration_min, longest.bike_id
        );
    }
    if let Some(longest) = longest_by_distance(&window) {
        info!(
            "Longest distance: {:.1} km, {} -> {}",
            longest.distance_km, longest.start_station_name, longest.end_station_name
        );
    }

    let comparison = mode_comparison(&window);
    info!(
        "Electric: {} trips, {:.1} km total",
        comparison.electric_trips, comparison.electric_distance_km
    );
    info!(
        "Mechanical: {} trips, {:.1} km total",
        comparison.mechanical_trips, comparison.mechanical_distance_km
    );

    let pace = pace_stats(&window);
    if let (Some(mean), Some(median)) = (pace.mean_distance_km, pace.median_distance_km) {
        info!("Distance: mean {:.2} km, median {:.2} km", mean, median);
    }
    if let (Some(mean), Some(median)) = (pace.mean_speed_kmh, pace.median_speed_kmh) {
        info!("Speed: mean {:.2} km/h, median {:.2} km/h", mean, median);
    }
    if let Some(share) = short_trip_share(&window) {
        info!("Short trips (<5 min): {:.1}%", share);
    }

    let histogram = duration_histogram(&window);
    info!(
        "Durations: <=5 min: {}, 5-15: {}, 15-30: {}, >30: {}",
        histogram.under_5, histogram.from_5_to_15, histogram.from_15_to_30, histogram.over_30
    );

    info!("Top station pairs:");
    for pair in top_station_pairs(&window, 10) {
        info!("  {} -> {}: {} trips", pair.start, pair.end, pair.trips);
    }

    info!("Busiest stations:");
    for row in station_activity(&window).into_iter().take(10) {
        info!(
            "  {}: {} departures, {} arrivals",
            row.name, row.departures, row.arrivals
        );
    }

    Ok(())
}
