//! Dashboard API server.
//!
//! Builds the region resolver once at startup, then serves aggregated
//! station statistics over HTTP: network totals, per-department metrics,
//! commune filter options, and the unlocated-station diagnostic.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use velibstat::config::Config;
use velibstat::gbfs::{FeedClient, SnapshotCache};
use velibstat::locate::RegionResolver;
use velibstat::models::{Resolution, Snapshot, StationRecord, UnlocatedReport};
use velibstat::stats::{by_department, commune_filter_options, DepartmentMetrics, NetworkTotals};

#[derive(Parser, Debug)]
#[command(name = "server")]
#[command(about = "Dashboard API server")]
struct Args {
    /// Config file (TOML); defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address override
    #[arg(short, long)]
    listen: Option<String>,
}

/// Application state shared across handlers
struct AppState {
    resolver: Arc<RegionResolver>,
    cache: SnapshotCache,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::default(),
    };
    if let Some(listen) = args.listen {
        config.server.listen = listen;
    }

    info!("Velibstat API Server");
    info!("Loading contours from {}", config.contours.path.display());

    let resolver = Arc::new(
        RegionResolver::from_path(&config.contours.path)
            .context("Failed to build region resolver")?,
    );
    let skipped = resolver.load_report().skipped.len();
    if skipped > 0 {
        warn!("{} contour records skipped at load", skipped);
    }
    info!("{} contours indexed", resolver.contour_count());

    let client = FeedClient::new(&config.feeds.status_url, &config.feeds.information_url)?;
    let cache = SnapshotCache::new(
        client,
        Arc::clone(&resolver),
        Duration::from_secs(config.feeds.cache_ttl_secs),
    );

    let state = Arc::new(AppState { resolver, cache });

    // Build router
    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/v1/network", get(network_handler))
        .route("/v1/departments", get(departments_handler))
        .route("/v1/departments/{code}/communes", get(communes_handler))
        .route("/v1/stations", get(stations_handler))
        .route("/v1/unlocated", get(unlocated_handler))
        .route("/v1/resolve", get(resolve_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!("Starting server on {}", config.server.listen);

    let listener = tokio::net::TcpListener::bind(&config.server.listen).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Current snapshot, or 502 when the upstream feeds fail.
async fn current_snapshot(state: &AppState) -> Result<Arc<Snapshot>, (StatusCode, String)> {
    state.cache.snapshot().await.map_err(|e| {
        tracing::error!("Snapshot fetch failed: {:#}", e);
        (StatusCode::BAD_GATEWAY, e.to_string())
    })
}

/// Health check endpoint
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        contours: state.resolver.contour_count(),
        skipped_records: state.resolver.load_report().skipped.len(),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    contours: usize,
    skipped_records: usize,
}

/// Whole-network headline numbers
async fn network_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<NetworkResponse>, (StatusCode, String)> {
    let snapshot = current_snapshot(&state).await?;

    Ok(Json(NetworkResponse {
        last_updated: snapshot.last_updated,
        totals: NetworkTotals::compute(&snapshot.stations),
        unlocated: snapshot.unlocated.count(),
    }))
}

#[derive(Serialize)]
struct NetworkResponse {
    last_updated: DateTime<Utc>,
    totals: NetworkTotals,
    unlocated: usize,
}

/// Per-department aggregate rows
async fn departments_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<DepartmentMetrics>>, (StatusCode, String)> {
    let snapshot = current_snapshot(&state).await?;
    Ok(Json(by_department(&snapshot.stations)))
}

/// Commune filter options for one department
async fn communes_handler(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<Vec<String>>, (StatusCode, String)> {
    let snapshot = current_snapshot(&state).await?;
    Ok(Json(commune_filter_options(&snapshot.stations, &code)))
}

#[derive(Deserialize)]
struct StationsQueryParams {
    department: Option<String>,
    commune: Option<String>,
}

/// Station list for the map view, optionally filtered
async fn stations_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StationsQueryParams>,
) -> Result<Json<Vec<StationRecord>>, (StatusCode, String)> {
    let snapshot = current_snapshot(&state).await?;

    let stations = snapshot
        .stations
        .iter()
        .filter(|s| match &params.department {
            Some(code) => s.department.as_deref() == Some(code.as_str()),
            None => true,
        })
        .filter(|s| match &params.commune {
            Some(name) => s.commune.as_deref() == Some(name.as_str()),
            None => true,
        })
        .cloned()
        .collect();

    Ok(Json(stations))
}

/// Stations the resolver could not place
async fn unlocated_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<UnlocatedReport>, (StatusCode, String)> {
    let snapshot = current_snapshot(&state).await?;
    Ok(Json(snapshot.unlocated.clone()))
}

#[derive(Deserialize)]
struct ResolveQueryParams {
    lon: f64,
    lat: f64,
}

/// Single-point region resolution
async fn resolve_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ResolveQueryParams>,
) -> Result<Json<Resolution>, (StatusCode, String)> {
    let resolution = state
        .resolver
        .resolve(params.lon, params.lat)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    Ok(Json(resolution))
}
