//! Region resolver: the two-granularity lookup service.

use std::path::Path;

use anyhow::Result;
use thiserror::Error;
use tracing::info;

use super::{load_dataset, BoundaryIndex, CommuneBoundary, LoadReport, RegionBoundary};
use crate::models::{RegionRef, Resolution, StationRecord, UnlocatedReport, UnlocatedStation};

/// Resolver query failure.
#[derive(Debug, Error, PartialEq)]
pub enum LocateError {
    #[error("non-finite query coordinates: lon={lon}, lat={lat}")]
    InvalidInput { lon: f64, lat: f64 },
}

/// Immutable two-granularity region lookup.
///
/// Built once at process start from the contour dataset and shared by
/// reference afterwards; queries are pure and take `&self`, so concurrent
/// readers need no locking.
pub struct RegionResolver {
    departments: BoundaryIndex,
    communes: BoundaryIndex,
    report: LoadReport,
}

impl RegionResolver {
    /// Build both indexes from commune records, in dataset load order.
    ///
    /// The same contour is indexed twice: once under its department code,
    /// once under its commune name. The two indexes are independent.
    pub fn new(records: Vec<CommuneBoundary>, report: LoadReport) -> Self {
        let mut departments = Vec::with_capacity(records.len());
        let mut communes = Vec::with_capacity(records.len());

        for record in records {
            departments.push(RegionBoundary::new(
                record.department_code.clone(),
                record.department_name.clone(),
                record.geometry.clone(),
            ));
            communes.push(RegionBoundary::new(
                record.commune.clone(),
                record.commune,
                record.geometry,
            ));
        }

        let departments = BoundaryIndex::build(departments);
        let communes = BoundaryIndex::build(communes);

        info!(
            "Region resolver ready: {} contours indexed, {} records skipped at load",
            departments.len(),
            report.skipped.len()
        );

        Self {
            departments,
            communes,
            report,
        }
    }

    /// Load the contour dataset and build the resolver.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let (records, report) = load_dataset(path)?;
        Ok(Self::new(records, report))
    }

    /// Resolve a point at both granularities.
    ///
    /// Non-finite coordinates fail with [`LocateError::InvalidInput`]; any
    /// finite point yields a (possibly unresolved) [`Resolution`].
    pub fn resolve(&self, lon: f64, lat: f64) -> Result<Resolution, LocateError> {
        if !lon.is_finite() || !lat.is_finite() {
            return Err(LocateError::InvalidInput { lon, lat });
        }

        let department = self
            .departments
            .locate(lon, lat)
            .map(|b| RegionRef::new(&b.key, &b.label));
        let commune = self
            .communes
            .locate(lon, lat)
            .map(|b| RegionRef::new(&b.key, &b.label));

        Ok(Resolution {
            department,
            commune,
        })
    }

    /// Annotate one station in place, recording it in the report when it
    /// cannot be attached to both a department and a commune.
    pub fn annotate_station(&self, station: &mut StationRecord, report: &mut UnlocatedReport) {
        report.total += 1;

        let resolution = match self.resolve(station.lon, station.lat) {
            Ok(resolution) => resolution,
            Err(LocateError::InvalidInput { .. }) => {
                report.stations.push(UnlocatedStation {
                    station_id: station.station_id,
                    name: station.name.clone(),
                    lat: station.lat,
                    lon: station.lon,
                    invalid_coords: true,
                });
                return;
            }
        };

        station.department = resolution.department.as_ref().map(|r| r.key.clone());
        station.commune = resolution.commune.as_ref().map(|r| r.key.clone());

        if !resolution.is_located() {
            report.stations.push(UnlocatedStation {
                station_id: station.station_id,
                name: station.name.clone(),
                lat: station.lat,
                lon: station.lon,
                invalid_coords: false,
            });
        }
    }

    /// Annotate every station and collect the unlocated ones.
    pub fn annotate(&self, stations: &mut [StationRecord]) -> UnlocatedReport {
        let mut report = UnlocatedReport::default();
        for station in stations.iter_mut() {
            self.annotate_station(station, &mut report);
        }
        report
    }

    /// Diagnostics from dataset loading.
    pub fn load_report(&self) -> &LoadReport {
        &self.report
    }

    /// Number of indexed contours (same for both granularities).
    pub fn contour_count(&self) -> usize {
        self.departments.len()
    }

    pub fn departments(&self) -> &BoundaryIndex {
        &self.departments
    }

    pub fn communes(&self) -> &BoundaryIndex {
        &self.communes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locate::parse_dataset;
    use serde_json::json;

    fn paris_dataset() -> RegionResolver {
        // Coarse squares standing in for real contours: central Paris and
        // a neighbouring commune
        let root = json!([
            {
                "nom": "Paris",
                "departement": { "code": "75", "nom": "Paris" },
                "contour": {
                    "type": "Polygon",
                    "coordinates": [[
                        [2.25, 48.81], [2.42, 48.81], [2.42, 48.90], [2.25, 48.90], [2.25, 48.81]
                    ]]
                }
            },
            {
                "nom": "Pantin",
                "departement": { "code": "93", "nom": "Seine-Saint-Denis" },
                "contour": {
                    "type": "Polygon",
                    "coordinates": [[
                        [2.42, 48.88], [2.43, 48.88], [2.43, 48.92], [2.42, 48.92], [2.42, 48.88]
                    ]]
                }
            }
        ]);
        let (records, report) = parse_dataset(&root);
        RegionResolver::new(records, report)
    }

    fn station(id: i64, name: &str, lon: f64, lat: f64) -> StationRecord {
        StationRecord {
            station_id: id,
            station_code: None,
            name: name.to_string(),
            lat,
            lon,
            capacity: 20,
            bikes_available: 5,
            mechanical: 3,
            ebike: 2,
            docks_available: 15,
            is_installed: true,
            is_renting: true,
            is_returning: true,
            last_reported: None,
            department: None,
            commune: None,
        }
    }

    #[test]
    fn test_hotel_de_ville_resolves_to_paris() {
        let resolver = paris_dataset();
        let resolution = resolver.resolve(2.3522, 48.8566).unwrap();

        assert_eq!(resolution.department.as_ref().unwrap().key, "75");
        assert_eq!(resolution.commune.as_ref().unwrap().key, "Paris");
    }

    #[test]
    fn test_point_outside_every_contour_is_unresolved() {
        let resolver = paris_dataset();
        let resolution = resolver.resolve(5.0, 45.0).unwrap();

        assert!(resolution.department.is_none());
        assert!(resolution.commune.is_none());
        assert!(!resolution.is_located());
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let resolver = paris_dataset();
        let first = resolver.resolve(2.3522, 48.8566).unwrap();
        let second = resolver.resolve(2.3522, 48.8566).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_non_finite_coordinates_fail() {
        let resolver = paris_dataset();
        assert!(matches!(
            resolver.resolve(f64::NAN, 48.85),
            Err(LocateError::InvalidInput { .. })
        ));
        assert!(matches!(
            resolver.resolve(2.35, f64::INFINITY),
            Err(LocateError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_malformed_record_does_not_poison_valid_ones() {
        let root = json!([
            { "nom": "Cassée", "contour": null },
            {
                "nom": "Paris",
                "departement": { "code": "75", "nom": "Paris" },
                "contour": {
                    "type": "Polygon",
                    "coordinates": [[
                        [2.25, 48.81], [2.42, 48.81], [2.42, 48.90], [2.25, 48.90], [2.25, 48.81]
                    ]]
                }
            }
        ]);
        let (records, report) = parse_dataset(&root);
        let resolver = RegionResolver::new(records, report);

        assert_eq!(resolver.contour_count(), 1);
        assert_eq!(resolver.load_report().skipped.len(), 1);

        let resolution = resolver.resolve(2.3522, 48.8566).unwrap();
        assert_eq!(resolution.department.as_ref().unwrap().key, "75");
    }

    #[test]
    fn test_annotate_partitions_stations() {
        let resolver = paris_dataset();
        let mut stations = vec![
            station(1, "Hôtel de Ville", 2.3522, 48.8566),
            station(2, "Nulle part", 5.0, 45.0),
            station(3, "Coordonnées cassées", f64::NAN, 48.85),
        ];

        let report = resolver.annotate(&mut stations);

        assert_eq!(report.total, 3);
        assert_eq!(report.count(), 2);
        assert_eq!(stations[0].department.as_deref(), Some("75"));
        assert_eq!(stations[0].commune.as_deref(), Some("Paris"));
        assert!(stations[1].department.is_none());
        assert!(report.stations.iter().any(|s| s.invalid_coords));
    }

    #[test]
    fn test_overlap_first_match_follows_load_order() {
        let root = json!([
            {
                "nom": "Paris",
                "departement": { "code": "75", "nom": "Paris" },
                "contour": {
                    "type": "Polygon",
                    "coordinates": [[
                        [2.25, 48.81], [2.42, 48.81], [2.42, 48.90], [2.25, 48.90], [2.25, 48.81]
                    ]]
                }
            },
            {
                "nom": "Vincennes",
                "departement": { "code": "94", "nom": "Val-de-Marne" },
                "contour": {
                    "type": "Polygon",
                    "coordinates": [[
                        [2.40, 48.83], [2.47, 48.83], [2.47, 48.86], [2.40, 48.86], [2.40, 48.83]
                    ]]
                }
            }
        ]);
        let (records, report) = parse_dataset(&root);
        let resolver = RegionResolver::new(records, report);

        // Point inside both 75 and Vincennes squares: department resolves
        // to the first-loaded containing contour, commune likewise
        let resolution = resolver.resolve(2.41, 48.85).unwrap();
        assert_eq!(resolution.department.as_ref().unwrap().key, "75");
        assert_eq!(resolution.commune.as_ref().unwrap().key, "Paris");

        // Point only inside the Vincennes square
        let resolution = resolver.resolve(2.45, 48.84).unwrap();
        assert_eq!(resolution.department.as_ref().unwrap().key, "94");
        assert_eq!(resolution.commune.as_ref().unwrap().key, "Vincennes");
    }
}
