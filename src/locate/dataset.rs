//! Commune contour dataset loading.
//!
//! The source dataset is a JSON array of commune records, each carrying the
//! commune name, its owning department, and a GeoJSON Polygon/MultiPolygon
//! contour. Malformed records are skipped with a diagnostic; loading never
//! fails as a whole.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use geo::MultiPolygon;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

/// One valid commune record extracted from the dataset.
#[derive(Debug, Clone)]
pub struct CommuneBoundary {
    pub commune: String,
    pub department_code: String,
    pub department_name: String,
    pub geometry: MultiPolygon<f64>,
}

/// Diagnostics accumulated while loading the contour dataset.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    /// Records converted into boundaries.
    pub loaded: usize,
    /// One line per skipped record.
    pub skipped: Vec<String>,
}

impl LoadReport {
    fn skip(&mut self, reason: String) {
        warn!("skipping contour record: {}", reason);
        self.skipped.push(reason);
    }
}

#[derive(Debug, Deserialize)]
struct RawCommune {
    nom: Option<String>,
    departement: Option<RawDepartement>,
    contour: Option<geojson::Geometry>,
}

#[derive(Debug, Deserialize)]
struct RawDepartement {
    code: Option<String>,
    nom: Option<String>,
}

/// Load and parse the contour dataset from a file.
///
/// An unreadable or non-JSON file is an error; individual malformed records
/// are not (they are reported in the [`LoadReport`]).
pub fn load_dataset<P: AsRef<Path>>(path: P) -> Result<(Vec<CommuneBoundary>, LoadReport)> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read contour dataset {}", path.display()))?;
    let root: Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse contour dataset {}", path.display()))?;

    let (boundaries, report) = parse_dataset(&root);
    info!(
        "Loaded {} commune contours from {} ({} skipped)",
        report.loaded,
        path.display(),
        report.skipped.len()
    );
    Ok((boundaries, report))
}

/// Parse an already-deserialized dataset value.
///
/// The published dataset mixes flat records with entries that are themselves
/// arrays of records; both shapes are accepted.
pub fn parse_dataset(root: &Value) -> (Vec<CommuneBoundary>, LoadReport) {
    let mut boundaries = Vec::new();
    let mut report = LoadReport::default();

    let entries = match root.as_array() {
        Some(entries) => entries,
        None => {
            report.skip("dataset root is not an array".to_string());
            return (boundaries, report);
        }
    };

    for entry in entries {
        match entry {
            Value::Array(nested) => {
                for record in nested {
                    convert_record(record, &mut boundaries, &mut report);
                }
            }
            record => convert_record(record, &mut boundaries, &mut report),
        }
    }

    (boundaries, report)
}

fn convert_record(record: &Value, boundaries: &mut Vec<CommuneBoundary>, report: &mut LoadReport) {
    let raw: RawCommune = match serde_json::from_value(record.clone()) {
        Ok(raw) => raw,
        Err(e) => {
            report.skip(format!("entry is not a commune record: {}", e));
            return;
        }
    };

    let commune = match raw.nom {
        Some(nom) if !nom.is_empty() => nom,
        _ => {
            report.skip("record has no commune name".to_string());
            return;
        }
    };

    let departement = match raw.departement {
        Some(dep) => dep,
        None => {
            report.skip(format!("no department for commune {}", commune));
            return;
        }
    };

    let department_code = match departement.code {
        Some(code) if !code.is_empty() => code,
        _ => {
            report.skip(format!("no department code for commune {}", commune));
            return;
        }
    };

    // Display label falls back to the code when the name is absent
    let department_name = departement.nom.unwrap_or_else(|| department_code.clone());

    let contour = match raw.contour {
        Some(contour) => contour,
        None => {
            report.skip(format!("no contour for commune {}", commune));
            return;
        }
    };

    let geometry = match contour_to_multipolygon(&contour) {
        Ok(geometry) => geometry,
        Err(reason) => {
            report.skip(format!("bad contour for commune {}: {}", commune, reason));
            return;
        }
    };

    report.loaded += 1;
    boundaries.push(CommuneBoundary {
        commune,
        department_code,
        department_name,
        geometry,
    });
}

/// Convert a GeoJSON geometry into a `MultiPolygon`, rejecting
/// non-polygonal and degenerate shapes.
fn contour_to_multipolygon(contour: &geojson::Geometry) -> std::result::Result<MultiPolygon<f64>, String> {
    let geometry = geo_types::Geometry::<f64>::try_from(contour)
        .map_err(|e| format!("geometry conversion failed: {}", e))?;

    let multi = match geometry {
        geo_types::Geometry::Polygon(polygon) => MultiPolygon::new(vec![polygon]),
        geo_types::Geometry::MultiPolygon(multi) => multi,
        other => return Err(format!("not a polygon geometry: {:?}", kind_of(&other))),
    };

    if multi.0.is_empty() {
        return Err("empty multipolygon".to_string());
    }

    // A closed ring needs at least 4 coordinates
    for polygon in &multi {
        if polygon.exterior().0.len() < 4 {
            return Err("degenerate exterior ring".to_string());
        }
    }

    Ok(multi)
}

fn kind_of(geometry: &geo_types::Geometry<f64>) -> &'static str {
    match geometry {
        geo_types::Geometry::Point(_) => "Point",
        geo_types::Geometry::Line(_) => "Line",
        geo_types::Geometry::LineString(_) => "LineString",
        geo_types::Geometry::Polygon(_) => "Polygon",
        geo_types::Geometry::MultiPoint(_) => "MultiPoint",
        geo_types::Geometry::MultiLineString(_) => "MultiLineString",
        geo_types::Geometry::MultiPolygon(_) => "MultiPolygon",
        geo_types::Geometry::GeometryCollection(_) => "GeometryCollection",
        geo_types::Geometry::Rect(_) => "Rect",
        geo_types::Geometry::Triangle(_) => "Triangle",
    }
}
