//! Region boundary with metadata for spatial indexing.

use geo::MultiPolygon;

/// One region contour with its lookup key.
///
/// A region may be multi-part: several boundaries can share a key (every
/// commune contour of a department carries that department's code).
#[derive(Debug, Clone)]
pub struct RegionBoundary {
    /// Lookup key: department code or commune name.
    pub key: String,
    /// Display label: department name or commune name.
    pub label: String,
    pub geometry: MultiPolygon<f64>,
}

impl RegionBoundary {
    pub fn new(key: impl Into<String>, label: impl Into<String>, geometry: MultiPolygon<f64>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            geometry,
        }
    }

    /// Get the bounding box of this boundary
    pub fn bbox(&self) -> Option<(f64, f64, f64, f64)> {
        use geo::BoundingRect;
        self.geometry
            .bounding_rect()
            .map(|rect| (rect.min().x, rect.min().y, rect.max().x, rect.max().y))
    }
}
