//! Spatial index for region boundary lookups.

use geo::{Contains, Point};
use rstar::{RTree, RTreeObject, AABB};
use std::sync::Arc;
use tracing::debug;

use super::RegionBoundary;

/// Wrapper for R-tree indexing of region boundaries
#[derive(Clone)]
struct IndexedBoundary {
    boundary: Arc<RegionBoundary>,
    envelope: AABB<[f64; 2]>,
    /// Position in the loaded dataset; ties between overlapping boundaries
    /// are broken by the smallest ordinal.
    ord: usize,
}

impl RTreeObject for IndexedBoundary {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

impl IndexedBoundary {
    fn new(boundary: RegionBoundary, ord: usize) -> Option<Self> {
        let (min_x, min_y, max_x, max_y) = boundary.bbox()?;
        Some(Self {
            boundary: Arc::new(boundary),
            envelope: AABB::from_corners([min_x, min_y], [max_x, max_y]),
            ord,
        })
    }
}

/// Immutable spatial index over region boundaries using an R-tree.
///
/// Candidate boundaries are found by envelope intersection, then filtered
/// with an exact containment test. The first match follows dataset load
/// order regardless of tree enumeration order.
pub struct BoundaryIndex {
    tree: RTree<IndexedBoundary>,
}

impl BoundaryIndex {
    /// Build the index from boundaries in dataset load order.
    pub fn build(boundaries: Vec<RegionBoundary>) -> Self {
        let indexed: Vec<IndexedBoundary> = boundaries
            .into_iter()
            .enumerate()
            .filter_map(|(ord, b)| IndexedBoundary::new(b, ord))
            .collect();

        let tree = RTree::bulk_load(indexed);
        debug!("Boundary index built with {} entries", tree.size());

        Self { tree }
    }

    /// Find the first loaded boundary containing the point, if any.
    pub fn locate(&self, lon: f64, lat: f64) -> Option<&RegionBoundary> {
        let point = Point::new(lon, lat);
        let query_envelope = AABB::from_point([lon, lat]);

        self.tree
            .locate_in_envelope_intersecting(&query_envelope)
            .filter(|ib| ib.boundary.geometry.contains(&point))
            .min_by_key(|ib| ib.ord)
            .map(|ib| ib.boundary.as_ref())
    }

    /// Get total number of indexed boundaries
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Iterate over all indexed boundaries
    pub fn boundaries(&self) -> impl Iterator<Item = &RegionBoundary> {
        self.tree.iter().map(|ib| ib.boundary.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, MultiPolygon};

    fn square(min: f64, max: f64) -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: min, y: min),
            (x: max, y: min),
            (x: max, y: max),
            (x: min, y: max),
            (x: min, y: min),
        ]])
    }

    #[test]
    fn test_locate_inside_and_outside() {
        let index = BoundaryIndex::build(vec![
            RegionBoundary::new("a", "A", square(0.0, 1.0)),
            RegionBoundary::new("b", "B", square(2.0, 3.0)),
        ]);

        assert_eq!(index.locate(0.5, 0.5).map(|b| b.key.as_str()), Some("a"));
        assert_eq!(index.locate(2.5, 2.5).map(|b| b.key.as_str()), Some("b"));
        assert!(index.locate(5.0, 5.0).is_none());
    }

    #[test]
    fn test_overlap_resolves_to_first_loaded() {
        // Both squares contain (0.5, 0.5); load order decides
        let index = BoundaryIndex::build(vec![
            RegionBoundary::new("first", "First", square(0.0, 1.0)),
            RegionBoundary::new("second", "Second", square(0.0, 2.0)),
        ]);

        assert_eq!(
            index.locate(0.5, 0.5).map(|b| b.key.as_str()),
            Some("first")
        );
    }

    #[test]
    fn test_empty_index() {
        let index = BoundaryIndex::build(vec![]);
        assert!(index.is_empty());
        assert!(index.locate(0.0, 0.0).is_none());
    }
}
