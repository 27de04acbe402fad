//! Region resolution: point-in-polygon lookup of the department and
//! commune containing a station, backed by an R-tree spatial index over
//! administrative contours loaded from a static GeoJSON-style dataset.

mod boundary;
mod dataset;
mod index;
mod resolver;

pub use boundary::RegionBoundary;
pub use dataset::{load_dataset, parse_dataset, CommuneBoundary, LoadReport};
pub use index::BoundaryIndex;
pub use resolver::{LocateError, RegionResolver};
