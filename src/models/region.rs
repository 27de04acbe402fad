//! Region resolution results and diagnostics.

use serde::{Deserialize, Serialize};

/// Reference to a resolved administrative region.
///
/// For departments the key is the INSEE code (e.g. "75") and the label the
/// department name; for communes both are the commune name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionRef {
    pub key: String,
    pub label: String,
}

impl RegionRef {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
        }
    }
}

/// Outcome of resolving one query point at both granularities.
///
/// The two lookups are independent: a point may resolve to a department
/// without matching any commune contour, or the other way around. No match
/// is `None`, never an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<RegionRef>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub commune: Option<RegionRef>,
}

impl Resolution {
    /// Resolved at both granularities?
    pub fn is_located(&self) -> bool {
        self.department.is_some() && self.commune.is_some()
    }
}

/// A station that could not be attached to a department or commune.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnlocatedStation {
    pub station_id: i64,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    /// True when the coordinates were not finite and resolution was skipped.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub invalid_coords: bool,
}

/// Diagnostic report produced by batch station annotation.
///
/// Unlocated stations are surfaced to the operator, never silently dropped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnlocatedReport {
    pub total: usize,
    pub stations: Vec<UnlocatedStation>,
}

impl UnlocatedReport {
    pub fn count(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }
}
