//! Aggregates over live station records.

use std::collections::BTreeMap;

use hashbrown::HashSet;
use serde::Serialize;

use crate::models::StationRecord;

/// Whole-network headline numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NetworkTotals {
    pub stations: usize,
    pub in_service: usize,
    pub bikes_available: u64,
    pub mechanical: u64,
    pub ebike: u64,
    pub docks_available: u64,
    pub capacity: u64,
    pub free_docks: u64,
}

impl NetworkTotals {
    pub fn compute(stations: &[StationRecord]) -> Self {
        let mut totals = Self::default();

        for station in stations {
            totals.stations += 1;
            if station.is_installed {
                totals.in_service += 1;
            }
            totals.bikes_available += u64::from(station.bikes_available);
            totals.mechanical += u64::from(station.mechanical);
            totals.ebike += u64::from(station.ebike);
            totals.docks_available += u64::from(station.docks_available);
            totals.capacity += u64::from(station.capacity);
        }

        // Derived from the per-type counts, clamped at zero: capacity and
        // live counts can disagree transiently
        totals.free_docks = totals
            .capacity
            .saturating_sub(totals.mechanical + totals.ebike);

        totals
    }
}

/// Per-department aggregate row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepartmentMetrics {
    pub department: String,
    pub total_stations: usize,
    pub working_stations: usize,
    pub total_bikes: u64,
    pub mechanical_bikes: u64,
    pub ebikes: u64,
    pub total_docks: u64,
}

/// Group annotated stations by resolved department code.
///
/// Unlocated stations are excluded; rows come back in ascending code order.
pub fn by_department(stations: &[StationRecord]) -> Vec<DepartmentMetrics> {
    let mut groups: BTreeMap<&str, DepartmentMetrics> = BTreeMap::new();

    for station in stations {
        let code = match station.department.as_deref() {
            Some(code) => code,
            None => continue,
        };

        let row = groups.entry(code).or_insert_with(|| DepartmentMetrics {
            department: code.to_string(),
            total_stations: 0,
            working_stations: 0,
            total_bikes: 0,
            mechanical_bikes: 0,
            ebikes: 0,
            total_docks: 0,
        });

        row.total_stations += 1;
        if station.is_installed {
            row.working_stations += 1;
        }
        row.total_bikes += u64::from(station.bikes_available);
        row.mechanical_bikes += u64::from(station.mechanical);
        row.ebikes += u64::from(station.ebike);
        row.total_docks += u64::from(station.capacity);
    }

    groups.into_values().collect()
}

/// Distinct commune names of a department for the locality filter control.
///
/// Arrondissement-style names order by their number; names without digits
/// come first, keeping their appearance order.
pub fn commune_filter_options(stations: &[StationRecord], department: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut options: Vec<String> = Vec::new();

    for station in stations {
        if station.department.as_deref() != Some(department) {
            continue;
        }
        let commune = match station.commune.as_deref() {
            Some(commune) => commune,
            None => continue,
        };
        if seen.insert(commune.to_string()) {
            options.push(commune.to_string());
        }
    }

    options.sort_by_key(|name| arrondissement_rank(name));
    options
}

fn arrondissement_rank(name: &str) -> u64 {
    let digits: String = name.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn station(
        id: i64,
        installed: bool,
        mechanical: u32,
        ebike: u32,
        capacity: u32,
        department: Option<&str>,
        commune: Option<&str>,
    ) -> StationRecord {
        StationRecord {
            station_id: id,
            station_code: None,
            name: format!("station-{}", id),
            lat: 48.85,
            lon: 2.35,
            capacity,
            bikes_available: mechanical + ebike,
            mechanical,
            ebike,
            docks_available: capacity.saturating_sub(mechanical + ebike),
            is_installed: installed,
            is_renting: installed,
            is_returning: installed,
            last_reported: None,
            department: department.map(String::from),
            commune: commune.map(String::from),
        }
    }

    #[test]
    fn test_network_totals() {
        let stations = vec![
            station(1, true, 3, 2, 20, Some("75"), Some("Paris")),
            station(2, false, 0, 1, 10, Some("92"), Some("Clichy")),
        ];

        let totals = NetworkTotals::compute(&stations);
        assert_eq!(totals.stations, 2);
        assert_eq!(totals.in_service, 1);
        assert_eq!(totals.bikes_available, 6);
        assert_eq!(totals.mechanical, 3);
        assert_eq!(totals.ebike, 3);
        assert_eq!(totals.capacity, 30);
        assert_eq!(totals.free_docks, 24);
    }

    #[test]
    fn test_by_department_groups_and_orders() {
        let stations = vec![
            station(1, true, 3, 2, 20, Some("92"), Some("Clichy")),
            station(2, true, 1, 1, 15, Some("75"), Some("Paris")),
            station(3, false, 0, 4, 25, Some("75"), Some("Paris")),
            station(4, true, 2, 0, 18, None, None),
        ];

        let rows = by_department(&stations);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].department, "75");
        assert_eq!(rows[0].total_stations, 2);
        assert_eq!(rows[0].working_stations, 1);
        assert_eq!(rows[0].total_bikes, 6);
        assert_eq!(rows[0].total_docks, 40);
        assert_eq!(rows[1].department, "92");
        assert_eq!(rows[1].total_stations, 1);
    }

    #[test]
    fn test_commune_filter_options_arrondissement_order() {
        let stations = vec![
            station(1, true, 1, 0, 10, Some("75"), Some("Paris 11e Arrondissement")),
            station(2, true, 1, 0, 10, Some("75"), Some("Paris 2e Arrondissement")),
            station(3, true, 1, 0, 10, Some("92"), Some("Clichy")),
            station(4, true, 1, 0, 10, Some("75"), Some("Paris 2e Arrondissement")),
        ];

        let options = commune_filter_options(&stations, "75");
        assert_eq!(
            options,
            vec!["Paris 2e Arrondissement", "Paris 11e Arrondissement"]
        );
    }

    #[test]
    fn test_names_without_digits_sort_first() {
        let stations = vec![
            station(1, true, 1, 0, 10, Some("92"), Some("Boulogne-Billancourt")),
            station(2, true, 1, 0, 10, Some("92"), Some("Clichy")),
        ];

        let options = commune_filter_options(&stations, "92");
        // Both rank 0: appearance order is kept
        assert_eq!(options, vec!["Boulogne-Billancourt", "Clichy"]);
    }
}
