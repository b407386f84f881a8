// Tower registry
// Tower id -> location lookup with radius queries and record enrichment

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::AnalysisConfig;
use crate::entities::{Table, TowerLocation, TowerRecord};
use crate::services::geo;
use crate::services::schema::{
    normalize_columns, AliasTable, COL_ADDRESS, COL_AREA, COL_CITY, COL_COVERAGE_RADIUS, COL_LAT,
    COL_LONG, COL_STATE, COL_TOWER_ID,
};
use crate::utils::{value_as_f64, value_to_string};

/// One radius-query hit: a known tower and its distance from the query
/// point.
#[derive(Debug, Clone, Serialize)]
pub struct TowerDistance<'a> {
    pub distance_km: f64,
    pub tower: &'a TowerLocation,
}

/// Read-only registry of tower locations. Built once from a reference
/// table and safe to share across concurrent readers.
#[derive(Debug, Clone)]
pub struct TowerRegistry {
    towers: BTreeMap<String, TowerLocation>,
    earth_radius_km: f64,
}

impl TowerRegistry {
    /// Build the registry from a reference table. Columns are normalized
    /// with the tower alias table; rows without a tower id or without
    /// usable coordinates are skipped. Duplicate ids keep the last row.
    pub fn from_table(mut table: Table, aliases: &AliasTable, config: &AnalysisConfig) -> Self {
        normalize_columns(&mut table, aliases);
        let mut towers = BTreeMap::new();
        let mut skipped = 0usize;
        for row in &table.rows {
            let tower_id = match row.get(COL_TOWER_ID).and_then(value_to_string) {
                Some(id) => id,
                None => {
                    skipped += 1;
                    continue;
                }
            };
            let lat = row.get(COL_LAT).and_then(value_as_f64);
            let long = row.get(COL_LONG).and_then(value_as_f64);
            let (lat, long) = match (lat, long) {
                (Some(lat), Some(long)) => (lat, long),
                _ => {
                    skipped += 1;
                    continue;
                }
            };
            let coverage_radius_km = row
                .get(COL_COVERAGE_RADIUS)
                .and_then(value_as_f64)
                .unwrap_or(config.default_coverage_radius_km);
            let location = TowerLocation {
                tower_id: tower_id.clone(),
                lat,
                long,
                address: row.get(COL_ADDRESS).and_then(value_to_string),
                area: row.get(COL_AREA).and_then(value_to_string),
                city: row.get(COL_CITY).and_then(value_to_string),
                state: row.get(COL_STATE).and_then(value_to_string),
                coverage_radius_km,
            };
            if towers.insert(tower_id.clone(), location).is_some() {
                warn!(tower_id = %tower_id, "duplicate tower id in reference data, keeping last");
            }
        }
        if skipped > 0 {
            debug!(skipped, "skipped reference rows without id or coordinates");
        }
        Self {
            towers,
            earth_radius_km: config.earth_radius_km,
        }
    }

    pub fn len(&self) -> usize {
        self.towers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.towers.is_empty()
    }

    pub fn location_of(&self, tower_id: &str) -> Option<&TowerLocation> {
        self.towers.get(tower_id)
    }

    /// All towers within `radius_km` of the point, ascending by distance,
    /// ties broken by tower id ascending.
    pub fn towers_within(&self, lat: f64, long: f64, radius_km: f64) -> Vec<TowerDistance<'_>> {
        let mut hits: Vec<TowerDistance<'_>> = self
            .towers
            .values()
            .filter_map(|tower| {
                let distance_km =
                    geo::distance_km(self.earth_radius_km, lat, long, tower.lat, tower.long);
                (distance_km <= radius_km).then_some(TowerDistance { distance_km, tower })
            })
            .collect();
        hits.sort_by(|a, b| {
            a.distance_km
                .total_cmp(&b.distance_km)
                .then_with(|| a.tower.tower_id.cmp(&b.tower.tower_id))
        });
        hits
    }

    /// Towers within `max_distance_km` of a known tower, excluding the
    /// tower itself. Unknown ids yield an empty list.
    pub fn neighbors_of(&self, tower_id: &str, max_distance_km: f64) -> Vec<TowerDistance<'_>> {
        let Some(center) = self.location_of(tower_id) else {
            return Vec::new();
        };
        self.towers_within(center.lat, center.long, max_distance_km)
            .into_iter()
            .filter(|hit| hit.tower.tower_id != tower_id)
            .collect()
    }

    /// Estimated coverage overlap between two towers as a percentage.
    ///
    /// This is deliberately a linear interpolation over the separation,
    /// not an exact lens-area computation: 0 beyond the sum of radii, 100
    /// when one circle contains the other, `100 * (1 - d / (r1 + r2))`
    /// in between, clamped to [0, 100]. Consumers depend on this specific
    /// output range.
    pub fn coverage_overlap(&self, tower_a: &str, tower_b: &str) -> f64 {
        let (Some(a), Some(b)) = (self.location_of(tower_a), self.location_of(tower_b)) else {
            return 0.0;
        };
        let separation = geo::distance_km(self.earth_radius_km, a.lat, a.long, b.lat, b.long);
        let r1 = a.coverage_radius_km;
        let r2 = b.coverage_radius_km;
        if separation > r1 + r2 {
            return 0.0;
        }
        if separation <= (r1 - r2).abs() {
            return 100.0;
        }
        (100.0 * (1.0 - separation / (r1 + r2))).clamp(0.0, 100.0)
    }

    /// Attach tower location fields to each record by id lookup. Records
    /// whose tower is unknown keep null enrichment fields. Canonical
    /// fields are never touched. Returns the number of enriched records.
    pub fn enrich(&self, records: &mut [TowerRecord]) -> usize {
        let mut enriched = 0usize;
        for record in records.iter_mut() {
            let Some(tower) = self.location_of(&record.tower_id) else {
                continue;
            };
            record.tower_lat = Some(tower.lat);
            record.tower_long = Some(tower.long);
            record.tower_address = tower.address.clone();
            record.tower_area = tower.area.clone();
            record.tower_city = tower.city.clone();
            record.tower_state = tower.state.clone();
            enriched += 1;
        }
        debug!(enriched, "enriched records with tower locations");
        enriched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use serde_json::{json, Value};
    use std::collections::HashMap;

    fn reference_table(rows: Vec<(&str, f64, f64, Option<f64>)>) -> Table {
        let columns = ["cell_id", "latitude", "longitude", "radius", "city"];
        let mut table = Table::new(columns.iter().map(|c| c.to_string()).collect());
        for (id, lat, long, radius) in rows {
            let mut row: HashMap<String, Value> = HashMap::new();
            row.insert("cell_id".to_string(), json!(id));
            row.insert("latitude".to_string(), json!(lat));
            row.insert("longitude".to_string(), json!(long));
            row.insert(
                "radius".to_string(),
                radius.map(|r| json!(r)).unwrap_or(Value::Null),
            );
            row.insert("city".to_string(), json!("Delhi"));
            table.push_row(row);
        }
        table
    }

    fn registry(rows: Vec<(&str, f64, f64, Option<f64>)>) -> TowerRegistry {
        TowerRegistry::from_table(
            reference_table(rows),
            &AliasTable::tower_defaults(),
            &AnalysisConfig::default(),
        )
    }

    #[test]
    fn reference_columns_are_normalized_and_radius_defaults() {
        let registry = registry(vec![("TWR001", 28.6139, 77.2090, None)]);
        let tower = registry.location_of("TWR001").expect("tower");
        assert_eq!(tower.lat, 28.6139);
        assert_eq!(tower.coverage_radius_km, 1.0);
        assert_eq!(tower.city.as_deref(), Some("Delhi"));
    }

    #[test]
    fn towers_within_sorts_by_distance_then_id() {
        let registry = registry(vec![
            ("TWR_B", 28.6239, 77.2090, None),
            ("TWR_A", 28.6239, 77.2090, None),
            ("TWR_FAR", 29.6139, 77.2090, None),
            ("TWR_NEAR", 28.6149, 77.2090, None),
        ]);
        let hits = registry.towers_within(28.6139, 77.2090, 5.0);
        let ids: Vec<&str> = hits.iter().map(|h| h.tower.tower_id.as_str()).collect();
        // Equal-distance pair ordered by id; far tower outside the radius.
        assert_eq!(ids, vec!["TWR_NEAR", "TWR_A", "TWR_B"]);
    }

    #[test]
    fn neighbors_exclude_the_center_tower() {
        let registry = registry(vec![
            ("TWR001", 28.6139, 77.2090, None),
            ("TWR002", 28.6239, 77.2090, None),
        ]);
        let neighbors = registry.neighbors_of("TWR001", 5.0);
        assert_eq!(neighbors.len(), 1);
        assert_eq!(neighbors[0].tower.tower_id, "TWR002");
        assert!(registry.neighbors_of("UNKNOWN", 5.0).is_empty());
    }

    #[test]
    fn coverage_overlap_bounds() {
        let registry = registry(vec![
            ("A", 28.6139, 77.2090, Some(1.0)),
            ("B", 28.6139, 77.2090, Some(1.0)),
            // ~10 km north of A
            ("C", 28.7039, 77.2090, Some(1.0)),
        ]);
        assert_eq!(registry.coverage_overlap("A", "B"), 100.0);
        assert_eq!(registry.coverage_overlap("A", "C"), 0.0);
        assert_eq!(registry.coverage_overlap("A", "MISSING"), 0.0);
    }

    #[test]
    fn coverage_overlap_interpolates_between_bounds() {
        let registry = registry(vec![
            ("A", 28.6139, 77.2090, Some(2.0)),
            // ~2 km north: separation within r1 + r2 = 4 km
            ("B", 28.6319, 77.2090, Some(2.0)),
        ]);
        let overlap = registry.coverage_overlap("A", "B");
        assert!(overlap > 0.0 && overlap < 100.0, "got {overlap}");
    }

    #[test]
    fn enrich_fills_only_known_towers() {
        let registry = registry(vec![("TWR001", 28.6139, 77.2090, None)]);
        let timestamp =
            NaiveDateTime::parse_from_str("2023-03-15 10:00:00", "%Y-%m-%d %H:%M:%S").expect("ts");
        let mut records = vec![
            TowerRecord::new("9876543210".to_string(), "TWR001".to_string(), timestamp),
            TowerRecord::new("9876543211".to_string(), "UNKNOWN".to_string(), timestamp),
        ];
        let enriched = registry.enrich(&mut records);
        assert_eq!(enriched, 1);
        assert_eq!(records[0].tower_lat, Some(28.6139));
        assert_eq!(records[0].tower_city.as_deref(), Some("Delhi"));
        assert!(records[1].tower_lat.is_none());
        // Canonical fields untouched.
        assert_eq!(records[0].tower_id, "TWR001");
    }
}
