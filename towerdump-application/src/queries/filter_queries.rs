// Record filtering
// Time-window and location slices over the canonical record set

use chrono::{Duration, NaiveDateTime};
use tracing::debug;

use towerdump_domain::{geo, AnalysisConfig, TowerRecord};

/// Records inside [start, end], optionally widened by a buffer on both
/// sides.
pub fn filter_time_window(
    records: &[TowerRecord],
    start: NaiveDateTime,
    end: NaiveDateTime,
    buffer_minutes: i64,
) -> Vec<TowerRecord> {
    let start = start - Duration::minutes(buffer_minutes);
    let end = end + Duration::minutes(buffer_minutes);
    let filtered: Vec<TowerRecord> = records
        .iter()
        .filter(|record| record.timestamp >= start && record.timestamp <= end)
        .cloned()
        .collect();
    debug!(count = filtered.len(), "filtered records in time window");
    filtered
}

/// Records connected to any of the given towers.
pub fn filter_by_towers(records: &[TowerRecord], tower_ids: &[String]) -> Vec<TowerRecord> {
    records
        .iter()
        .filter(|record| tower_ids.iter().any(|id| *id == record.tower_id))
        .cloned()
        .collect()
}

/// Records within a radius of a point, using whatever coordinates each
/// record carries. Records without coordinates are excluded.
pub fn filter_by_radius(
    records: &[TowerRecord],
    center_lat: f64,
    center_long: f64,
    radius_km: f64,
    config: &AnalysisConfig,
) -> Vec<TowerRecord> {
    records
        .iter()
        .filter(|record| {
            record.effective_coords().is_some_and(|(lat, long)| {
                geo::distance_km(config.earth_radius_km, center_lat, center_long, lat, long)
                    <= radius_km
            })
        })
        .cloned()
        .collect()
}
