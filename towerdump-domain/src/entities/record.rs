// Tower record entity
// One observed connection event after normalization and cleaning

use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

use crate::value_objects::ConnectionType;

/// One canonical tower connection event. Built by the load pipeline and
/// immutable afterwards, except for registry enrichment which only fills
/// the `tower_*` fields and never touches the canonical ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TowerRecord {
    pub mobile_number: String,
    pub imei: Option<String>,
    pub imsi: Option<String>,
    pub tower_id: String,
    pub timestamp: NaiveDateTime,
    pub lat: Option<f64>,
    pub long: Option<f64>,
    pub duration: Option<f64>,
    pub signal_strength: Option<f64>,
    pub source_file: Option<String>,
    // Filled by TowerRegistry::enrich, null when the tower is unknown
    pub tower_lat: Option<f64>,
    pub tower_long: Option<f64>,
    pub tower_address: Option<String>,
    pub tower_area: Option<String>,
    pub tower_city: Option<String>,
    pub tower_state: Option<String>,
}

impl TowerRecord {
    pub fn new(mobile_number: String, tower_id: String, timestamp: NaiveDateTime) -> Self {
        Self {
            mobile_number,
            imei: None,
            imsi: None,
            tower_id,
            timestamp,
            lat: None,
            long: None,
            duration: None,
            signal_strength: None,
            source_file: None,
            tower_lat: None,
            tower_long: None,
            tower_address: None,
            tower_area: None,
            tower_city: None,
            tower_state: None,
        }
    }

    pub fn hour(&self) -> u32 {
        self.timestamp.hour()
    }

    /// Midnight to 5 AM connection.
    pub fn is_odd_hour(&self) -> bool {
        self.hour() <= 5
    }

    pub fn is_weekend(&self) -> bool {
        matches!(self.timestamp.weekday(), Weekday::Sat | Weekday::Sun)
    }

    pub fn connection_type(&self) -> Option<ConnectionType> {
        self.duration.map(ConnectionType::from_duration_seconds)
    }

    /// Coordinates usable for movement analysis: registry-enriched tower
    /// position when present, otherwise the coordinates carried by the
    /// dump itself.
    pub fn effective_coords(&self) -> Option<(f64, f64)> {
        match (self.tower_lat, self.tower_long) {
            (Some(lat), Some(long)) => Some((lat, long)),
            _ => match (self.lat, self.long) {
                (Some(lat), Some(long)) => Some((lat, long)),
                _ => None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record_at(ts: &str) -> TowerRecord {
        let timestamp = NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M:%S").expect("timestamp");
        TowerRecord::new("9876543210".to_string(), "TWR001".to_string(), timestamp)
    }

    #[test]
    fn odd_hour_covers_midnight_to_five() {
        assert!(record_at("2023-03-15 00:00:00").is_odd_hour());
        assert!(record_at("2023-03-15 05:59:59").is_odd_hour());
        assert!(!record_at("2023-03-15 06:00:00").is_odd_hour());
    }

    #[test]
    fn weekend_flag_follows_weekday() {
        // 2023-03-18 is a Saturday
        assert!(record_at("2023-03-18 12:00:00").is_weekend());
        assert!(!record_at("2023-03-15 12:00:00").is_weekend());
        let date = NaiveDate::from_ymd_opt(2023, 3, 19).expect("date");
        assert_eq!(date.weekday(), Weekday::Sun);
    }

    #[test]
    fn effective_coords_prefer_enriched_tower_position() {
        let mut record = record_at("2023-03-15 12:00:00");
        record.lat = Some(10.0);
        record.long = Some(20.0);
        assert_eq!(record.effective_coords(), Some((10.0, 20.0)));
        record.tower_lat = Some(11.0);
        record.tower_long = Some(21.0);
        assert_eq!(record.effective_coords(), Some((11.0, 21.0)));
    }
}
