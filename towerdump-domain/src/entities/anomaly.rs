// Anomaly entity
// One detected behavioral deviation for a subscriber

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::value_objects::Severity;

/// Kind-specific payload for a detected anomaly. Serialized with a `type`
/// tag so downstream reporting consumers get a stable shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnomalyKind {
    RapidTowerSwitching {
        switch_count: usize,
    },
    ImpossibleTravel {
        speed_kmh: f64,
        distance_km: f64,
        time_hours: f64,
        from_tower: String,
        to_tower: String,
        timestamp: NaiveDateTime,
    },
    MultipleImei {
        imei_count: usize,
        imeis: Vec<String>,
    },
    OneTimeVisitor {
        tower_id: String,
    },
    NewSimHighActivity {
        first_seen: NaiveDateTime,
        activity_days: i64,
        record_count: usize,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyEvent {
    pub kind: AnomalyKind,
    pub mobile_number: String,
    pub severity: Severity,
    pub details: String,
}
