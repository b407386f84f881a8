// Analysis configuration
// Every tunable threshold lives here and is passed into the registry and
// detector at construction; there are no ambient mutable defaults.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Earth radius used by the haversine distance, in kilometers.
    pub earth_radius_km: f64,
    /// Coverage radius assumed for towers without one in the reference data.
    pub default_coverage_radius_km: f64,
    /// Seconds between consecutive tower changes considered rapid.
    pub rapid_switch_seconds: i64,
    /// Maximum plausible travel speed between towers, km/h.
    pub max_speed_kmh: f64,
    /// Distinct IMEI count per subscriber that flags device swapping.
    pub imei_change_threshold: usize,
    /// Activity span, in days, under which a busy subscriber looks
    /// freshly activated.
    pub reactivation_window_days: i64,
    /// Record count a subscriber must exceed within that span to be flagged.
    pub reactivation_record_threshold: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            earth_radius_km: 6371.0,
            default_coverage_radius_km: 1.0,
            rapid_switch_seconds: 60,
            max_speed_kmh: 200.0,
            imei_change_threshold: 3,
            reactivation_window_days: 7,
            reactivation_record_threshold: 10,
        }
    }
}
