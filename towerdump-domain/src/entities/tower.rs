// Tower location entity
// Static reference data for one cell tower

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TowerLocation {
    pub tower_id: String,
    pub lat: f64,
    pub long: f64,
    pub address: Option<String>,
    pub area: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub coverage_radius_km: f64,
}
