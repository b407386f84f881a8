// Connection type value object
// Duration bins carried over from the investigation tooling

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionType {
    Brief,
    Short,
    Normal,
    Long,
}

impl ConnectionType {
    /// Bins: (0, 10] brief, (10, 60] short, (60, 300] normal, above long.
    pub fn from_duration_seconds(duration: f64) -> Self {
        if duration <= 10.0 {
            ConnectionType::Brief
        } else if duration <= 60.0 {
            ConnectionType::Short
        } else if duration <= 300.0 {
            ConnectionType::Normal
        } else {
            ConnectionType::Long
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionType::Brief => "brief",
            ConnectionType::Short => "short",
            ConnectionType::Normal => "normal",
            ConnectionType::Long => "long",
        }
    }
}
