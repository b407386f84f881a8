// Schema normalizer
// Maps provider-specific column headers onto the canonical field set

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::entities::Table;

pub const COL_TIMESTAMP: &str = "timestamp";
pub const COL_DATE: &str = "date";
pub const COL_TIME: &str = "time";
pub const COL_MOBILE_NUMBER: &str = "mobile_number";
pub const COL_IMEI: &str = "imei";
pub const COL_IMSI: &str = "imsi";
pub const COL_TOWER_ID: &str = "tower_id";
pub const COL_LAT: &str = "lat";
pub const COL_LONG: &str = "long";
pub const COL_DURATION: &str = "duration";
pub const COL_SIGNAL_STRENGTH: &str = "signal_strength";
pub const COL_ADDRESS: &str = "address";
pub const COL_AREA: &str = "area";
pub const COL_CITY: &str = "city";
pub const COL_STATE: &str = "state";
pub const COL_COVERAGE_RADIUS: &str = "coverage_radius";

/// Alias list for one canonical column, overridable from configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AliasRule {
    pub column: String,
    pub aliases: Vec<String>,
}

/// Ordered canonical-column -> accepted-alias table. Order matters twice:
/// canonical fields claim source columns in declaration order, and within
/// one field the first alias found wins.
#[derive(Debug, Clone)]
pub struct AliasTable {
    entries: Vec<(String, Vec<String>)>,
}

impl AliasTable {
    /// Alias table for tower dump files across known providers.
    pub fn dump_defaults() -> Self {
        Self {
            entries: vec![
                entry(COL_TIMESTAMP, &["timestamp", "datetime", "date_time", "call_time", "connection_time"]),
                entry(COL_DATE, &["date", "call_date", "connection_date"]),
                entry(COL_TIME, &["time", "call_time", "connection_time"]),
                entry(COL_MOBILE_NUMBER, &["mobile_number", "msisdn", "phone_number", "a_party", "subscriber", "a party"]),
                entry(COL_IMEI, &["imei", "device_id", "equipment_id", "imei a", "imei_a"]),
                entry(COL_IMSI, &["imsi", "sim_id", "subscriber_id", "imsi a", "imsi_a"]),
                entry(COL_TOWER_ID, &["tower_id", "cell_id", "bts_id", "site_id", "tower", "first cell id a", "last cell id a"]),
                entry(COL_LAT, &["lat", "latitude", "tower_lat", "site_lat"]),
                entry(COL_LONG, &["long", "longitude", "lon", "tower_long", "site_long"]),
                entry(COL_DURATION, &["duration", "connection_duration", "session_time"]),
                entry(COL_SIGNAL_STRENGTH, &["signal_strength", "rssi", "signal_level"]),
            ],
        }
    }

    /// Alias table for tower reference (location) files.
    pub fn tower_defaults() -> Self {
        Self {
            entries: vec![
                entry(COL_TOWER_ID, &["tower_id", "cell_id", "site_id", "bts_id"]),
                entry(COL_LAT, &["lat", "latitude", "tower_lat"]),
                entry(COL_LONG, &["long", "longitude", "lon", "tower_long"]),
                entry(COL_ADDRESS, &["address", "location", "site_address"]),
                entry(COL_AREA, &["area", "locality", "region"]),
                entry(COL_CITY, &["city", "district"]),
                entry(COL_STATE, &["state", "province"]),
                entry(COL_COVERAGE_RADIUS, &["coverage_radius", "radius", "range"]),
            ],
        }
    }

    /// Apply configured alias rules. A rule for a known canonical column
    /// replaces its alias list; rules for new columns are appended after
    /// the built-in entries.
    pub fn with_rules(mut self, rules: Vec<AliasRule>) -> Self {
        for rule in rules {
            match self.entries.iter_mut().find(|(name, _)| *name == rule.column) {
                Some((_, aliases)) => *aliases = rule.aliases,
                None => self.entries.push((rule.column, rule.aliases)),
            }
        }
        self
    }

    /// Resolve the mapping from canonical field to source column.
    ///
    /// Matching is case-insensitive and exact. When two source columns
    /// lower-case to the same alias, the first one in header order wins.
    /// A source column is claimed at most once; later canonical fields
    /// skip it and fall through to their next alias. Canonical fields
    /// with no matching source column are simply absent from the result.
    pub fn resolve(&self, columns: &[String]) -> BTreeMap<String, String> {
        let mut by_lower: HashMap<String, &String> = HashMap::new();
        for column in columns {
            by_lower.entry(column.to_lowercase()).or_insert(column);
        }

        let mut mapping = BTreeMap::new();
        let mut claimed: HashSet<&String> = HashSet::new();
        for (canonical, aliases) in &self.entries {
            for alias in aliases {
                if let Some(&source) = by_lower.get(&alias.to_lowercase()) {
                    if claimed.contains(source) {
                        continue;
                    }
                    claimed.insert(source);
                    mapping.insert(canonical.clone(), source.clone());
                    break;
                }
            }
        }
        mapping
    }
}

fn entry(canonical: &str, aliases: &[&str]) -> (String, Vec<String>) {
    (
        canonical.to_string(),
        aliases.iter().map(|a| a.to_string()).collect(),
    )
}

/// Resolve and apply the alias table against a table in place. Returns the
/// canonical-field -> source-column mapping that was applied.
pub fn normalize_columns(table: &mut Table, aliases: &AliasTable) -> BTreeMap<String, String> {
    let mapping = aliases.resolve(&table.columns);
    let rename: HashMap<String, String> = mapping
        .iter()
        .filter(|(canonical, source)| canonical != source)
        .map(|(canonical, source)| (source.clone(), canonical.clone()))
        .collect();
    table.rename_columns(&rename);
    mapping
}
