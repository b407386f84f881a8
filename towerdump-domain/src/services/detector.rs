// Anomaly detector
// Stateless per-subscriber pattern detection over time-ordered records

use std::collections::BTreeMap;

use crate::config::AnalysisConfig;
use crate::entities::{AnomalyEvent, AnomalyKind, TowerRecord};
use crate::services::geo;
use crate::value_objects::Severity;

/// Detects behavioral anomalies over records grouped by subscriber.
/// Every threshold comes from the caller-supplied configuration; nothing
/// here is tunable at runtime after construction.
#[derive(Debug, Clone)]
pub struct AnomalyDetector {
    config: AnalysisConfig,
}

impl AnomalyDetector {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// Group records by subscriber number, preserving record order within
    /// each group. Iterating the result visits subscribers in ascending
    /// order, which keeps emission order deterministic.
    pub fn group_by_number(records: &[TowerRecord]) -> BTreeMap<&str, Vec<&TowerRecord>> {
        let mut groups: BTreeMap<&str, Vec<&TowerRecord>> = BTreeMap::new();
        for record in records {
            groups
                .entry(record.mobile_number.as_str())
                .or_default()
                .push(record);
        }
        groups
    }

    /// Run every detector over all groups sequentially. Input must be
    /// sorted by ascending timestamp; grouping preserves that order.
    pub fn detect(&self, records: &[TowerRecord]) -> Vec<AnomalyEvent> {
        let mut anomalies = Vec::new();
        for (number, group) in Self::group_by_number(records) {
            anomalies.extend(self.detect_group(number, &group));
        }
        anomalies
    }

    /// Run every detector over one subscriber's records.
    ///
    /// Precondition: `group` is sorted by ascending timestamp. Detectors
    /// are independent; each one no-ops when the fields it needs are
    /// absent from the group.
    pub fn detect_group(&self, number: &str, group: &[&TowerRecord]) -> Vec<AnomalyEvent> {
        let mut anomalies = Vec::new();
        self.detect_rapid_switching(number, group, &mut anomalies);
        self.detect_impossible_travel(number, group, &mut anomalies);
        self.detect_imei_changes(number, group, &mut anomalies);
        self.detect_one_time_visitor(number, group, &mut anomalies);
        self.detect_new_sim_activity(number, group, &mut anomalies);
        anomalies
    }

    /// Consecutive tower *changes* separated by less than the configured
    /// threshold. Emits one event per subscriber carrying the count, not
    /// one per occurrence.
    fn detect_rapid_switching(
        &self,
        number: &str,
        group: &[&TowerRecord],
        anomalies: &mut Vec<AnomalyEvent>,
    ) {
        let mut change_points: Vec<&TowerRecord> = Vec::new();
        for (i, record) in group.iter().enumerate() {
            if i == 0 || record.tower_id != group[i - 1].tower_id {
                change_points.push(record);
            }
        }
        let mut switch_count = 0usize;
        for pair in change_points.windows(2) {
            let delta = (pair[1].timestamp - pair[0].timestamp).num_seconds();
            if delta < self.config.rapid_switch_seconds {
                switch_count += 1;
            }
        }
        if switch_count > 0 {
            anomalies.push(AnomalyEvent {
                kind: AnomalyKind::RapidTowerSwitching { switch_count },
                mobile_number: number.to_string(),
                severity: Severity::High,
                details: format!(
                    "Rapid tower switches detected (< {}s)",
                    self.config.rapid_switch_seconds
                ),
            });
        }
    }

    /// Implied speed between consecutive connections at different towers.
    /// One event per violating pair.
    fn detect_impossible_travel(
        &self,
        number: &str,
        group: &[&TowerRecord],
        anomalies: &mut Vec<AnomalyEvent>,
    ) {
        for pair in group.windows(2) {
            let (prev, curr) = (pair[0], pair[1]);
            if prev.tower_id == curr.tower_id {
                continue;
            }
            let (Some((lat1, lon1)), Some((lat2, lon2))) =
                (prev.effective_coords(), curr.effective_coords())
            else {
                continue;
            };
            let distance_km =
                geo::distance_km(self.config.earth_radius_km, lat1, lon1, lat2, lon2);
            let elapsed_seconds = (curr.timestamp - prev.timestamp).num_seconds() as f64;
            if elapsed_seconds <= 0.0 {
                continue;
            }
            let time_hours = elapsed_seconds / 3600.0;
            let speed_kmh = geo::speed_kmh(distance_km, elapsed_seconds);
            if speed_kmh > self.config.max_speed_kmh {
                anomalies.push(AnomalyEvent {
                    kind: AnomalyKind::ImpossibleTravel {
                        speed_kmh,
                        distance_km,
                        time_hours,
                        from_tower: prev.tower_id.clone(),
                        to_tower: curr.tower_id.clone(),
                        timestamp: curr.timestamp,
                    },
                    mobile_number: number.to_string(),
                    severity: Severity::High,
                    details: format!(
                        "Implied speed {:.1} km/h over {:.1} km exceeds {:.0} km/h",
                        speed_kmh, distance_km, self.config.max_speed_kmh
                    ),
                });
            }
        }
    }

    /// One SIM showing up in too many distinct devices.
    fn detect_imei_changes(
        &self,
        number: &str,
        group: &[&TowerRecord],
        anomalies: &mut Vec<AnomalyEvent>,
    ) {
        let mut imeis: Vec<String> = Vec::new();
        for record in group {
            if let Some(imei) = &record.imei {
                if !imeis.iter().any(|seen| seen == imei) {
                    imeis.push(imei.clone());
                }
            }
        }
        if imeis.len() >= self.config.imei_change_threshold {
            let imei_count = imeis.len();
            anomalies.push(AnomalyEvent {
                kind: AnomalyKind::MultipleImei { imei_count, imeis },
                mobile_number: number.to_string(),
                severity: Severity::High,
                details: format!("SIM used in {} different devices", imei_count),
            });
        }
    }

    /// A subscriber seen exactly once in the whole dataset.
    fn detect_one_time_visitor(
        &self,
        number: &str,
        group: &[&TowerRecord],
        anomalies: &mut Vec<AnomalyEvent>,
    ) {
        if let [only] = group {
            anomalies.push(AnomalyEvent {
                kind: AnomalyKind::OneTimeVisitor {
                    tower_id: only.tower_id.clone(),
                },
                mobile_number: number.to_string(),
                severity: Severity::Medium,
                details: "Number appeared only once in tower dump".to_string(),
            });
        }
    }

    /// High record volume packed into a short overall activity span,
    /// typical of a freshly (re)activated SIM.
    fn detect_new_sim_activity(
        &self,
        number: &str,
        group: &[&TowerRecord],
        anomalies: &mut Vec<AnomalyEvent>,
    ) {
        let (Some(first), Some(last)) = (group.first(), group.last()) else {
            return;
        };
        let activity_days = (last.timestamp - first.timestamp).num_days();
        if activity_days <= self.config.reactivation_window_days
            && group.len() > self.config.reactivation_record_threshold
        {
            anomalies.push(AnomalyEvent {
                kind: AnomalyKind::NewSimHighActivity {
                    first_seen: first.timestamp,
                    activity_days,
                    record_count: group.len(),
                },
                mobile_number: number.to_string(),
                severity: Severity::Medium,
                details: "Recently activated SIM with high activity".to_string(),
            });
        }
    }
}
