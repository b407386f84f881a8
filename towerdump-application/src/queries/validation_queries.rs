// Validation run
// Fixed check order: structure, quality, duplicates/ordering, anomaly
// detection, statistics

use rayon::prelude::*;
use tracing::info;

use towerdump_domain::{
    pattern_issues, quality_issues, statistics, structure_issues, AnalysisConfig, AnomalyDetector,
    AnomalyEvent, ColumnPresence, IssueSeverity, TowerRecord, ValidationIssue, ValidationReport,
};

use crate::commands::LoadOutcome;

/// Validate a load outcome: the canonical records plus everything the
/// pipeline already counted.
pub fn validate_outcome(outcome: &LoadOutcome, config: &AnalysisConfig) -> ValidationReport {
    validate_records(
        &outcome.records,
        &outcome.presence(),
        &outcome.issues,
        config,
    )
}

/// Re-validate a record set on its own, deriving column presence from the
/// records. An already-clean set yields no new row-level warnings.
pub fn revalidate(records: &[TowerRecord], config: &AnalysisConfig) -> ValidationReport {
    validate_records(records, &ColumnPresence::from_records(records), &[], config)
}

pub fn validate_records(
    records: &[TowerRecord],
    presence: &ColumnPresence,
    load_issues: &[ValidationIssue],
    config: &AnalysisConfig,
) -> ValidationReport {
    info!(records = records.len(), "validating tower dump");

    let mut issues: Vec<ValidationIssue> = load_issues.to_vec();
    issues.extend(structure_issues(records, presence));
    issues.extend(quality_issues(records));
    issues.extend(pattern_issues(records));

    let anomalies = detect_parallel(records, config);
    let statistics = statistics(records);

    let total_records = records.len();
    let error_count = issues
        .iter()
        .filter(|issue| issue.severity == IssueSeverity::Error)
        .count();
    let valid_records = total_records.saturating_sub(error_count);

    info!(
        valid = valid_records,
        total = total_records,
        anomalies = anomalies.len(),
        "validation complete"
    );

    ValidationReport {
        total_records,
        valid_records,
        issues,
        anomalies,
        statistics,
    }
}

/// Per-subscriber groups share no mutable state, so detection fans out
/// across worker threads. The merged list is re-sorted by subscriber id
/// so the output is deterministic regardless of completion order.
fn detect_parallel(records: &[TowerRecord], config: &AnalysisConfig) -> Vec<AnomalyEvent> {
    let detector = AnomalyDetector::new(config.clone());
    let groups: Vec<(&str, Vec<&TowerRecord>)> =
        AnomalyDetector::group_by_number(records).into_iter().collect();
    let mut anomalies: Vec<AnomalyEvent> = groups
        .par_iter()
        .flat_map_iter(|(number, group)| detector.detect_group(number, group))
        .collect();
    anomalies.sort_by(|a, b| a.mobile_number.cmp(&b.mobile_number));
    anomalies
}
