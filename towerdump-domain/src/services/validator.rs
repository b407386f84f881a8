// Validation checks
// Structure, data quality, duplicate/ordering checks and summary
// statistics over the canonical record set

use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::entities::{SummaryStatistics, TowerRecord, ValidationIssue};
use crate::services::schema::{
    COL_IMEI, COL_IMSI, COL_LAT, COL_LONG, COL_MOBILE_NUMBER, COL_TIMESTAMP, COL_TOWER_ID,
};
use crate::utils::is_digits;
use crate::value_objects::IssueSeverity;

/// Canonical columns required for a structurally valid dump.
pub const REQUIRED_COLUMNS: &[&str] = &[COL_MOBILE_NUMBER, COL_TOWER_ID, COL_TIMESTAMP];

/// Which canonical columns were present in the original input. The load
/// pipeline knows this exactly; for standalone re-validation it can be
/// reconstructed from the records themselves.
#[derive(Debug, Clone, Default)]
pub struct ColumnPresence {
    columns: BTreeSet<String>,
}

impl ColumnPresence {
    pub fn new(columns: impl IntoIterator<Item = String>) -> Self {
        Self {
            columns: columns.into_iter().collect(),
        }
    }

    /// Derive presence from typed records: required columns are present
    /// whenever any record exists, optional ones when any record carries
    /// a value.
    pub fn from_records(records: &[TowerRecord]) -> Self {
        let mut columns = BTreeSet::new();
        if !records.is_empty() {
            for column in REQUIRED_COLUMNS {
                columns.insert(column.to_string());
            }
        }
        if records.iter().any(|r| r.imei.is_some()) {
            columns.insert(COL_IMEI.to_string());
        }
        if records.iter().any(|r| r.imsi.is_some()) {
            columns.insert(COL_IMSI.to_string());
        }
        if records.iter().any(|r| r.lat.is_some()) {
            columns.insert(COL_LAT.to_string());
        }
        if records.iter().any(|r| r.long.is_some()) {
            columns.insert(COL_LONG.to_string());
        }
        Self { columns }
    }

    pub fn contains(&self, column: &str) -> bool {
        self.columns.contains(column)
    }
}

/// Required columns present and non-empty input. These are the only
/// checks that produce error-severity issues.
pub fn structure_issues(records: &[TowerRecord], presence: &ColumnPresence) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    for column in REQUIRED_COLUMNS {
        if !presence.contains(column) {
            issues.push(
                ValidationIssue::new(
                    "missing_column",
                    IssueSeverity::Error,
                    format!("Required column '{column}' is missing"),
                )
                .with_column(column),
            );
        }
    }
    if records.is_empty() {
        issues.push(ValidationIssue::new(
            "empty_data",
            IssueSeverity::Error,
            "Record set is empty",
        ));
    }
    issues
}

/// Per-field quality warnings: null rates on optional identity fields,
/// digit-pattern conformance, coordinate ranges. A clean record set
/// produces no issues here, so re-validation is stable.
pub fn quality_issues(records: &[TowerRecord]) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let total = records.len();
    if total == 0 {
        return issues;
    }

    let bad_numbers = records
        .iter()
        .filter(|r| !is_digits(&r.mobile_number, 10))
        .count();
    push_pattern_issue(&mut issues, COL_MOBILE_NUMBER, "10-digit mobile number", bad_numbers, total);

    let bad_imeis = records
        .iter()
        .filter(|r| r.imei.as_deref().is_some_and(|v| !is_digits(v, 15)))
        .count();
    push_pattern_issue(&mut issues, COL_IMEI, "15-digit IMEI", bad_imeis, total);

    let bad_imsis = records
        .iter()
        .filter(|r| r.imsi.as_deref().is_some_and(|v| !is_digits(v, 15)))
        .count();
    push_pattern_issue(&mut issues, COL_IMSI, "15-digit IMSI", bad_imsis, total);

    let lat_out = records
        .iter()
        .filter(|r| r.lat.is_some_and(|v| !(-90.0..=90.0).contains(&v)))
        .count();
    if lat_out > 0 {
        issues.push(
            ValidationIssue::new(
                "out_of_range",
                IssueSeverity::Warning,
                format!("{lat_out} latitude values outside [-90, 90]"),
            )
            .with_column(COL_LAT)
            .with_count(lat_out),
        );
    }
    let long_out = records
        .iter()
        .filter(|r| r.long.is_some_and(|v| !(-180.0..=180.0).contains(&v)))
        .count();
    if long_out > 0 {
        issues.push(
            ValidationIssue::new(
                "out_of_range",
                IssueSeverity::Warning,
                format!("{long_out} longitude values outside [-180, 180]"),
            )
            .with_column(COL_LONG)
            .with_count(long_out),
        );
    }
    issues
}

fn push_pattern_issue(
    issues: &mut Vec<ValidationIssue>,
    column: &str,
    description: &str,
    count: usize,
    total: usize,
) {
    if count == 0 {
        return;
    }
    let percentage = (count as f64 / total as f64 * 10000.0).round() / 100.0;
    issues.push(
        ValidationIssue::new(
            "invalid_pattern",
            IssueSeverity::Warning,
            format!("{count} values don't match pattern: {description}"),
        )
        .with_column(column)
        .with_count(count)
        .with_percentage(percentage),
    );
}

/// Duplicate rows on (subscriber, tower, timestamp) and non-monotonic
/// ordering. Duplicates warn; ordering is informational only and never
/// reduces the valid-record count.
pub fn pattern_issues(records: &[TowerRecord]) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    let mut counts: BTreeMap<(&str, &str, chrono::NaiveDateTime), usize> = BTreeMap::new();
    for record in records {
        *counts
            .entry((
                record.mobile_number.as_str(),
                record.tower_id.as_str(),
                record.timestamp,
            ))
            .or_default() += 1;
    }
    let duplicate_count: usize = counts.values().filter(|&&c| c > 1).sum();
    if duplicate_count > 0 {
        issues.push(
            ValidationIssue::new(
                "duplicate_records",
                IssueSeverity::Warning,
                format!("{duplicate_count} duplicate records found"),
            )
            .with_count(duplicate_count),
        );
    }

    let monotonic = records.windows(2).all(|w| w[0].timestamp <= w[1].timestamp);
    if !monotonic {
        issues.push(ValidationIssue::new(
            "timestamp_order",
            IssueSeverity::Info,
            "Timestamps are not in chronological order",
        ));
    }
    issues
}

/// Distinct-entity counts, averages and the overall time span.
pub fn statistics(records: &[TowerRecord]) -> SummaryStatistics {
    let total = records.len();
    let mut stats = SummaryStatistics::default();
    if total == 0 {
        return stats;
    }

    let numbers: HashSet<&str> = records.iter().map(|r| r.mobile_number.as_str()).collect();
    let towers: HashSet<&str> = records.iter().map(|r| r.tower_id.as_str()).collect();
    stats.unique_numbers = numbers.len();
    stats.unique_towers = towers.len();
    stats.avg_records_per_number = total as f64 / numbers.len() as f64;

    if records.iter().any(|r| r.imei.is_some()) {
        let imeis: HashSet<&str> = records.iter().filter_map(|r| r.imei.as_deref()).collect();
        stats.unique_imeis = Some(imeis.len());
        let mut per_number: BTreeMap<&str, HashSet<&str>> = BTreeMap::new();
        for record in records {
            if let Some(imei) = record.imei.as_deref() {
                per_number
                    .entry(record.mobile_number.as_str())
                    .or_default()
                    .insert(imei);
            }
        }
        stats.numbers_with_multiple_imeis =
            Some(per_number.values().filter(|set| set.len() > 1).count());
    }

    let first = records.iter().map(|r| r.timestamp).min();
    let last = records.iter().map(|r| r.timestamp).max();
    if let (Some(first), Some(last)) = (first, last) {
        stats.time_span_hours = (last - first).num_seconds() as f64 / 3600.0;
    }

    let odd = records.iter().filter(|r| r.is_odd_hour()).count();
    let weekend = records.iter().filter(|r| r.is_weekend()).count();
    stats.odd_hour_percentage = odd as f64 / total as f64 * 100.0;
    stats.weekend_percentage = weekend as f64 / total as f64 * 100.0;

    if records.iter().any(|r| r.duration.is_some()) {
        let mut bins: BTreeMap<String, usize> = BTreeMap::new();
        for kind in records.iter().filter_map(|r| r.connection_type()) {
            *bins.entry(kind.as_str().to_string()).or_default() += 1;
        }
        stats.connection_types = Some(bins);
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn record(number: &str, tower: &str, at: &str) -> TowerRecord {
        let timestamp =
            NaiveDateTime::parse_from_str(at, "%Y-%m-%d %H:%M:%S").expect("timestamp");
        TowerRecord::new(number.to_string(), tower.to_string(), timestamp)
    }

    #[test]
    fn empty_input_is_a_structural_error() {
        let issues = structure_issues(&[], &ColumnPresence::default());
        assert!(issues.iter().any(|i| i.kind == "empty_data"));
        assert!(issues
            .iter()
            .all(|i| i.severity == IssueSeverity::Error));
        // All three required columns reported missing.
        assert_eq!(issues.len(), 4);
    }

    #[test]
    fn clean_records_produce_no_quality_issues() {
        let records = vec![
            record("9876543210", "A", "2023-03-15 09:00:00"),
            record("9876543211", "B", "2023-03-15 10:00:00"),
        ];
        assert!(quality_issues(&records).is_empty());
        // Stable under repeated validation.
        assert!(quality_issues(&records).is_empty());
    }

    #[test]
    fn malformed_fields_warn_without_error() {
        let mut bad = record("98765", "A", "2023-03-15 09:00:00");
        bad.imei = Some("123".to_string());
        bad.lat = Some(95.0);
        let issues = quality_issues(&[bad]);
        assert_eq!(issues.len(), 3);
        assert!(issues.iter().all(|i| i.severity == IssueSeverity::Warning));
        let pattern = issues.iter().find(|i| i.column.as_deref() == Some("mobile_number"));
        assert_eq!(pattern.and_then(|i| i.percentage), Some(100.0));
    }

    #[test]
    fn duplicates_warn_and_disorder_is_informational() {
        let records = vec![
            record("9876543210", "A", "2023-03-15 09:00:00"),
            record("9876543210", "A", "2023-03-15 09:00:00"),
            record("9876543211", "B", "2023-03-15 08:00:00"),
        ];
        let issues = pattern_issues(&records);
        let dup = issues.iter().find(|i| i.kind == "duplicate_records").expect("dup issue");
        assert_eq!(dup.severity, IssueSeverity::Warning);
        assert_eq!(dup.count, Some(2));
        let order = issues.iter().find(|i| i.kind == "timestamp_order").expect("order issue");
        assert_eq!(order.severity, IssueSeverity::Info);
    }

    #[test]
    fn statistics_cover_counts_span_and_time_flags() {
        let mut a = record("9876543210", "A", "2023-03-15 02:00:00");
        a.imei = Some("111111111111111".to_string());
        let mut b = record("9876543210", "B", "2023-03-15 14:00:00");
        b.imei = Some("222222222222222".to_string());
        let c = record("9876543211", "A", "2023-03-18 14:00:00");
        let stats = statistics(&[a, b, c]);
        assert_eq!(stats.unique_numbers, 2);
        assert!(stats.connection_types.is_none());
        assert_eq!(stats.unique_towers, 2);
        assert_eq!(stats.unique_imeis, Some(2));
        assert_eq!(stats.numbers_with_multiple_imeis, Some(1));
        assert!((stats.avg_records_per_number - 1.5).abs() < 1e-9);
        assert!((stats.time_span_hours - 84.0).abs() < 1e-9);
        assert!((stats.odd_hour_percentage - 100.0 / 3.0).abs() < 1e-6);
        // 2023-03-18 is a Saturday.
        assert!((stats.weekend_percentage - 100.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn duration_bins_appear_only_when_durations_exist() {
        let mut a = record("9876543210", "A", "2023-03-15 09:00:00");
        a.duration = Some(5.0);
        let mut b = record("9876543210", "B", "2023-03-15 10:00:00");
        b.duration = Some(120.0);
        let stats = statistics(&[a, b]);
        let bins = stats.connection_types.expect("bins");
        assert_eq!(bins.get("brief"), Some(&1));
        assert_eq!(bins.get("normal"), Some(&1));
    }
}
