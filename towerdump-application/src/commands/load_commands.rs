// Dump loading pipeline
// Raw table -> schema normalization -> cleaning -> timestamp resolution
// -> canonical, time-sorted records

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDateTime;
use tracing::{info, warn};

use towerdump_domain::{
    clean_table, normalize_columns, resolve_timestamps, AliasTable, CleaningStats, ColumnPresence,
    IssueSeverity, Table, TableSource, TimestampShape, TowerRecord, ValidationIssue, COL_DURATION,
    COL_IMEI, COL_IMSI, COL_LAT, COL_LONG, COL_MOBILE_NUMBER, COL_SIGNAL_STRENGTH, COL_TIMESTAMP,
    COL_TOWER_ID,
};
use towerdump_domain::utils::{value_as_f64, value_to_string};

use crate::error::AppError;

/// Everything the load pipeline produced: the canonical record set plus
/// the bookkeeping the validation reporter needs. Nothing is silently
/// discarded; every dropped row and nulled field shows up in `issues`.
#[derive(Debug, Clone, Default)]
pub struct LoadOutcome {
    pub records: Vec<TowerRecord>,
    /// Canonical field -> source column, as resolved by the normalizer.
    pub matched_columns: BTreeMap<String, String>,
    pub issues: Vec<ValidationIssue>,
    pub cleaning: CleaningStats,
    pub timestamp_shape: TimestampShape,
    pub dropped_timestamps: usize,
}

impl LoadOutcome {
    /// Column presence for the structural check: the matched canonical
    /// columns, with a resolvable date+time pair counting as a timestamp.
    pub fn presence(&self) -> ColumnPresence {
        let mut columns: Vec<String> = self.matched_columns.keys().cloned().collect();
        if self.timestamp_shape != TimestampShape::Missing
            && !columns.iter().any(|c| c == COL_TIMESTAMP)
        {
            columns.push(COL_TIMESTAMP.to_string());
        }
        ColumnPresence::new(columns)
    }
}

/// Load one dump source through the full pipeline.
///
/// An unreadable source is fatal; everything that goes wrong at row level
/// is recovered, counted and reported.
pub async fn load_dump(
    source: &dyn TableSource,
    aliases: &AliasTable,
) -> Result<LoadOutcome, AppError> {
    let table = source
        .fetch()
        .await
        .map_err(|err| AppError::UnreadableSource(format!("{}: {err}", source.label())))?;
    info!(source = source.label(), rows = table.len(), "loading tower dump");
    let mut outcome = run_pipeline(table, aliases, source.label());
    info!(
        source = source.label(),
        records = outcome.records.len(),
        dropped = outcome.cleaning.dropped() + outcome.dropped_timestamps,
        "processed tower dump"
    );
    for record in &mut outcome.records {
        record.source_file = Some(source.label().to_string());
    }
    Ok(outcome)
}

/// Load and combine several dump sources.
///
/// Mirrors the investigator workflow: a file that cannot be read is
/// skipped with a warning issue so one bad export does not sink the whole
/// batch, but if every source fails the load as a whole fails. Exact
/// duplicates on (timestamp, subscriber, tower) keep their first
/// occurrence, and the combined set is re-sorted by ascending instant.
pub async fn load_dumps(
    sources: &[Box<dyn TableSource>],
    aliases: &AliasTable,
) -> Result<LoadOutcome, AppError> {
    let mut combined = LoadOutcome::default();
    let mut loaded = 0usize;
    for source in sources {
        match load_dump(source.as_ref(), aliases).await {
            Ok(outcome) => {
                loaded += 1;
                combined.records.extend(outcome.records);
                combined.issues.extend(outcome.issues);
                for (canonical, source_column) in outcome.matched_columns {
                    combined.matched_columns.entry(canonical).or_insert(source_column);
                }
                combined.cleaning.dropped_missing_required +=
                    outcome.cleaning.dropped_missing_required;
                combined.cleaning.dropped_invalid_number +=
                    outcome.cleaning.dropped_invalid_number;
                combined.cleaning.nulled_imei += outcome.cleaning.nulled_imei;
                combined.cleaning.nulled_imsi += outcome.cleaning.nulled_imsi;
                combined.cleaning.nulled_lat += outcome.cleaning.nulled_lat;
                combined.cleaning.nulled_long += outcome.cleaning.nulled_long;
                if outcome.timestamp_shape != TimestampShape::Missing {
                    combined.timestamp_shape = outcome.timestamp_shape;
                }
                combined.dropped_timestamps += outcome.dropped_timestamps;
            }
            Err(err) => {
                warn!(source = source.label(), error = %err, "skipping unreadable dump");
                combined.issues.push(ValidationIssue::new(
                    "unreadable_source",
                    IssueSeverity::Warning,
                    format!("Skipped source '{}': {err}", source.label()),
                ));
            }
        }
    }
    if loaded == 0 && !sources.is_empty() {
        return Err(AppError::UnreadableSource(
            "every dump source failed to load".to_string(),
        ));
    }

    let before = combined.records.len();
    dedup_records(&mut combined.records);
    let removed = before - combined.records.len();
    if removed > 0 {
        info!(removed, "removed exact duplicate records while combining dumps");
    }
    combined
        .records
        .sort_by_key(|record| record.timestamp);
    Ok(combined)
}

fn run_pipeline(mut table: Table, aliases: &AliasTable, label: &str) -> LoadOutcome {
    let matched_columns = normalize_columns(&mut table, aliases);
    let cleaning = clean_table(&mut table);
    let (instants, timestamps) = resolve_timestamps(&mut table);

    let mut issues = Vec::new();
    if timestamps.shape == TimestampShape::Missing {
        warn!(source = label, "no timestamp information found in data");
        issues.push(ValidationIssue::new(
            "no_timestamp_columns",
            IssueSeverity::Warning,
            "No timestamp, date, or time columns found in data",
        ));
    }
    push_count_issue(
        &mut issues,
        "rows_dropped_missing_required",
        cleaning.dropped_missing_required,
        "rows dropped: required subscriber or tower field missing",
    );
    push_count_issue(
        &mut issues,
        "rows_dropped_invalid_number",
        cleaning.dropped_invalid_number,
        "rows dropped: subscriber number failed the 10-digit check",
    );
    push_count_issue(
        &mut issues,
        "rows_dropped_bad_timestamp",
        timestamps.dropped,
        "rows dropped: timestamp could not be resolved",
    );
    push_count_issue(
        &mut issues,
        "imei_values_nulled",
        cleaning.nulled_imei,
        "IMEI values nulled: not 15 digits",
    );
    push_count_issue(
        &mut issues,
        "imsi_values_nulled",
        cleaning.nulled_imsi,
        "IMSI values nulled: not 15 digits",
    );
    push_count_issue(
        &mut issues,
        "coordinates_nulled",
        cleaning.nulled_lat + cleaning.nulled_long,
        "coordinate values nulled: non-numeric or out of range",
    );

    let records = build_records(&table, &instants);
    LoadOutcome {
        records,
        matched_columns,
        issues,
        cleaning,
        timestamp_shape: timestamps.shape,
        dropped_timestamps: timestamps.dropped,
    }
}

fn push_count_issue(issues: &mut Vec<ValidationIssue>, kind: &str, count: usize, message: &str) {
    if count > 0 {
        issues.push(
            ValidationIssue::new(kind, IssueSeverity::Warning, format!("{count} {message}"))
                .with_count(count),
        );
    }
}

fn build_records(table: &Table, instants: &[NaiveDateTime]) -> Vec<TowerRecord> {
    if !table.has_column(COL_MOBILE_NUMBER) || !table.has_column(COL_TOWER_ID) {
        return Vec::new();
    }
    let mut records = Vec::with_capacity(instants.len());
    for (row, instant) in table.rows.iter().zip(instants) {
        // The cleaner already dropped rows without these fields.
        let (Some(mobile_number), Some(tower_id)) = (
            row.get(COL_MOBILE_NUMBER).and_then(value_to_string),
            row.get(COL_TOWER_ID).and_then(value_to_string),
        ) else {
            continue;
        };
        let mut record = TowerRecord::new(mobile_number, tower_id, *instant);
        record.imei = row.get(COL_IMEI).and_then(value_to_string);
        record.imsi = row.get(COL_IMSI).and_then(value_to_string);
        record.lat = row.get(COL_LAT).and_then(value_as_f64);
        record.long = row.get(COL_LONG).and_then(value_as_f64);
        record.duration = row.get(COL_DURATION).and_then(value_as_f64);
        record.signal_strength = row.get(COL_SIGNAL_STRENGTH).and_then(value_as_f64);
        records.push(record);
    }
    records
}

fn dedup_records(records: &mut Vec<TowerRecord>) {
    let mut seen: HashSet<(String, String, NaiveDateTime)> = HashSet::new();
    records.retain(|record| {
        seen.insert((
            record.mobile_number.clone(),
            record.tower_id.clone(),
            record.timestamp,
        ))
    });
}
