// Timestamp resolver
// Reconciles combined or split date/time columns into one canonical instant

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::entities::Table;
use crate::services::schema::{COL_DATE, COL_TIME, COL_TIMESTAMP};
use crate::utils::{value_as_f64, value_to_string};

/// Ordered list of provider datetime formats tried before falling back to
/// general inference.
const KNOWN_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%d-%m-%Y %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%d-%m-%Y %I:%M:%S %p",
    "%d/%m/%Y %I:%M:%S %p",
];

/// Broader formats for the inference fallback, tried in order after the
/// known provider formats fail.
const FALLBACK_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%d-%m-%Y %H:%M",
    "%d/%m/%Y %H:%M",
    "%Y-%m-%d",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y", "%Y/%m/%d"];

/// Day zero of spreadsheet serial dates.
fn serial_epoch() -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(1899, 12, 30)
}

/// Which input shape the resolver found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimestampShape {
    Combined,
    SplitDateTime,
    #[default]
    Missing,
}

#[derive(Debug, Clone)]
pub struct TimestampOutcome {
    pub shape: TimestampShape,
    /// Rows dropped because no parse path produced an instant.
    pub dropped: usize,
}

/// Resolve one canonical instant per row, drop rows that cannot be
/// resolved, and stable-sort the survivors by ascending instant.
///
/// Returns the per-row instants aligned with the (reordered) table rows.
/// When neither a combined timestamp nor a date+time pair exists the
/// table is left untouched and the outcome reports `Missing`; fabricating
/// timestamps is never an option.
pub fn resolve_timestamps(table: &mut Table) -> (Vec<NaiveDateTime>, TimestampOutcome) {
    let shape = if table.has_column(COL_TIMESTAMP) {
        TimestampShape::Combined
    } else if table.has_column(COL_DATE) && table.has_column(COL_TIME) {
        TimestampShape::SplitDateTime
    } else {
        return (
            Vec::new(),
            TimestampOutcome {
                shape: TimestampShape::Missing,
                dropped: 0,
            },
        );
    };

    let total = table.rows.len();
    let rows = std::mem::take(&mut table.rows);
    let mut resolved: Vec<(NaiveDateTime, std::collections::HashMap<String, serde_json::Value>)> =
        Vec::with_capacity(rows.len());
    for row in rows {
        let instant = match shape {
            TimestampShape::Combined => row
                .get(COL_TIMESTAMP)
                .and_then(value_to_string)
                .as_deref()
                .and_then(parse_combined),
            TimestampShape::SplitDateTime => {
                let date = row.get(COL_DATE).and_then(resolve_date);
                let time = row.get(COL_TIME).and_then(value_to_string);
                match (date, time) {
                    (Some(date), Some(time)) => parse_date_time(date, &time),
                    _ => None,
                }
            }
            TimestampShape::Missing => unreachable!(),
        };
        if let Some(instant) = instant {
            resolved.push((instant, row));
        }
    }
    let dropped = total - resolved.len();

    // Stable sort keeps the original relative order of equal instants.
    resolved.sort_by_key(|(instant, _)| *instant);

    let mut instants = Vec::with_capacity(resolved.len());
    for (instant, row) in resolved {
        instants.push(instant);
        table.rows.push(row);
    }
    (instants, TimestampOutcome { shape, dropped })
}

/// Combined-column path: known provider formats first, general inference
/// as the fallback.
pub fn parse_combined(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    for format in KNOWN_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(parsed);
        }
    }
    infer_datetime(trimmed)
}

fn infer_datetime(raw: &str) -> Option<NaiveDateTime> {
    for format in FALLBACK_FORMATS {
        if *format == "%Y-%m-%d" {
            if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
                return date.and_hms_opt(0, 0, 0);
            }
            continue;
        }
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(parsed);
        }
    }
    chrono::DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.naive_utc())
}

/// Date-column path: numeric cells are spreadsheet serial dates (days
/// since 1899-12-30, fractions ignored for the date part), anything else
/// is parsed as a calendar date string.
fn resolve_date(value: &serde_json::Value) -> Option<NaiveDate> {
    if let Some(serial) = value_as_f64(value) {
        let days = serial.floor();
        if !(0.0..=200_000.0).contains(&days) {
            return None;
        }
        return serial_epoch()?.checked_add_signed(Duration::days(days as i64));
    }
    let raw = value_to_string(value)?;
    let trimmed = raw.trim();
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(date);
        }
    }
    // Date cells sometimes arrive with a time part attached.
    parse_combined(trimmed).map(|dt| dt.date())
}

fn parse_date_time(date: NaiveDate, time: &str) -> Option<NaiveDateTime> {
    let combined = format!("{} {}", date.format("%Y-%m-%d"), time.trim());
    NaiveDateTime::parse_from_str(&combined, "%Y-%m-%d %H:%M:%S").ok()
}
