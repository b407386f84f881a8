// Record cleaner
// Field-level syntactic validity with an explicit drop-vs-null policy:
// invalid required identity drops the row, invalid optional evidence only
// nulls the field.

use serde_json::Value;

use crate::entities::Table;
use crate::services::schema::{
    COL_IMEI, COL_IMSI, COL_LAT, COL_LONG, COL_MOBILE_NUMBER, COL_TOWER_ID,
};
use crate::utils::{is_digits, value_as_f64, value_to_string};

/// Country-code prefixes stripped from subscriber numbers before the
/// 10-digit check.
const COUNTRY_PREFIXES: &[&str] = &["+91", "91"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleaningStats {
    /// Rows dropped because a required field was missing entirely.
    pub dropped_missing_required: usize,
    /// Rows dropped because the subscriber number failed the digit check.
    pub dropped_invalid_number: usize,
    pub nulled_imei: usize,
    pub nulled_imsi: usize,
    pub nulled_lat: usize,
    pub nulled_long: usize,
}

impl CleaningStats {
    pub fn dropped(&self) -> usize {
        self.dropped_missing_required + self.dropped_invalid_number
    }
}

/// Clean a column-normalized table in place. Checks run in a fixed order:
/// missing required fields, subscriber number, IMEI, IMSI, tower id,
/// coordinates. Only checks whose column exists are applied.
pub fn clean_table(table: &mut Table) -> CleaningStats {
    let mut stats = CleaningStats::default();
    let has_number = table.has_column(COL_MOBILE_NUMBER);
    let has_imei = table.has_column(COL_IMEI);
    let has_imsi = table.has_column(COL_IMSI);
    let has_tower = table.has_column(COL_TOWER_ID);
    let has_lat = table.has_column(COL_LAT);
    let has_long = table.has_column(COL_LONG);

    let rows = std::mem::take(&mut table.rows);
    for mut row in rows {
        if has_number && row.get(COL_MOBILE_NUMBER).and_then(value_to_string).is_none() {
            stats.dropped_missing_required += 1;
            continue;
        }
        if has_tower && row.get(COL_TOWER_ID).and_then(value_to_string).is_none() {
            stats.dropped_missing_required += 1;
            continue;
        }

        if has_number {
            // value_to_string already trimmed; guarded by the drop above.
            let raw = match row.get(COL_MOBILE_NUMBER).and_then(value_to_string) {
                Some(raw) => raw,
                None => continue,
            };
            match normalize_mobile_number(&raw) {
                Some(number) => {
                    row.insert(COL_MOBILE_NUMBER.to_string(), Value::String(number));
                }
                None => {
                    stats.dropped_invalid_number += 1;
                    continue;
                }
            }
        }

        if has_imei {
            stats.nulled_imei += null_invalid_identity(&mut row, COL_IMEI);
        }
        if has_imsi {
            stats.nulled_imsi += null_invalid_identity(&mut row, COL_IMSI);
        }

        if has_tower {
            if let Some(tower) = row.get(COL_TOWER_ID).and_then(value_to_string) {
                row.insert(COL_TOWER_ID.to_string(), Value::String(tower));
            }
        }

        if has_lat {
            stats.nulled_lat += null_out_of_range(&mut row, COL_LAT, -90.0, 90.0);
        }
        if has_long {
            stats.nulled_long += null_out_of_range(&mut row, COL_LONG, -180.0, 180.0);
        }

        table.rows.push(row);
    }
    stats
}

/// Strip whitespace and a recognized country-code prefix, then require
/// exactly 10 digits.
pub fn normalize_mobile_number(raw: &str) -> Option<String> {
    let mut number = raw.trim();
    for prefix in COUNTRY_PREFIXES {
        if let Some(stripped) = number.strip_prefix(prefix) {
            number = stripped;
            break;
        }
    }
    if is_digits(number, 10) {
        Some(number.to_string())
    } else {
        None
    }
}

fn null_invalid_identity(
    row: &mut std::collections::HashMap<String, Value>,
    column: &str,
) -> usize {
    match row.get(column).and_then(value_to_string) {
        Some(value) if is_digits(&value, 15) => {
            row.insert(column.to_string(), Value::String(value));
            0
        }
        Some(_) => {
            row.insert(column.to_string(), Value::Null);
            1
        }
        None => 0,
    }
}

fn null_out_of_range(
    row: &mut std::collections::HashMap<String, Value>,
    column: &str,
    min: f64,
    max: f64,
) -> usize {
    let raw = match row.get(column) {
        Some(value) if !value.is_null() => value.clone(),
        _ => return 0,
    };
    match value_as_f64(&raw) {
        Some(value) if (min..=max).contains(&value) => 0,
        _ => {
            row.insert(column.to_string(), Value::Null);
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn table_with(columns: &[&str], rows: Vec<Vec<Value>>) -> Table {
        let mut table = Table::new(columns.iter().map(|c| c.to_string()).collect());
        for cells in rows {
            let row: HashMap<String, Value> = columns
                .iter()
                .map(|c| c.to_string())
                .zip(cells)
                .collect();
            table.push_row(row);
        }
        table
    }

    #[test]
    fn country_prefix_is_stripped_before_digit_check() {
        assert_eq!(
            normalize_mobile_number("+919876543210"),
            Some("9876543210".to_string())
        );
        assert_eq!(
            normalize_mobile_number("919876543210"),
            Some("9876543210".to_string())
        );
        assert_eq!(normalize_mobile_number("98765"), None);
        assert_eq!(normalize_mobile_number(" 9876543210 "), Some("9876543210".to_string()));
    }

    #[test]
    fn invalid_subscriber_number_drops_the_row() {
        let mut table = table_with(
            &["mobile_number", "tower_id"],
            vec![
                vec![json!("9876543210"), json!("TWR001")],
                vec![json!("98765"), json!("TWR001")],
            ],
        );
        let stats = clean_table(&mut table);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(stats.dropped_invalid_number, 1);
    }

    #[test]
    fn missing_required_fields_drop_before_other_checks() {
        let mut table = table_with(
            &["mobile_number", "tower_id", "imei"],
            vec![
                vec![json!(null), json!("TWR001"), json!("badimei")],
                vec![json!("9876543210"), json!(null), json!("badimei")],
            ],
        );
        let stats = clean_table(&mut table);
        assert!(table.rows.is_empty());
        assert_eq!(stats.dropped_missing_required, 2);
        // The invalid IMEI never got as far as being nulled.
        assert_eq!(stats.nulled_imei, 0);
    }

    #[test]
    fn invalid_imei_is_nulled_not_dropped() {
        let mut table = table_with(
            &["mobile_number", "tower_id", "imei", "imsi"],
            vec![vec![
                json!("9876543210"),
                json!("TWR001"),
                json!("12345"),
                json!("123456789012345"),
            ]],
        );
        let stats = clean_table(&mut table);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(stats.nulled_imei, 1);
        assert_eq!(stats.nulled_imsi, 0);
        assert_eq!(table.rows[0]["imei"], Value::Null);
        assert_eq!(table.rows[0]["imsi"], json!("123456789012345"));
    }

    #[test]
    fn out_of_range_coordinates_are_nulled_independently() {
        let mut table = table_with(
            &["mobile_number", "tower_id", "lat", "long"],
            vec![vec![
                json!("9876543210"),
                json!("TWR001"),
                json!(95.0),
                json!(77.2),
            ]],
        );
        let stats = clean_table(&mut table);
        assert_eq!(stats.nulled_lat, 1);
        assert_eq!(stats.nulled_long, 0);
        assert_eq!(table.rows[0]["lat"], Value::Null);
        assert_eq!(table.rows[0]["long"], json!(77.2));
    }

    #[test]
    fn non_numeric_coordinates_are_nulled() {
        let mut table = table_with(
            &["mobile_number", "tower_id", "lat"],
            vec![vec![json!("9876543210"), json!("TWR001"), json!("north")]],
        );
        let stats = clean_table(&mut table);
        assert_eq!(stats.nulled_lat, 1);
    }

    #[test]
    fn numeric_identifier_cells_survive_typed_parsers() {
        // A 15-digit IMEI parsed as a number still round-trips to digits.
        let mut table = table_with(
            &["mobile_number", "tower_id", "imei"],
            vec![vec![
                json!("9876543210"),
                json!("TWR001"),
                json!(123456789012345i64),
            ]],
        );
        let stats = clean_table(&mut table);
        assert_eq!(stats.nulled_imei, 0);
        assert_eq!(table.rows[0]["imei"], json!("123456789012345"));
    }
}
