// File-backed table sources
// CSV and JSON dump files parsed into the generic table shape. Scalars
// are kept as typed values where the text is unambiguous so that the
// load pipeline sees numbers as numbers.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use tokio::fs;
use tracing::debug;

use towerdump_domain::{Table, TableSource};

pub struct CsvFileSource {
    path: PathBuf,
    label: String,
}

impl CsvFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let label = file_label(&path);
        Self { path, label }
    }
}

#[async_trait]
impl TableSource for CsvFileSource {
    async fn fetch(&self) -> Result<Table> {
        let content = fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("reading {}", self.path.display()))?;
        let table = parse_csv(&content)?;
        debug!(label = %self.label, rows = table.len(), "loaded csv source");
        Ok(table)
    }

    fn label(&self) -> &str {
        &self.label
    }
}

pub struct JsonFileSource {
    path: PathBuf,
    label: String,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let label = file_label(&path);
        Self { path, label }
    }
}

#[async_trait]
impl TableSource for JsonFileSource {
    async fn fetch(&self) -> Result<Table> {
        let content = fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("reading {}", self.path.display()))?;
        let table = parse_json(&content)?;
        debug!(label = %self.label, rows = table.len(), "loaded json source");
        Ok(table)
    }

    fn label(&self) -> &str {
        &self.label
    }
}

/// Pick a source implementation from the file extension.
pub fn open_source(path: impl Into<PathBuf>) -> Result<Box<dyn TableSource>> {
    let path = path.into();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    match extension.as_str() {
        "csv" => Ok(Box::new(CsvFileSource::new(path))),
        "json" => Ok(Box::new(JsonFileSource::new(path))),
        other => Err(anyhow!(
            "unsupported dump format '{}' for {}",
            other,
            path.display()
        )),
    }
}

pub fn parse_csv(content: &str) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());
    let columns: Vec<String> = reader
        .headers()
        .context("reading csv header")?
        .iter()
        .map(str::to_string)
        .collect();
    let mut table = Table::new(columns);
    for record in reader.records() {
        let record = record.context("reading csv row")?;
        let mut row = HashMap::new();
        for (column, field) in table.columns.iter().zip(record.iter()) {
            row.insert(column.clone(), coerce_scalar(field));
        }
        table.push_row(row);
    }
    Ok(table)
}

/// Parse a JSON array of objects. The header is the union of keys across
/// all rows, each appended when first encountered.
pub fn parse_json(content: &str) -> Result<Table> {
    let rows: Vec<serde_json::Map<String, Value>> =
        serde_json::from_str(content).context("parsing json rows")?;
    let mut columns: Vec<String> = Vec::new();
    for row in &rows {
        for key in row.keys() {
            if !columns.iter().any(|column| column == key) {
                columns.push(key.clone());
            }
        }
    }
    let mut table = Table::new(columns);
    for row in rows {
        table.push_row(row.into_iter().collect());
    }
    Ok(table)
}

/// Map raw CSV text to a typed value. Blank fields become null so the
/// cleaning pass treats them the same as missing JSON cells.
fn coerce_scalar(field: &str) -> Value {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if let Ok(int) = trimmed.parse::<i64>() {
        return Value::from(int);
    }
    if let Ok(float) = trimmed.parse::<f64>() {
        if let Some(number) = serde_json::Number::from_f64(float) {
            return Value::Number(number);
        }
    }
    Value::String(trimmed.to_string())
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("dump")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_rows_carry_typed_cells() {
        let content = "msisdn,tower_id,lat\n9876543210,TWR-1,28.6139\n9876543211,TWR-2,\n";
        let table = parse_csv(content).expect("parse");
        assert_eq!(table.columns, vec!["msisdn", "tower_id", "lat"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(0, "msisdn"), Some(&Value::from(9876543210i64)));
        assert_eq!(table.cell(0, "lat"), Some(&Value::from(28.6139)));
        assert_eq!(table.cell(1, "lat"), Some(&Value::Null));
    }

    #[test]
    fn csv_short_rows_leave_missing_cells_out() {
        let content = "a,b,c\n1,2\n";
        let table = parse_csv(content).expect("parse");
        assert_eq!(table.cell(0, "b"), Some(&Value::from(2)));
        assert_eq!(table.cell(0, "c"), None);
    }

    #[test]
    fn json_columns_follow_first_seen_order() {
        let content = r#"[
            {"msisdn": "9876543210", "tower_id": "TWR-1"},
            {"tower_id": "TWR-2", "signal": -71}
        ]"#;
        let table = parse_json(content).expect("parse");
        assert_eq!(table.columns, vec!["msisdn", "tower_id", "signal"]);
        assert_eq!(table.cell(1, "signal"), Some(&Value::from(-71)));
    }

    #[test]
    fn json_must_be_an_array_of_objects() {
        assert!(parse_json(r#"{"msisdn": "9876543210"}"#).is_err());
    }

    #[test]
    fn source_is_picked_by_extension() {
        assert!(open_source("dump.csv").is_ok());
        assert!(open_source("dump.JSON").is_ok());
        assert!(open_source("dump.xlsx").is_err());
    }
}
