// Generic tabular input
// Ordered rows of named cells, as handed over by the file-parsing boundary

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One parsed tabular input: an ordered header plus rows of named cells.
/// Cell values keep the parser's typing (string, number or null); all
/// coercion happens in the load pipeline, never here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<HashMap<String, Value>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|column| column == name)
    }

    pub fn push_row(&mut self, row: HashMap<String, Value>) {
        self.rows.push(row);
    }

    /// Apply a source-column -> canonical-name mapping in place. Columns
    /// not covered by the mapping keep their original names.
    pub fn rename_columns(&mut self, mapping: &HashMap<String, String>) {
        if mapping.is_empty() {
            return;
        }
        for column in &mut self.columns {
            if let Some(canonical) = mapping.get(column) {
                *column = canonical.clone();
            }
        }
        for row in &mut self.rows {
            for (source, canonical) in mapping {
                if let Some(value) = row.remove(source) {
                    row.insert(canonical.clone(), value);
                }
            }
        }
    }

    pub fn cell<'a>(&'a self, row: usize, column: &str) -> Option<&'a Value> {
        self.rows.get(row).and_then(|r| r.get(column))
    }
}
