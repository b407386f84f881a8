// Validation report entity

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entities::AnomalyEvent;
use crate::value_objects::IssueSeverity;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    pub severity: IssueSeverity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(kind: &str, severity: IssueSeverity, message: impl Into<String>) -> Self {
        Self {
            kind: kind.to_string(),
            column: None,
            severity,
            count: None,
            percentage: None,
            message: message.into(),
        }
    }

    pub fn with_column(mut self, column: &str) -> Self {
        self.column = Some(column.to_string());
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    pub fn with_percentage(mut self, percentage: f64) -> Self {
        self.percentage = Some(percentage);
        self
    }
}

/// Aggregate counts over a validated record set. Fields stay optional
/// when the backing column never appeared in the input.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SummaryStatistics {
    pub unique_numbers: usize,
    pub unique_towers: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_imeis: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numbers_with_multiple_imeis: Option<usize>,
    pub avg_records_per_number: f64,
    pub time_span_hours: f64,
    pub odd_hour_percentage: f64,
    pub weekend_percentage: f64,
    /// Duration-bin counts, absent when no record carries a duration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_types: Option<BTreeMap<String, usize>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    pub total_records: usize,
    pub valid_records: usize,
    pub issues: Vec<ValidationIssue>,
    pub anomalies: Vec<AnomalyEvent>,
    pub statistics: SummaryStatistics,
}

impl ValidationReport {
    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.severity == IssueSeverity::Error)
            .count()
    }
}
