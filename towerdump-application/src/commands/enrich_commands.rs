// Registry construction and record enrichment

use tracing::info;

use towerdump_domain::{AliasTable, AnalysisConfig, TableSource, TowerRecord, TowerRegistry};

use crate::error::AppError;

/// Build the tower registry from a reference source. A missing or
/// unreadable reference dataset is fatal when enrichment was requested;
/// there is no meaningful fallback.
pub async fn build_registry(
    source: &dyn TableSource,
    aliases: &AliasTable,
    config: &AnalysisConfig,
) -> Result<TowerRegistry, AppError> {
    let table = source
        .fetch()
        .await
        .map_err(|err| AppError::TowerReference(format!("{}: {err}", source.label())))?;
    let registry = TowerRegistry::from_table(table, aliases, config);
    info!(
        source = source.label(),
        towers = registry.len(),
        "loaded tower locations"
    );
    Ok(registry)
}

/// Attach tower locations to the record set in place. Unknown towers
/// leave the enrichment fields null.
pub fn enrich_records(registry: &TowerRegistry, records: &mut [TowerRecord]) -> usize {
    let enriched = registry.enrich(records);
    info!(
        enriched,
        total = records.len(),
        "enriched records with tower location data"
    );
    enriched
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use towerdump_domain::Table;

    struct MissingReference;

    #[async_trait]
    impl TableSource for MissingReference {
        async fn fetch(&self) -> anyhow::Result<Table> {
            Err(anyhow::anyhow!("tower reference file not found"))
        }

        fn label(&self) -> &str {
            "towers.json"
        }
    }

    struct Reference(Table);

    #[async_trait]
    impl TableSource for Reference {
        async fn fetch(&self) -> anyhow::Result<Table> {
            Ok(self.0.clone())
        }

        fn label(&self) -> &str {
            "towers.csv"
        }
    }

    #[tokio::test]
    async fn missing_reference_is_a_distinguishable_failure() {
        let err = build_registry(
            &MissingReference,
            &AliasTable::tower_defaults(),
            &AnalysisConfig::default(),
        )
        .await
        .expect_err("fatal");
        assert!(matches!(err, AppError::TowerReference(_)));
    }

    #[tokio::test]
    async fn registry_builds_from_reference_table() {
        let columns = ["cell_id", "latitude", "longitude"];
        let mut table = Table::new(columns.iter().map(|c| c.to_string()).collect());
        let row: HashMap<String, Value> = [
            ("cell_id".to_string(), json!("TWR001")),
            ("latitude".to_string(), json!(28.6139)),
            ("longitude".to_string(), json!(77.2090)),
        ]
        .into_iter()
        .collect();
        table.push_row(row);

        let registry = build_registry(
            &Reference(table),
            &AliasTable::tower_defaults(),
            &AnalysisConfig::default(),
        )
        .await
        .expect("registry");
        assert_eq!(registry.len(), 1);
        assert!(registry.location_of("TWR001").is_some());
    }
}
