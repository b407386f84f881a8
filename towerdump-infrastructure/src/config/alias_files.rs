// Column-alias overrides
// Operators ship dumps with house column names; overrides live in small
// YAML files of { column, aliases } rules layered over the defaults.

use anyhow::{Context, Result};
use tokio::fs;

use towerdump_domain::{AliasRule, AliasTable};

pub fn parse_alias_rules(content: &str) -> Result<Vec<AliasRule>> {
    let rules: Vec<AliasRule> = serde_yaml::from_str(content)?;
    Ok(rules)
}

pub async fn load_alias_rules(path: &str) -> Result<Vec<AliasRule>> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("reading alias overrides from {path}"))?;
    parse_alias_rules(&content)
}

/// Alias table for dump files, with overrides applied when a path is set.
pub async fn dump_alias_table(override_path: Option<&str>) -> Result<AliasTable> {
    let table = AliasTable::dump_defaults();
    match override_path {
        Some(path) => Ok(table.with_rules(load_alias_rules(path).await?)),
        None => Ok(table),
    }
}

/// Alias table for the tower reference, with overrides applied when a
/// path is set.
pub async fn tower_alias_table(override_path: Option<&str>) -> Result<AliasTable> {
    let table = AliasTable::tower_defaults();
    match override_path {
        Some(path) => Ok(table.with_rules(load_alias_rules(path).await?)),
        None => Ok(table),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_yaml_rule_list() {
        let content = r#"
- column: mobile_number
  aliases: ["abonnent", "msisdn_local"]
- column: tower_id
  aliases: ["site_code"]
"#;
        let rules = parse_alias_rules(content).expect("parse");
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].column, "mobile_number");
        assert_eq!(rules[1].aliases, vec!["site_code".to_string()]);
    }

    #[test]
    fn overrides_take_precedence_over_defaults() {
        let rules = parse_alias_rules("- column: mobile_number\n  aliases: [\"abonnent\"]\n")
            .expect("parse");
        let table = AliasTable::dump_defaults().with_rules(rules);
        let mapping = table.resolve(&["Abonnent".to_string(), "Cell_ID".to_string()]);
        assert_eq!(
            mapping.get("mobile_number"),
            Some(&"Abonnent".to_string())
        );
        assert_eq!(mapping.get("tower_id"), Some(&"Cell_ID".to_string()));
    }

    #[test]
    fn rejects_malformed_yaml() {
        assert!(parse_alias_rules("column: not-a-list").is_err());
    }
}
