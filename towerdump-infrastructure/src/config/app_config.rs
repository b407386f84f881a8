use std::env;
use std::path::Path;

use anyhow::{anyhow, Result};
use serde::Deserialize;
use tokio::fs;
use tracing::warn;

use towerdump_domain::AnalysisConfig;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    /// Dump files to load, in the order they should be merged.
    pub dump_paths: Vec<String>,
    /// Tower reference table used to enrich records, if any.
    pub tower_reference_path: Option<String>,
    /// YAML files with column-alias overrides for dump and tower tables.
    pub dump_alias_path: Option<String>,
    pub tower_alias_path: Option<String>,
    pub analysis: AnalysisConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            dump_paths: Vec::new(),
            tower_reference_path: None,
            dump_alias_path: None,
            tower_alias_path: None,
            analysis: AnalysisConfig::default(),
        }
    }
}

impl AppConfig {
    pub async fn load() -> Result<Self> {
        let path = env::var("TOWERDUMP_CONFIG").unwrap_or_else(|_| "./config.toml".to_string());
        let file_path = Path::new(&path);
        let base_dir = file_path.parent();
        if !file_path.exists() {
            warn!("config.toml not found, using defaults");
            let mut config = AppConfig::default();
            config.apply_env_overrides();
            config.resolve_paths(base_dir);
            config.normalize();
            config.validate()?;
            return Ok(config);
        }
        let content = fs::read_to_string(file_path).await?;
        let mut config: AppConfig = toml::from_str(&content)?;
        config.apply_env_overrides();
        config.resolve_paths(base_dir);
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    pub fn normalize(&mut self) {
        if let Some(path) = &self.tower_reference_path {
            if path.trim().is_empty() {
                self.tower_reference_path = None;
            }
        }
        if let Some(path) = &self.dump_alias_path {
            if path.trim().is_empty() {
                self.dump_alias_path = None;
            }
        }
        if let Some(path) = &self.tower_alias_path {
            if path.trim().is_empty() {
                self.tower_alias_path = None;
            }
        }
        self.dump_paths.retain(|path| !path.trim().is_empty());
    }

    fn resolve_paths(&mut self, base_dir: Option<&Path>) {
        let Some(base) = base_dir else {
            return;
        };
        self.dump_paths = self
            .dump_paths
            .iter()
            .map(|path| resolve_path(base, path))
            .collect();
        if let Some(path) = &self.tower_reference_path {
            self.tower_reference_path = Some(resolve_path(base, path));
        }
        if let Some(path) = &self.dump_alias_path {
            self.dump_alias_path = Some(resolve_path(base, path));
        }
        if let Some(path) = &self.tower_alias_path {
            self.tower_alias_path = Some(resolve_path(base, path));
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.analysis.earth_radius_km <= 0.0 {
            return Err(anyhow!("earth_radius_km must be greater than 0"));
        }
        if self.analysis.default_coverage_radius_km <= 0.0 {
            return Err(anyhow!("default_coverage_radius_km must be greater than 0"));
        }
        if self.analysis.rapid_switch_seconds <= 0 {
            return Err(anyhow!("rapid_switch_seconds must be greater than 0"));
        }
        if self.analysis.max_speed_kmh <= 0.0 {
            return Err(anyhow!("max_speed_kmh must be greater than 0"));
        }
        if self.analysis.imei_change_threshold < 2 {
            return Err(anyhow!("imei_change_threshold must be at least 2"));
        }
        if self.analysis.reactivation_window_days <= 0 {
            return Err(anyhow!("reactivation_window_days must be greater than 0"));
        }
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(value) = env::var("TOWERDUMP_DUMP_PATHS") {
            self.dump_paths = parse_env_path_list(&value);
        }
        if let Ok(value) = env::var("TOWERDUMP_TOWER_REFERENCE_PATH") {
            self.tower_reference_path = Some(value);
        }
        if let Ok(value) = env::var("TOWERDUMP_DUMP_ALIAS_PATH") {
            self.dump_alias_path = Some(value);
        }
        if let Ok(value) = env::var("TOWERDUMP_TOWER_ALIAS_PATH") {
            self.tower_alias_path = Some(value);
        }
        if let Ok(value) = env::var("TOWERDUMP_EARTH_RADIUS_KM") {
            self.analysis.earth_radius_km = value.parse().unwrap_or(self.analysis.earth_radius_km);
        }
        if let Ok(value) = env::var("TOWERDUMP_DEFAULT_COVERAGE_RADIUS_KM") {
            self.analysis.default_coverage_radius_km = value
                .parse()
                .unwrap_or(self.analysis.default_coverage_radius_km);
        }
        if let Ok(value) = env::var("TOWERDUMP_RAPID_SWITCH_SECONDS") {
            self.analysis.rapid_switch_seconds =
                value.parse().unwrap_or(self.analysis.rapid_switch_seconds);
        }
        if let Ok(value) = env::var("TOWERDUMP_MAX_SPEED_KMH") {
            self.analysis.max_speed_kmh = value.parse().unwrap_or(self.analysis.max_speed_kmh);
        }
        if let Ok(value) = env::var("TOWERDUMP_IMEI_CHANGE_THRESHOLD") {
            self.analysis.imei_change_threshold =
                value.parse().unwrap_or(self.analysis.imei_change_threshold);
        }
        if let Ok(value) = env::var("TOWERDUMP_REACTIVATION_WINDOW_DAYS") {
            self.analysis.reactivation_window_days = value
                .parse()
                .unwrap_or(self.analysis.reactivation_window_days);
        }
        if let Ok(value) = env::var("TOWERDUMP_REACTIVATION_RECORD_THRESHOLD") {
            self.analysis.reactivation_record_threshold = value
                .parse()
                .unwrap_or(self.analysis.reactivation_record_threshold);
        }
    }
}

fn resolve_path(base: &Path, value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return trimmed.to_string();
    }
    let path = Path::new(trimmed);
    if path.is_absolute() {
        trimmed.to_string()
    } else {
        base.join(path).to_string_lossy().to_string()
    }
}

fn parse_env_path_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(ToString::to_string)
        .collect()
}
