use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Settings loaded from a TOML file. Every field present here overrides
/// the corresponding command line argument.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    pub db_path: Option<String>,
    pub port: Option<u16>,
    pub metrics_port: Option<u16>,
    pub files_service_url: Option<String>,
    pub scan_interval_minutes: Option<u64>,
    pub requests_logging: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
