mod file_config;

pub use file_config::FileConfig;

use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub db_path: PathBuf,
    pub port: u16,
    pub metrics_port: u16,
    pub files_service_url: Option<String>,
    pub scan_interval_minutes: u64,
    pub requests_logging: RequestsLoggingLevel,
}

impl Default for CliConfig {
    fn default() -> Self {
        CliConfig {
            db_path: PathBuf::from("./catalog.db"),
            port: 3666,
            metrics_port: 9667,
            files_service_url: None,
            scan_interval_minutes: 0,
            requests_logging: RequestsLoggingLevel::Path,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub port: u16,
    /// A value of 0 disables the metrics endpoint.
    pub metrics_port: u16,
    pub files_service_url: String,
    /// A value of 0 disables periodic scans.
    pub scan_interval_minutes: u64,
    pub requests_logging: RequestsLoggingLevel,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        // TOML overrides CLI for each field
        let db_path = file
            .db_path
            .map(PathBuf::from)
            .unwrap_or_else(|| cli.db_path.clone());
        if db_path.as_os_str().is_empty() {
            bail!("db_path must not be empty");
        }

        let port = file.port.unwrap_or(cli.port);
        if port == 0 {
            bail!("port must be non-zero");
        }
        let metrics_port = file.metrics_port.unwrap_or(cli.metrics_port);

        let files_service_url = file
            .files_service_url
            .or_else(|| cli.files_service_url.clone())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "files_service_url must be specified via --files-service-url or in config file"
                )
            })?;
        if files_service_url.trim().is_empty() {
            bail!("files_service_url must not be empty");
        }

        let scan_interval_minutes = file
            .scan_interval_minutes
            .unwrap_or(cli.scan_interval_minutes);

        let requests_logging = file
            .requests_logging
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.requests_logging.clone());

        Ok(Self {
            db_path,
            port,
            metrics_port,
            files_service_url,
            scan_interval_minutes,
            requests_logging,
        })
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
