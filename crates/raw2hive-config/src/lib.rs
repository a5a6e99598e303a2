// raw2hive-config - Job configuration for repartition runs
//
// Supports configuration from multiple sources:
// 1. Environment variables (highest priority): the seven job parameters
//    under their bare names (SOURCE_BUCKET, INGESTED_TABLES, ...),
//    ambient settings under the RAW2HIVE_ prefix
// 2. Config file path from RAW2HIVE_CONFIG env var
// 3. Config file contents from RAW2HIVE_CONFIG_CONTENT env var
// 4. Default config file locations (./raw2hive.toml, ./.raw2hive.toml)
// 5. Built-in defaults (lowest priority)

use anyhow::{Context, Result};
use raw2hive_core::TableDescriptor;
use serde::{Deserialize, Serialize};
use std::path::Path;

mod env_overrides;
mod sources;
mod validation;

pub use env_overrides::{apply_env_overrides, EnvSource, ENV_PREFIX};

/// Full configuration for one repartition job run.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct JobConfig {
    pub source_bucket: String,
    pub source_folder: String,
    pub destination_bucket: String,
    pub destination_folder: String,

    /// Ingestion date, `YYYY-MM-DD`. Parsed (and rejected) at startup,
    /// before any transfer begins.
    pub ingestion_date: String,

    /// Wall-clock date the job was scheduled with. Logged, not consumed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_date: Option<String>,

    /// Manifest of (schema, table) entries to repartition.
    pub ingested_tables: Vec<TableDescriptor>,

    pub store: StoreConfig,
    pub run: RunConfig,
}

/// Object-store backend selection.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub s3: Option<S3Config>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    S3,
    Memory,
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreBackend::S3 => write!(f, "s3"),
            StoreBackend::Memory => write!(f, "memory"),
        }
    }
}

impl std::str::FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "s3" | "aws" => Ok(StoreBackend::S3),
            "memory" | "mem" => Ok(StoreBackend::Memory),
            _ => anyhow::bail!("Unsupported store backend: {}. Supported: s3, memory", s),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct S3Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

/// Runtime knobs: logging and copy fan-out.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub log_level: String,
    pub log_format: LogFormat,
    pub copy_concurrency: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            copy_concurrency: 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

/// Parse the JSON ingested-tables manifest into descriptors.
pub fn parse_table_manifest(json: &str) -> Result<Vec<TableDescriptor>> {
    serde_json::from_str(json).context("Failed to parse ingested-tables manifest as a JSON array")
}

impl JobConfig {
    /// Load configuration from all sources with priority.
    pub fn load_or_default() -> Result<Self> {
        sources::load_or_default()
    }

    /// Load configuration from a specific file path (for the --config flag),
    /// then apply environment overrides on top.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        sources::load_from_path(path.as_ref())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_backend_from_str() {
        assert_eq!("s3".parse::<StoreBackend>().unwrap(), StoreBackend::S3);
        assert_eq!("aws".parse::<StoreBackend>().unwrap(), StoreBackend::S3);
        assert_eq!(
            "memory".parse::<StoreBackend>().unwrap(),
            StoreBackend::Memory
        );
        assert_eq!("MEM".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert!("gcs".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn test_default_config() {
        let config = JobConfig::default();
        assert_eq!(config.store.backend, StoreBackend::S3);
        assert_eq!(config.run.log_level, "info");
        assert_eq!(config.run.log_format, LogFormat::Text);
        assert_eq!(config.run.copy_concurrency, 4);
        assert!(config.ingested_tables.is_empty());
    }

    #[test]
    fn test_parse_table_manifest() {
        let descriptors = parse_table_manifest(
            r#"[{"SchemaName": "sales", "TableName": "orders"}, {"TableName": "orphan"}]"#,
        )
        .expect("Failed to parse manifest");
        assert_eq!(descriptors.len(), 2);
        assert!(descriptors[0].resolve().is_ok());
        assert!(descriptors[1].resolve().is_err());
    }

    #[test]
    fn test_parse_table_manifest_rejects_non_array() {
        assert!(parse_table_manifest(r#"{"SchemaName": "sales"}"#).is_err());
        assert!(parse_table_manifest("not json").is_err());
    }
}
