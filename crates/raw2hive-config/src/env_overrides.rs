use crate::{parse_table_manifest, JobConfig, LogFormat, S3Config};
use anyhow::{anyhow, Context, Result};

pub const ENV_PREFIX: &str = "RAW2HIVE_";

/// Abstraction over environment-variable lookups so tests can supply their
/// own source of overrides without touching process state.
pub trait EnvSource {
    fn get(&self, key: &str) -> Option<String>;

    /// Get an environment variable WITHOUT the RAW2HIVE_ prefix.
    /// Used for the job parameters, which keep their scheduler-facing names
    /// (SOURCE_BUCKET, INGESTED_TABLES, ...).
    fn get_raw(&self, key: &str) -> Option<String>;
}

/// Apply environment-variable overrides (highest priority) to the config.
pub fn apply_env_overrides<E: EnvSource>(config: &mut JobConfig, env: &E) -> Result<()> {
    // Job parameters keep their bare names
    if let Some(bucket) = env.get_raw("SOURCE_BUCKET") {
        config.source_bucket = bucket;
    }
    if let Some(folder) = env.get_raw("SOURCE_FOLDER") {
        config.source_folder = folder;
    }
    if let Some(bucket) = env.get_raw("DESTINATION_BUCKET") {
        config.destination_bucket = bucket;
    }
    if let Some(folder) = env.get_raw("DESTINATION_FOLDER") {
        config.destination_folder = folder;
    }
    if let Some(date) = env.get_raw("INGESTION_DATE") {
        config.ingestion_date = date;
    }
    if let Some(date) = env.get_raw("CURRENT_DATE") {
        config.current_date = Some(date);
    }
    if let Some(manifest) = env.get_raw("INGESTED_TABLES") {
        config.ingested_tables =
            parse_table_manifest(&manifest).context("Invalid INGESTED_TABLES value")?;
    }

    // Ambient settings use the RAW2HIVE_ prefix
    if let Some(level) = env.get("LOG_LEVEL") {
        config.run.log_level = level;
    }
    if let Some(format) = env.get("LOG_FORMAT") {
        config.run.log_format = match format.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Text,
        };
    }
    if let Some(width) = get_env_usize(env, "COPY_CONCURRENCY")? {
        config.run.copy_concurrency = width;
    }
    if let Some(backend) = env.get("STORE_BACKEND") {
        config.store.backend = backend
            .parse()
            .context("Invalid RAW2HIVE_STORE_BACKEND value")?;
    }
    if let Some(region) = env.get("S3_REGION") {
        ensure_s3(config).region = Some(region);
    }
    if let Some(endpoint) = env.get("S3_ENDPOINT") {
        ensure_s3(config).endpoint = Some(endpoint);
    }

    Ok(())
}

fn ensure_s3(config: &mut JobConfig) -> &mut S3Config {
    config.store.s3.get_or_insert_with(S3Config::default)
}

fn get_env_usize<E: EnvSource>(env: &E, key: &str) -> Result<Option<usize>> {
    match env.get(key) {
        Some(val) => {
            let parsed = val
                .parse::<usize>()
                .map_err(|e| anyhow!("Failed to parse {}{}: {}", ENV_PREFIX, key, e))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StoreBackend;
    use std::collections::HashMap;

    struct FakeEnv(HashMap<String, String>);

    impl FakeEnv {
        fn new(vars: &[(&str, &str)]) -> Self {
            Self(
                vars.iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            )
        }
    }

    impl EnvSource for FakeEnv {
        fn get(&self, key: &str) -> Option<String> {
            self.0.get(&format!("{ENV_PREFIX}{key}")).cloned()
        }

        fn get_raw(&self, key: &str) -> Option<String> {
            self.0.get(key).cloned()
        }
    }

    #[test]
    fn test_job_parameters_use_bare_names() {
        let env = FakeEnv::new(&[
            ("SOURCE_BUCKET", "src-bucket"),
            ("SOURCE_FOLDER", "raw"),
            ("DESTINATION_BUCKET", "dst-bucket"),
            ("DESTINATION_FOLDER", "out"),
            ("INGESTION_DATE", "2024-03-07"),
            ("CURRENT_DATE", "2024-03-08"),
            (
                "INGESTED_TABLES",
                r#"[{"SchemaName": "sales", "TableName": "orders"}]"#,
            ),
        ]);

        let mut config = JobConfig::default();
        apply_env_overrides(&mut config, &env).expect("Failed to apply overrides");

        assert_eq!(config.source_bucket, "src-bucket");
        assert_eq!(config.source_folder, "raw");
        assert_eq!(config.destination_bucket, "dst-bucket");
        assert_eq!(config.destination_folder, "out");
        assert_eq!(config.ingestion_date, "2024-03-07");
        assert_eq!(config.current_date.as_deref(), Some("2024-03-08"));
        assert_eq!(config.ingested_tables.len(), 1);
    }

    #[test]
    fn test_ambient_settings_use_prefix() {
        let env = FakeEnv::new(&[
            ("RAW2HIVE_LOG_LEVEL", "debug"),
            ("RAW2HIVE_LOG_FORMAT", "json"),
            ("RAW2HIVE_COPY_CONCURRENCY", "16"),
            ("RAW2HIVE_STORE_BACKEND", "memory"),
            ("RAW2HIVE_S3_REGION", "eu-west-1"),
            ("RAW2HIVE_S3_ENDPOINT", "http://localhost:9000"),
        ]);

        let mut config = JobConfig::default();
        apply_env_overrides(&mut config, &env).expect("Failed to apply overrides");

        assert_eq!(config.run.log_level, "debug");
        assert_eq!(config.run.log_format, LogFormat::Json);
        assert_eq!(config.run.copy_concurrency, 16);
        assert_eq!(config.store.backend, StoreBackend::Memory);
        let s3 = config.store.s3.expect("Expected s3 section");
        assert_eq!(s3.region.as_deref(), Some("eu-west-1"));
        assert_eq!(s3.endpoint.as_deref(), Some("http://localhost:9000"));
    }

    #[test]
    fn test_unprefixed_ambient_names_are_ignored() {
        let env = FakeEnv::new(&[("LOG_LEVEL", "trace"), ("COPY_CONCURRENCY", "99")]);
        let mut config = JobConfig::default();
        apply_env_overrides(&mut config, &env).expect("Failed to apply overrides");
        assert_eq!(config.run.log_level, "info");
        assert_eq!(config.run.copy_concurrency, 4);
    }

    #[test]
    fn test_invalid_manifest_is_fatal() {
        let env = FakeEnv::new(&[("INGESTED_TABLES", "{not valid")]);
        let mut config = JobConfig::default();
        assert!(apply_env_overrides(&mut config, &env).is_err());
    }

    #[test]
    fn test_invalid_concurrency_is_fatal() {
        let env = FakeEnv::new(&[("RAW2HIVE_COPY_CONCURRENCY", "many")]);
        let mut config = JobConfig::default();
        assert!(apply_env_overrides(&mut config, &env).is_err());
    }

    #[test]
    fn test_invalid_backend_is_fatal() {
        let env = FakeEnv::new(&[("RAW2HIVE_STORE_BACKEND", "gcs")]);
        let mut config = JobConfig::default();
        assert!(apply_env_overrides(&mut config, &env).is_err());
    }
}
