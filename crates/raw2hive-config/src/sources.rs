// Configuration source loading.
//
// Priority order:
// 1. Environment variables
// 2. Config file path from RAW2HIVE_CONFIG
// 3. Inline config content from RAW2HIVE_CONFIG_CONTENT
// 4. Default config files (./raw2hive.toml, ./.raw2hive.toml)
// 5. Built-in defaults

use crate::env_overrides::{self, EnvSource, ENV_PREFIX};
use crate::JobConfig;
use anyhow::{Context, Result};
use std::env;
use std::path::Path;

/// Load configuration with graceful fallback to defaults: tries the
/// standard file locations, then applies environment overrides.
pub fn load_or_default() -> Result<JobConfig> {
    let mut config = load_from_file()?.unwrap_or_default();
    env_overrides::apply_env_overrides(&mut config, &StdEnvSource)?;
    Ok(config)
}

/// Load configuration from a specific file path (for the --config flag).
/// Returns an error if the file doesn't exist or can't be parsed. The
/// environment still wins over file contents.
pub fn load_from_path(path: &Path) -> Result<JobConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let mut config = parse_config(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    env_overrides::apply_env_overrides(&mut config, &StdEnvSource)?;
    Ok(config)
}

pub(crate) fn parse_config(content: &str) -> Result<JobConfig> {
    Ok(toml::from_str(content)?)
}

fn load_from_file() -> Result<Option<JobConfig>> {
    if let Ok(path) = env::var(format!("{ENV_PREFIX}CONFIG")) {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path))?;
        let config = parse_config(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))?;
        return Ok(Some(config));
    }

    if let Ok(content) = env::var(format!("{ENV_PREFIX}CONFIG_CONTENT")) {
        let config = parse_config(&content)
            .context("Failed to parse inline config from RAW2HIVE_CONFIG_CONTENT")?;
        return Ok(Some(config));
    }

    for path in &["./raw2hive.toml", "./.raw2hive.toml"] {
        if Path::new(path).exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path))?;
            let config = parse_config(&content)
                .with_context(|| format!("Failed to parse config file: {}", path))?;
            return Ok(Some(config));
        }
    }

    Ok(None)
}

struct StdEnvSource;

impl EnvSource for StdEnvSource {
    fn get(&self, key: &str) -> Option<String> {
        env::var(format!("{}{}", ENV_PREFIX, key)).ok()
    }

    fn get_raw(&self, key: &str) -> Option<String> {
        env::var(key).ok()
    }
}
