// Configuration validation
//
// Required job parameters must be present; ambient values get sanity checks.

use crate::JobConfig;
use anyhow::{bail, Result};
use tracing::warn;

pub fn validate_config(config: &JobConfig) -> Result<()> {
    if config.source_bucket.is_empty() {
        bail!("source_bucket is required (SOURCE_BUCKET)");
    }
    if config.source_folder.is_empty() {
        bail!("source_folder is required (SOURCE_FOLDER)");
    }
    if config.destination_bucket.is_empty() {
        bail!("destination_bucket is required (DESTINATION_BUCKET)");
    }
    if config.destination_folder.is_empty() {
        bail!("destination_folder is required (DESTINATION_FOLDER)");
    }
    if config.ingestion_date.is_empty() {
        bail!("ingestion_date is required (INGESTION_DATE)");
    }

    if config.run.copy_concurrency == 0 {
        bail!("run.copy_concurrency must be greater than 0");
    }
    if config.run.copy_concurrency > 256 {
        warn!(
            copy_concurrency = config.run.copy_concurrency,
            "run.copy_concurrency is very large; the store will throttle copies"
        );
    }

    if config.ingested_tables.is_empty() {
        warn!("ingested-tables manifest is empty; nothing to repartition");
    }

    Ok(())
}
