use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, info};

use raw2hive_config::{JobConfig, StoreBackend};
use raw2hive_core::IngestionDate;
use raw2hive_engine::{RepartitionPlan, Repartitioner, RunReport};
use raw2hive_store::{MemoryStore, ObjectStore, S3Store};

mod init;

/// Repartition ingested raw objects into date-partitioned object storage
#[derive(Parser)]
#[command(name = "raw2hive")]
#[command(version)]
#[command(about = "Repartition ingested raw objects into date-partitioned object storage", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Path to a JSON file with the ingested-tables manifest
    #[arg(short, long, value_name = "FILE")]
    tables: Option<PathBuf>,

    /// Ingestion date (YYYY-MM-DD), overrides config
    #[arg(short, long, value_name = "DATE")]
    ingestion_date: Option<String>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short = 'v', long, value_name = "LEVEL")]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Build tokio runtime and run the async job
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?
        .block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> Result<()> {
    // Step 1: Load base configuration (file + environment)
    let mut config = if let Some(config_path) = &cli.config {
        JobConfig::load_from_path(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?
    } else {
        JobConfig::load_or_default().context("Failed to load configuration")?
    };

    // Step 2: Apply CLI overrides (highest priority)
    apply_cli_overrides(&mut config, &cli)?;

    // Step 3: Logging first, so validation diagnostics are visible
    init::init_tracing(&config);
    config.validate()?;

    // Step 4: A malformed date aborts here, before any transfer begins
    let date = IngestionDate::parse(&config.ingestion_date)?;
    if let Some(current_date) = &config.current_date {
        debug!(current_date = %current_date, "job scheduling date");
    }

    let plan = RepartitionPlan::new(
        config.source_bucket.clone(),
        &config.source_folder,
        config.destination_bucket.clone(),
        &config.destination_folder,
        date,
    );
    info!(
        backend = %config.store.backend,
        source_bucket = %config.source_bucket,
        destination_bucket = %config.destination_bucket,
        ingestion_date = %date,
        tables = config.ingested_tables.len(),
        "starting repartition run"
    );

    // Step 5: Run against the configured backend
    let report = match config.store.backend {
        StoreBackend::S3 => {
            let s3 = config.store.s3.clone().unwrap_or_default();
            let store = S3Store::from_env(s3.region.as_deref(), s3.endpoint.as_deref()).await;
            run_repartition(store, &config, plan).await
        }
        StoreBackend::Memory => run_repartition(MemoryStore::new(), &config, plan).await,
    };

    // Step 6: Any recorded failure escalates to job failure (non-zero exit)
    if !report.is_success() {
        bail!(
            "repartition finished with {} failed transfers",
            report.failures.len()
        );
    }
    info!(
        copied = report.objects_copied,
        tables = report.tables_seen,
        skipped = report.tables_skipped,
        "successfully repartitioned raw data"
    );
    Ok(())
}

async fn run_repartition<S: ObjectStore>(
    store: S,
    config: &JobConfig,
    plan: RepartitionPlan,
) -> RunReport {
    Repartitioner::new(store, plan)
        .with_copy_concurrency(config.run.copy_concurrency)
        .run(&config.ingested_tables)
        .await
}

fn apply_cli_overrides(config: &mut JobConfig, cli: &Cli) -> Result<()> {
    // Override the manifest with a local JSON file
    if let Some(path) = &cli.tables {
        let manifest = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read tables manifest: {}", path.display()))?;
        config.ingested_tables = raw2hive_config::parse_table_manifest(&manifest)
            .with_context(|| format!("Failed to parse tables manifest: {}", path.display()))?;
    }

    if let Some(date) = &cli.ingestion_date {
        config.ingestion_date = date.clone();
    }

    if let Some(level) = &cli.log_level {
        config.run.log_level = level.clone();
    }

    Ok(())
}
