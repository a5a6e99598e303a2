// End-to-end tests for raw2hive
//
// These tests drive the full path from a parsed manifest to
// date-partitioned destination keys against the in-memory store.

use std::collections::HashMap;

use raw2hive_config::{apply_env_overrides, parse_table_manifest, EnvSource, JobConfig, ENV_PREFIX};
use raw2hive_core::IngestionDate;
use raw2hive_engine::{RepartitionPlan, Repartitioner, TransferFailure};
use raw2hive_store::MemoryStore;

fn plan_for(config: &JobConfig) -> RepartitionPlan {
    let date = IngestionDate::parse(&config.ingestion_date).expect("Failed to parse date");
    RepartitionPlan::new(
        config.source_bucket.clone(),
        &config.source_folder,
        config.destination_bucket.clone(),
        &config.destination_folder,
        date,
    )
}

#[tokio::test]
async fn test_manifest_to_partitioned_layout() {
    let store = MemoryStore::new();
    store.put("src-bucket", "raw/sales/orders/part-0001.parquet", b"o1");
    store.put("src-bucket", "raw/sales/orders/part-0002.parquet", b"o2");
    store.put("src-bucket", "raw/hr/people/2024/part-0001.parquet", b"p1");

    let manifest = r#"[
        {"SchemaName": "sales", "TableName": "orders"},
        {"SchemaName": "hr", "TableName": "people"},
        {"SchemaName": "broken"}
    ]"#;
    let descriptors = parse_table_manifest(manifest).expect("Failed to parse manifest");

    let date = IngestionDate::parse("2024-03-07").expect("Failed to parse date");
    let plan = RepartitionPlan::new("src-bucket", "raw/", "dst-bucket", "out", date);
    let report = Repartitioner::new(store.clone(), plan).run(&descriptors).await;

    assert!(
        report.is_success(),
        "unexpected failures: {:?}",
        report.failures
    );
    assert_eq!(report.tables_seen, 3);
    assert_eq!(report.tables_skipped, 1);
    assert_eq!(report.objects_copied, 3);
    assert_eq!(
        store.keys("dst-bucket"),
        vec![
            "out/hr/people/year=2024/month=03/day=07/2024/part-0001.parquet",
            "out/sales/orders/year=2024/month=03/day=07/part-0001.parquet",
            "out/sales/orders/year=2024/month=03/day=07/part-0002.parquet",
        ]
    );

    // Copies preserve content and leave the source side in place.
    assert_eq!(
        store
            .get(
                "dst-bucket",
                "out/sales/orders/year=2024/month=03/day=07/part-0001.parquet"
            )
            .as_deref(),
        Some(&b"o1"[..])
    );
    assert_eq!(store.keys("src-bucket").len(), 3);
}

#[tokio::test]
async fn test_partial_failure_fails_the_run() {
    let store = MemoryStore::new();
    store.put("src-bucket", "raw/sales/orders/part-0001.parquet", b"o1");
    store.put("src-bucket", "raw/sales/orders/part-0002.parquet", b"o2");
    store.put("src-bucket", "raw/sales/orders/part-0003.parquet", b"o3");
    store.fail_copy("src-bucket", "raw/sales/orders/part-0002.parquet");

    let descriptors = parse_table_manifest(r#"[{"SchemaName": "sales", "TableName": "orders"}]"#)
        .expect("Failed to parse manifest");

    let date = IngestionDate::parse("2024-03-07").expect("Failed to parse date");
    let plan = RepartitionPlan::new("src-bucket", "raw", "dst-bucket", "out", date);
    let report = Repartitioner::new(store.clone(), plan).run(&descriptors).await;

    assert!(!report.is_success());
    assert_eq!(report.objects_copied, 2);
    assert_eq!(
        report.failures,
        vec![TransferFailure {
            bucket: "src-bucket".to_string(),
            key: "raw/sales/orders/part-0002.parquet".to_string(),
        }]
    );
    assert!(store.contains(
        "dst-bucket",
        "out/sales/orders/year=2024/month=03/day=07/part-0003.parquet"
    ));
}

struct JobEnv(HashMap<String, String>);

impl EnvSource for JobEnv {
    fn get(&self, key: &str) -> Option<String> {
        self.0.get(&format!("{ENV_PREFIX}{key}")).cloned()
    }

    fn get_raw(&self, key: &str) -> Option<String> {
        self.0.get(key).cloned()
    }
}

#[tokio::test]
async fn test_env_configured_run() {
    let vars: HashMap<String, String> = [
        ("SOURCE_BUCKET", "ingest"),
        ("SOURCE_FOLDER", "raw"),
        ("DESTINATION_BUCKET", "lake"),
        ("DESTINATION_FOLDER", "curated"),
        ("INGESTION_DATE", "2025-01-09"),
        ("CURRENT_DATE", "2025-01-10"),
        (
            "INGESTED_TABLES",
            r#"[{"SchemaName": "finance", "TableName": "invoices"}]"#,
        ),
        ("RAW2HIVE_STORE_BACKEND", "memory"),
        ("RAW2HIVE_COPY_CONCURRENCY", "2"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    let mut config = JobConfig::default();
    apply_env_overrides(&mut config, &JobEnv(vars)).expect("Failed to apply overrides");
    config.validate().expect("Expected a valid configuration");

    let store = MemoryStore::new();
    store.put("ingest", "raw/finance/invoices/part-0001.parquet", b"i1");

    let report = Repartitioner::new(store.clone(), plan_for(&config))
        .with_copy_concurrency(config.run.copy_concurrency)
        .run(&config.ingested_tables)
        .await;

    assert!(report.is_success());
    assert_eq!(
        store.keys("lake"),
        vec!["curated/finance/invoices/year=2025/month=01/day=09/part-0001.parquet"]
    );
}

#[tokio::test]
async fn test_empty_manifest_is_a_successful_noop() {
    let store = MemoryStore::new();
    let date = IngestionDate::parse("2024-03-07").expect("Failed to parse date");
    let plan = RepartitionPlan::new("src-bucket", "raw", "dst-bucket", "out", date);

    let report = Repartitioner::new(store.clone(), plan).run(&[]).await;

    assert!(report.is_success());
    assert_eq!(report.objects_copied, 0);
    assert!(store.keys("dst-bucket").is_empty());
}
