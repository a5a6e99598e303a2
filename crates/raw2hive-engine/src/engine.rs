//! The repartition engine
//!
//! Tables are processed sequentially in manifest order; copies within one
//! table fan out over a bounded pool. Three fault classes stay inside the
//! run: an invalid descriptor is skipped, a listing fault fails that table,
//! a copy fault fails that object. Anything else (a panic in the loop
//! itself) propagates and aborts the run.

use futures::stream::{self, StreamExt};
use tracing::{error, info, warn};

use raw2hive_core::{destination_key, IngestionDate, KeyLayout, TableDescriptor, TableRef};
use raw2hive_store::ObjectStore;

pub const DEFAULT_COPY_CONCURRENCY: usize = 4;

/// Everything fixed for one run: the two buckets and the two key layouts.
#[derive(Debug, Clone)]
pub struct RepartitionPlan {
    pub source_bucket: String,
    pub destination_bucket: String,
    pub source_layout: KeyLayout,
    pub destination_layout: KeyLayout,
}

impl RepartitionPlan {
    pub fn new(
        source_bucket: impl Into<String>,
        source_root: &str,
        destination_bucket: impl Into<String>,
        destination_root: &str,
        date: IngestionDate,
    ) -> Self {
        Self {
            source_bucket: source_bucket.into(),
            destination_bucket: destination_bucket.into(),
            source_layout: KeyLayout::source(source_root),
            destination_layout: KeyLayout::destination(destination_root, date),
        }
    }
}

/// One object (or, for listing faults, one prefix) that could not be
/// transferred. Recorded in order, never deduplicated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferFailure {
    pub bucket: String,
    pub key: String,
}

/// Aggregated outcome of one run.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Descriptors seen, valid or not.
    pub tables_seen: usize,
    /// Descriptors dropped by validation.
    pub tables_skipped: usize,
    pub objects_copied: usize,
    pub failures: Vec<TransferFailure>,
}

impl RunReport {
    /// A run succeeds iff nothing failed to transfer.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Drives one repartition run against an injected object store.
pub struct Repartitioner<S> {
    store: S,
    plan: RepartitionPlan,
    copy_concurrency: usize,
}

impl<S: ObjectStore> Repartitioner<S> {
    pub fn new(store: S, plan: RepartitionPlan) -> Self {
        Self {
            store,
            plan,
            copy_concurrency: DEFAULT_COPY_CONCURRENCY,
        }
    }

    /// Bound the per-table copy fan-out. A width of 1 copies strictly
    /// sequentially.
    pub fn with_copy_concurrency(mut self, width: usize) -> Self {
        self.copy_concurrency = width.max(1);
        self
    }

    /// Process every descriptor in input order and report the outcome.
    ///
    /// Per-entry, per-table, and per-object faults are absorbed into the
    /// report; the caller decides how a non-empty failure list escalates.
    pub async fn run(&self, descriptors: &[TableDescriptor]) -> RunReport {
        let mut report = RunReport::default();

        for descriptor in descriptors {
            report.tables_seen += 1;
            let table = match descriptor.resolve() {
                Ok(table) => table,
                Err(reason) => {
                    warn!(error = %reason, entry = ?descriptor, "skipping invalid table entry");
                    report.tables_skipped += 1;
                    continue;
                }
            };
            self.repartition_table(&table, &mut report).await;
        }

        if !report.failures.is_empty() {
            error!(
                failed = report.failures.len(),
                "failed to transfer the following objects"
            );
            for failure in &report.failures {
                error!("Source: {}/{}", failure.bucket, failure.key);
            }
        }
        report
    }

    async fn repartition_table(&self, table: &TableRef, report: &mut RunReport) {
        let source_prefix = self.plan.source_layout.prefix(table);
        let destination_prefix = self.plan.destination_layout.prefix(table);

        let keys = match self
            .store
            .list_objects(&self.plan.source_bucket, &source_prefix)
            .await
        {
            Ok(keys) => keys,
            Err(err) => {
                // A failed listing is not an empty table: the prefix goes on
                // the failure list so the run cannot report success.
                error!(
                    error = %err,
                    bucket = %self.plan.source_bucket,
                    prefix = %source_prefix,
                    "listing source objects failed"
                );
                report.failures.push(TransferFailure {
                    bucket: self.plan.source_bucket.clone(),
                    key: source_prefix,
                });
                return;
            }
        };

        if keys.is_empty() {
            info!(table = %table, prefix = %source_prefix, "no objects found under source prefix");
            return;
        }

        let total = keys.len();
        let copies: Vec<(String, bool)> = stream::iter(keys)
            .map(|source_key| {
                let destination = destination_key(&source_prefix, &destination_prefix, &source_key);
                async move {
                    let copied = self.copy_one(&source_key, &destination).await;
                    (source_key, copied)
                }
            })
            .buffer_unordered(self.copy_concurrency)
            .collect()
            .await;

        // Completion order is nondeterministic under concurrency; sort the
        // failed keys so the report is stable for a given input.
        let mut failed: Vec<String> = copies
            .into_iter()
            .filter_map(|(key, copied)| (!copied).then_some(key))
            .collect();
        failed.sort();

        report.objects_copied += total - failed.len();
        report.failures.extend(failed.into_iter().map(|key| TransferFailure {
            bucket: self.plan.source_bucket.clone(),
            key,
        }));
    }

    async fn copy_one(&self, source_key: &str, destination_key: &str) -> bool {
        match self
            .store
            .copy_object(
                &self.plan.source_bucket,
                source_key,
                &self.plan.destination_bucket,
                destination_key,
            )
            .await
        {
            Ok(()) => {
                info!(
                    source_bucket = %self.plan.source_bucket,
                    source_key,
                    destination_bucket = %self.plan.destination_bucket,
                    destination_key,
                    "copied object"
                );
                true
            }
            Err(err) => {
                warn!(
                    error = %err,
                    source_bucket = %self.plan.source_bucket,
                    source_key,
                    destination_bucket = %self.plan.destination_bucket,
                    destination_key,
                    "failed to copy object"
                );
                false
            }
        }
    }
}
