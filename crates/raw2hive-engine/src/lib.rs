// raw2hive-engine - Run orchestration
//
// Walks the ingested-table manifest in input order, resolves per-table
// prefixes, lists the source side, and copies every object into its
// date-partitioned destination. Individual faults never abort a run;
// they are collected and reported at the end.

mod engine;

pub use engine::{RepartitionPlan, Repartitioner, RunReport, TransferFailure, DEFAULT_COPY_CONCURRENCY};
