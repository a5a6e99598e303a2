//! Key layouts for date-partitioned tables
//!
//! Source keys live under a flat per-table prefix; destination keys add a
//! Hive-style partition suffix:
//! `{root}/{schema}/{table}/year={year}/month={month}/day={day}/...`

use chrono::{Datelike, NaiveDate};
use thiserror::Error;

use crate::descriptor::TableRef;

/// The ingestion date did not match `YYYY-MM-DD`.
///
/// This is a startup error: a run never begins transferring with an
/// unparseable date.
#[derive(Debug, Error)]
#[error("invalid ingestion date '{input}': expected YYYY-MM-DD ({source})")]
pub struct DateFormatError {
    input: String,
    #[source]
    source: chrono::ParseError,
}

/// Calendar date a run partitions into, parsed from `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestionDate(NaiveDate);

impl IngestionDate {
    pub fn parse(input: &str) -> Result<Self, DateFormatError> {
        NaiveDate::parse_from_str(input, "%Y-%m-%d")
            .map(Self)
            .map_err(|source| DateFormatError {
                input: input.to_string(),
                source,
            })
    }

    /// Hive-style partition suffix for this date, e.g. `year=2024/month=03/day=07`.
    ///
    /// Month and day keep the zero-padded rendering of the parsed date.
    pub fn partition_suffix(&self) -> String {
        format!(
            "year={}/month={:02}/day={:02}",
            self.0.year(),
            self.0.month(),
            self.0.day()
        )
    }
}

impl std::fmt::Display for IngestionDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// Key-prefix pattern for one side of a transfer, built once per run and
/// resolved per table.
///
/// The source layout is flat (`{root}/{schema}/{table}`); the destination
/// layout carries the partition suffix
/// (`{root}/{schema}/{table}/year=Y/month=MM/day=DD`). Neither resolved
/// prefix ends with a slash, so the remainder of a mapped key keeps its
/// leading separator.
#[derive(Debug, Clone)]
pub struct KeyLayout {
    root: String,
    partition: Option<String>,
}

impl KeyLayout {
    /// Flat source layout under `root`.
    pub fn source(root: &str) -> Self {
        Self {
            root: ensure_trailing_slash(root),
            partition: None,
        }
    }

    /// Date-partitioned destination layout under `root`.
    pub fn destination(root: &str, date: IngestionDate) -> Self {
        Self {
            root: ensure_trailing_slash(root),
            partition: Some(date.partition_suffix()),
        }
    }

    /// Concrete key prefix for one table.
    pub fn prefix(&self, table: &TableRef) -> String {
        match &self.partition {
            Some(partition) => format!("{}{}/{}/{}", self.root, table.schema, table.table, partition),
            None => format!("{}{}/{}", self.root, table.schema, table.table),
        }
    }
}

/// Destination key for one source object: the destination prefix plus
/// whatever follows the source prefix in the source key.
///
/// This keeps relative paths structurally identical on both sides.
pub fn destination_key(source_prefix: &str, destination_prefix: &str, source_key: &str) -> String {
    let remainder = source_key.get(source_prefix.len()..).unwrap_or("");
    format!("{destination_prefix}{remainder}")
}

/// Append a trailing slash unless the root already ends with one.
fn ensure_trailing_slash(root: &str) -> String {
    if root.ends_with('/') {
        root.to_string()
    } else {
        format!("{root}/")
    }
}
