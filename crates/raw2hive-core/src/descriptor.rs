//! Ingested-table descriptors
//!
//! Upstream ingestion emits loose records; both identifier fields are
//! optional at the edge and checked here before any prefix is computed.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One entry of the ingested-tables manifest handed to a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableDescriptor {
    #[serde(rename = "SchemaName", default, skip_serializing_if = "Option::is_none")]
    pub schema_name: Option<String>,

    #[serde(rename = "TableName", default, skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
}

/// A descriptor that cannot identify a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DescriptorError {
    #[error("descriptor is missing SchemaName")]
    MissingSchemaName,
    #[error("descriptor is missing TableName")]
    MissingTableName,
}

/// A validated (schema, table) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub schema: String,
    pub table: String,
}

impl std::fmt::Display for TableRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.schema, self.table)
    }
}

impl TableDescriptor {
    /// Check field presence and produce a usable [`TableRef`].
    ///
    /// Only presence is validated; the *content* of the identifiers is
    /// passed through unchanged, empty strings included.
    pub fn resolve(&self) -> Result<TableRef, DescriptorError> {
        let schema = self
            .schema_name
            .clone()
            .ok_or(DescriptorError::MissingSchemaName)?;
        let table = self
            .table_name
            .clone()
            .ok_or(DescriptorError::MissingTableName)?;
        Ok(TableRef { schema, table })
    }
}
