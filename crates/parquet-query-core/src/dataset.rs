//! Lazy dataset handle and schema resolution.

use std::time::Duration;

use datafusion::prelude::DataFrame;
use log::debug;

use crate::{
    error::{QueryResult, schema_failure, timed_out},
    schema::DatasetSchema,
};

/// A lazy, schema-known reference to one remote parquet file.
///
/// Created per request by [`crate::RemoteScanner::open`]. Holding a handle
/// costs no row reads; only plan execution and [`DatasetHandle::row_count`]
/// touch the data, and both go through the engine's pushdown.
#[derive(Debug)]
pub struct DatasetHandle {
    path: String,
    frame: DataFrame,
    schema: DatasetSchema,
    timeout: Duration,
}

impl DatasetHandle {
    pub(crate) fn new(
        path: impl Into<String>,
        frame: DataFrame,
        schema: DatasetSchema,
        timeout: Duration,
    ) -> Self {
        Self {
            path: path.into(),
            frame,
            schema,
            timeout,
        }
    }

    /// File path relative to the storage location.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Ordered column name → type mapping, read from file metadata.
    pub fn schema(&self) -> &DatasetSchema {
        &self.schema
    }

    /// Number of rows, computed by a pushed-down `count(*)`.
    pub async fn row_count(&self) -> QueryResult<u64> {
        let counted = tokio::time::timeout(self.timeout, self.frame().count())
            .await
            .map_err(|_| timed_out(&self.path, self.timeout))?;
        let rows = counted.map_err(|e| schema_failure(&self.path, e))?;
        debug!("{}: {rows} rows", self.path);
        Ok(rows as u64)
    }

    /// The unmodified scan, as the starting point of a plan.
    pub(crate) fn frame(&self) -> DataFrame {
        self.frame.clone()
    }

    pub(crate) fn timeout(&self) -> Duration {
        self.timeout
    }
}
