//! Remote scanner: opens one file of the configured location as a lazy
//! [`DatasetHandle`].
//!
//! Opening does two small remote calls and no row reads:
//!
//! 1. A `HEAD` on the object, so a missing object, denied access or an
//!    unreachable backend is reported as `StorageUnavailable` with the exact
//!    cause.
//! 2. A footer read through DataFusion's parquet reader, which yields the
//!    schema. A failure here on an object that exists is `SchemaUnavailable`.
//!
//! Each open builds a fresh `SessionContext` with the object store
//! registered on it; the handle owns that session and nothing is shared with
//! other requests.

use std::{sync::Arc, time::Duration};

use datafusion::prelude::{ParquetReadOptions, SessionConfig, SessionContext};
use log::{debug, warn};
use object_store::{ObjectStore, path::Path as ObjectPath};
use snafu::ResultExt;
use url::Url;

use crate::{
    config::ScannerConfig,
    dataset::DatasetHandle,
    error::{QueryError, QueryResult, StorageUnavailableSnafu, schema_failure, timed_out},
    schema::DatasetSchema,
    storage::{StorageResult, classify_object_store_error, object_path, table_url},
};

/// Opens dataset files relative to one storage location.
///
/// Cheap to clone; clones share the object-store client, which holds no
/// per-request state.
#[derive(Clone, Debug)]
pub struct RemoteScanner {
    location: String,
    store: Arc<dyn ObjectStore>,
    store_url: Url,
    timeout: Duration,
}

impl RemoteScanner {
    /// Build a scanner for the configured location.
    pub fn new(config: &ScannerConfig) -> StorageResult<Self> {
        let store = config
            .location
            .build_store(config.credentials.as_deref())?;
        let store_url = config.location.store_url()?;

        debug!(
            "scanner ready: location={} project={} timeout_ms={}",
            config.location,
            config.project_id.as_deref().unwrap_or("-"),
            config.timeout.as_millis()
        );

        Ok(Self {
            location: config.location.to_string(),
            store,
            store_url,
            timeout: config.timeout,
        })
    }

    /// Build a scanner over an already constructed store registered at
    /// `store_url` (for example an in-memory store, or a store with custom
    /// client options).
    pub fn from_store(store_url: Url, store: Arc<dyn ObjectStore>, timeout: Duration) -> Self {
        Self {
            location: store_url.to_string(),
            store,
            store_url,
            timeout,
        }
    }

    /// Display form of the storage location.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Bound applied to each remote call.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Open `file_path` (relative to the location) as a lazy handle.
    ///
    /// Only object metadata and the parquet footer are fetched.
    pub async fn open(&self, file_path: &str) -> QueryResult<DatasetHandle> {
        let path = object_path(file_path).context(StorageUnavailableSnafu)?;
        let url = table_url(&self.store_url, &path).context(StorageUnavailableSnafu)?;

        match tokio::time::timeout(self.timeout, self.open_inner(file_path, &path, &url)).await {
            Ok(opened) => opened,
            Err(_) => {
                warn!("open of {file_path} timed out after {:?}", self.timeout);
                Err(timed_out(file_path, self.timeout))
            }
        }
    }

    async fn open_inner(
        &self,
        file_path: &str,
        path: &ObjectPath,
        url: &Url,
    ) -> QueryResult<DatasetHandle> {
        let meta = self.store.head(path).await.map_err(|e| {
            let source = classify_object_store_error(file_path, e);
            warn!("cannot address {file_path} in {}: {source}", self.location);
            QueryError::StorageUnavailable { source }
        })?;

        let ctx = self.session();
        // The URL names exactly one object, so accept whatever suffix it has.
        let options = ParquetReadOptions {
            file_extension: "",
            ..Default::default()
        };
        let frame = ctx
            .read_parquet(url.as_str(), options)
            .await
            .map_err(|e| schema_failure(file_path, e))?;

        let schema = DatasetSchema::from_arrow(frame.schema().as_arrow());
        debug!(
            "opened {url}: {} bytes, {} columns",
            meta.size,
            schema.len()
        );

        Ok(DatasetHandle::new(file_path, frame, schema, self.timeout))
    }

    /// Fresh single-partition session so results come back in file order.
    fn session(&self) -> SessionContext {
        let config = SessionConfig::new()
            .with_target_partitions(1)
            .with_repartition_file_scans(false);
        let ctx = SessionContext::new_with_config(config);
        ctx.register_object_store(&self.store_url, Arc::clone(&self.store));
        ctx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use object_store::memory::InMemory;

    use crate::storage::StorageError;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn memory_scanner() -> Result<RemoteScanner, url::ParseError> {
        let url = Url::parse("memory://dataset/")?;
        Ok(RemoteScanner::from_store(
            url,
            Arc::new(InMemory::new()),
            Duration::from_secs(5),
        ))
    }

    #[tokio::test]
    async fn missing_object_is_storage_not_found() -> TestResult {
        let scanner = memory_scanner()?;
        let err = scanner
            .open("absent.parquet")
            .await
            .expect_err("object does not exist");

        match err {
            QueryError::StorageUnavailable {
                source: StorageError::NotFound { path, .. },
            } => assert_eq!(path, "absent.parquet"),
            other => return Err(format!("unexpected error: {other:?}").into()),
        }
        Ok(())
    }

    #[tokio::test]
    async fn traversal_is_rejected_before_any_request() -> TestResult {
        let scanner = memory_scanner()?;
        let err = scanner
            .open("../outside.parquet")
            .await
            .expect_err("traversal must be rejected");
        assert!(matches!(
            err,
            QueryError::StorageUnavailable {
                source: StorageError::InvalidPath { .. }
            }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn non_parquet_object_is_schema_unavailable() -> TestResult {
        let store = Arc::new(InMemory::new());
        store
            .put(
                &ObjectPath::from("notes.parquet"),
                vec![b'x'; 64].into(),
            )
            .await?;
        let scanner = RemoteScanner::from_store(
            Url::parse("memory://dataset/")?,
            store,
            Duration::from_secs(5),
        );

        let err = scanner
            .open("notes.parquet")
            .await
            .expect_err("garbage is not parquet");
        assert!(
            matches!(err, QueryError::SchemaUnavailable { .. }),
            "{err:?}"
        );
        Ok(())
    }
}
