//! Storage location and object-store plumbing.
//!
//! This module owns everything that knows about *where* the dataset lives:
//!
//! - Parsing a user-facing location string (`gs://<bucket>` or a local
//!   directory) into a [`StorageLocation`].
//! - Building the matching `object_store` backend and the URL under which it
//!   is registered on a DataFusion session.
//! - Turning a relative file path into an object path and a table URL.
//! - Classifying backend failures into [`StorageError`] variants so callers
//!   can tell a missing object from an access problem or a network failure.
//!
//! The location is process-wide configuration. Nothing in here is request
//! scoped except the per-file path helpers.

use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use datafusion::error::DataFusionError;
use object_store::{
    ObjectStore, gcp::GoogleCloudStorageBuilder, local::LocalFileSystem,
    path::Path as ObjectPath,
};
use snafu::{Backtrace, IntoError, prelude::*};
use url::Url;

/// General result type used by storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur while addressing or reading the remote object.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum StorageError {
    /// The configured location string could not be understood.
    #[snafu(display("Invalid storage location '{spec}': {reason}"))]
    InvalidLocation {
        /// The location string as supplied.
        spec: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The relative file path is not a valid object path.
    #[snafu(display("Invalid object path '{path}': {reason}"))]
    InvalidPath {
        /// The path as supplied by the caller.
        path: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The object does not exist.
    #[snafu(display("Object not found: {path}"))]
    NotFound {
        /// Object path that was not found.
        path: String,
        /// Underlying backend error.
        source: object_store::Error,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },

    /// The backend rejected our credentials or permissions.
    #[snafu(display("Access denied to {path}: {source}"))]
    AccessDenied {
        /// Object path that could not be accessed.
        path: String,
        /// Underlying backend error.
        source: object_store::Error,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },

    /// Any other backend failure (network, throttling, server errors).
    #[snafu(display("Storage backend unreachable for {path}: {source}"))]
    Unreachable {
        /// Object path being accessed.
        path: String,
        /// Underlying backend error.
        source: object_store::Error,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },

    /// The remote call did not finish within the configured timeout.
    #[snafu(display("Timed out after {}ms while accessing {path}", elapsed.as_millis()))]
    Timeout {
        /// Object path being accessed.
        path: String,
        /// The timeout that elapsed.
        elapsed: Duration,
    },

    /// The object-store client could not be constructed.
    #[snafu(display("Failed to configure object store for {location}: {source}"))]
    Build {
        /// Display form of the location.
        location: String,
        /// Underlying backend error.
        source: object_store::Error,
    },

    /// The columnar engine hit a storage failure while reading the object.
    #[snafu(display("Storage failure while reading {path}: {source}"))]
    Engine {
        /// Object path being read.
        path: String,
        /// Engine error wrapping the storage failure.
        source: DataFusionError,
    },
}

impl StorageError {
    /// Short, stable identifier for the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            StorageError::InvalidLocation { .. } => "invalid_location",
            StorageError::InvalidPath { .. } => "invalid_path",
            StorageError::NotFound { .. } => "not_found",
            StorageError::AccessDenied { .. } => "access_denied",
            StorageError::Unreachable { .. } => "unreachable",
            StorageError::Timeout { .. } => "timeout",
            StorageError::Build { .. } => "configuration",
            StorageError::Engine { .. } => "read_failed",
        }
    }
}

/// Map an `object_store` error for `path` into the matching [`StorageError`].
pub(crate) fn classify_object_store_error(path: &str, err: object_store::Error) -> StorageError {
    let path = path.to_string();
    match &err {
        object_store::Error::NotFound { .. } => NotFoundSnafu { path }.into_error(err),
        object_store::Error::PermissionDenied { .. }
        | object_store::Error::Unauthenticated { .. } => AccessDeniedSnafu { path }.into_error(err),
        _ => UnreachableSnafu { path }.into_error(err),
    }
}

/// Whether an engine error was caused by the storage layer rather than by
/// the data or the plan.
pub(crate) fn is_storage_failure(err: &DataFusionError) -> bool {
    let mut current = Some(err as &(dyn std::error::Error + 'static));
    while let Some(e) = current {
        if e.is::<object_store::Error>() || e.is::<std::io::Error>() {
            return true;
        }
        current = e.source();
    }
    false
}

/// Where the dataset lives.
///
/// One location is configured per process; every request resolves its file
/// path relative to it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageLocation {
    /// A Google Cloud Storage bucket.
    Gcs {
        /// Bucket name (no scheme, no trailing slash).
        bucket: String,
    },
    /// A directory on the local filesystem.
    Local(PathBuf),
}

impl fmt::Display for StorageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageLocation::Gcs { bucket } => write!(f, "gs://{bucket}"),
            StorageLocation::Local(root) => write!(f, "{}", root.display()),
        }
    }
}

impl StorageLocation {
    /// Creates a location for a GCS bucket.
    pub fn gcs(bucket: impl Into<String>) -> Self {
        StorageLocation::Gcs {
            bucket: bucket.into(),
        }
    }

    /// Creates a location for a local directory.
    pub fn local(root: impl Into<PathBuf>) -> Self {
        StorageLocation::Local(root.into())
    }

    /// Parse a user-facing location string.
    ///
    /// `gs://<bucket>` (optionally with a trailing `/`) selects GCS; any other
    /// string without a scheme is a local directory.
    pub fn parse(spec: &str) -> StorageResult<Self> {
        let trimmed = spec.trim();
        ensure!(
            !trimmed.is_empty(),
            InvalidLocationSnafu {
                spec,
                reason: "location is empty",
            }
        );

        if let Some(rest) = trimmed.strip_prefix("gs://") {
            let bucket = rest.trim_end_matches('/');
            ensure!(
                !bucket.is_empty() && !bucket.contains('/'),
                InvalidLocationSnafu {
                    spec,
                    reason: "expected gs://<bucket>",
                }
            );
            return Ok(StorageLocation::gcs(bucket));
        }

        ensure!(
            !trimmed.contains("://"),
            InvalidLocationSnafu {
                spec,
                reason: "unsupported scheme; use gs://<bucket> or a local directory",
            }
        );

        Ok(StorageLocation::local(trimmed))
    }

    /// URL under which the backend is registered on a DataFusion session.
    ///
    /// Local directories are registered as `file:///` with a store rooted at
    /// the directory, so table URLs stay relative to the configured root.
    pub(crate) fn store_url(&self) -> StorageResult<Url> {
        let raw = match self {
            StorageLocation::Gcs { bucket } => format!("gs://{bucket}/"),
            StorageLocation::Local(_) => "file:///".to_string(),
        };
        Url::parse(&raw).map_err(|e| {
            InvalidLocationSnafu {
                spec: self.to_string(),
                reason: e.to_string(),
            }
            .build()
        })
    }

    /// Build the object-store client for this location.
    ///
    /// GCS credentials come from the environment (`GOOGLE_*` variables or the
    /// metadata server) unless an explicit service-account key file is given.
    pub(crate) fn build_store(
        &self,
        credentials: Option<&Path>,
    ) -> StorageResult<Arc<dyn ObjectStore>> {
        match self {
            StorageLocation::Gcs { bucket } => {
                let mut builder = GoogleCloudStorageBuilder::from_env().with_bucket_name(bucket);
                if let Some(path) = credentials {
                    builder = builder.with_service_account_path(path.to_string_lossy());
                }
                let store = builder.build().context(BuildSnafu {
                    location: self.to_string(),
                })?;
                Ok(Arc::new(store))
            }
            StorageLocation::Local(root) => {
                let store = LocalFileSystem::new_with_prefix(root).context(BuildSnafu {
                    location: self.to_string(),
                })?;
                Ok(Arc::new(store))
            }
        }
    }
}

/// Parse a caller-supplied relative file path into an object path.
///
/// Rejects empty paths, empty segments and `.`/`..` traversal.
pub(crate) fn object_path(file_path: &str) -> StorageResult<ObjectPath> {
    let path = ObjectPath::parse(file_path).map_err(|e| {
        InvalidPathSnafu {
            path: file_path,
            reason: e.to_string(),
        }
        .build()
    })?;

    ensure!(
        path.parts().next().is_some(),
        InvalidPathSnafu {
            path: file_path,
            reason: "path is empty",
        }
    );

    Ok(path)
}

/// Absolute URL of `path` under the store registered at `base`.
///
/// Segments are percent-encoded, so names with spaces or `#`/`?` survive the
/// round trip through the engine's URL parsing.
pub(crate) fn table_url(base: &Url, path: &ObjectPath) -> StorageResult<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| {
            InvalidLocationSnafu {
                spec: base.to_string(),
                reason: "location URL cannot hold a path",
            }
            .build()
        })?
        .pop_if_empty()
        .extend(path.parts().map(|part| part.as_ref().to_string()));
    Ok(url)
}
