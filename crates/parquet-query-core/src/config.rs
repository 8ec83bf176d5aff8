//! Process-wide scanner configuration.

use std::{path::PathBuf, time::Duration};

use crate::storage::StorageLocation;

/// Default bound on each remote call (metadata open, terminal execution).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration fixed for the lifetime of the process.
///
/// Built once by the transport layer (CLI flags / environment) and handed to
/// [`crate::RemoteScanner::new`]. No field is request scoped.
#[derive(Clone, Debug)]
pub struct ScannerConfig {
    /// Bucket or directory holding the dataset files.
    pub location: StorageLocation,
    /// Optional service-account key file for GCS.
    pub credentials: Option<PathBuf>,
    /// Cloud project identity, reported in logs and health output.
    pub project_id: Option<String>,
    /// Bound applied to every remote call.
    pub timeout: Duration,
}

impl ScannerConfig {
    /// Configuration with default timeout and ambient credentials.
    pub fn new(location: StorageLocation) -> Self {
        Self {
            location,
            credentials: None,
            project_id: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Replace the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Use an explicit service-account key file.
    pub fn with_credentials(mut self, path: impl Into<PathBuf>) -> Self {
        self.credentials = Some(path.into());
        self
    }

    /// Record the cloud project identity.
    pub fn with_project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }
}
