//! Query layer for a single remote parquet file.
//!
//! This crate turns loosely-typed request parameters into a validated, lazy
//! query plan against one parquet object in object storage, executes that
//! plan exactly once, and materializes a bounded, JSON-safe result.
//!
//! - [`storage`]: where the dataset lives (`gs://` bucket or local directory)
//!   and how object-store failures are classified.
//! - [`scanner`]: opens a file into a [`DatasetHandle`] without reading rows.
//! - [`schema`]: column names and type tags resolved from parquet metadata.
//! - [`query`]: parameter validation, plan building, numeric aggregation and
//!   result materialization.
//! - [`service`]: the three exposed operations (`schema_info`, `rows`,
//!   `stats`) returning serializable payloads.
//!
//! DataFusion is the columnar engine. Each request gets its own
//! `SessionContext`, so no state is shared between requests.
#![deny(missing_docs)]
pub mod config;
pub mod dataset;
pub mod error;
pub mod query;
pub mod scanner;
pub mod schema;
pub mod service;
pub mod storage;

pub use config::ScannerConfig;
pub use dataset::DatasetHandle;
pub use error::{ErrorBody, ErrorClass, QueryError, QueryResult};
pub use scanner::RemoteScanner;
pub use schema::{ColumnType, DatasetSchema};
pub use service::{DatasetService, DatasetStats, HealthInfo, RowsPage, RowsParams, SchemaInfo};
pub use storage::{StorageError, StorageLocation};
