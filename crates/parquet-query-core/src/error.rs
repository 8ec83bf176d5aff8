//! Error taxonomy for the query layer.
//!
//! `QueryError` separates failures the caller caused (unknown columns,
//! out-of-range pagination, unparseable filter literals) from failures of the
//! remote side (storage, metadata, execution). Client-side variants carry both
//! the offending input and the full legal set so a caller can correct the
//! request without another metadata round trip.

use datafusion::error::DataFusionError;
use serde::Serialize;
use snafu::{IntoError, prelude::*};

use crate::storage::{EngineSnafu, StorageError, TimeoutSnafu, is_storage_failure};

/// Result alias used throughout the crate.
pub type QueryResult<T> = Result<T, QueryError>;

/// Errors from schema discovery, validation, planning and execution.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum QueryError {
    /// The remote object could not be opened or read.
    #[snafu(display("Storage unavailable: {source}"))]
    StorageUnavailable {
        /// Classified storage failure.
        source: StorageError,
    },

    /// The object opened but its metadata could not be resolved.
    #[snafu(display("Schema unavailable for {path}: {source}"))]
    SchemaUnavailable {
        /// File path relative to the storage location.
        path: String,
        /// Engine error raised while reading metadata.
        source: DataFusionError,
    },

    /// One or more projected columns are not in the schema.
    #[snafu(display("Invalid columns: {invalid:?}. Available columns: {available:?}"))]
    InvalidColumns {
        /// The projection as requested, after trimming.
        requested: Vec<String>,
        /// Entries of `requested` absent from the schema.
        invalid: Vec<String>,
        /// Every column of the dataset, in file order.
        available: Vec<String>,
    },

    /// The filter column is not in the schema.
    #[snafu(display("Filter column '{requested}' not found. Available columns: {available:?}"))]
    UnknownFilterColumn {
        /// The filter column as requested.
        requested: String,
        /// Every column of the dataset, in file order.
        available: Vec<String>,
    },

    /// The filter literal cannot be represented in the filter column's type.
    #[snafu(display("Filter value '{value}' is not a valid {data_type} for column '{column}'"))]
    InvalidFilterValue {
        /// The filter column.
        column: String,
        /// The literal as supplied.
        value: String,
        /// Type tag of the filter column.
        data_type: String,
    },

    /// `limit` or `offset` outside its accepted range.
    #[snafu(display("{field} must be {}, got {value}", describe_range(*min, *max)))]
    OutOfRangeParameter {
        /// Parameter name (`limit` or `offset`).
        field: &'static str,
        /// The value supplied.
        value: i64,
        /// Smallest accepted value.
        min: i64,
        /// Largest accepted value, if bounded.
        max: Option<i64>,
    },

    /// The engine failed for a reason unrelated to storage.
    #[snafu(display("Query execution failed for {path}: {source}"))]
    Execution {
        /// File path relative to the storage location.
        path: String,
        /// Underlying engine error.
        source: DataFusionError,
    },
}

fn describe_range(min: i64, max: Option<i64>) -> String {
    match max {
        Some(max) => format!("between {min} and {max}"),
        None => format!(">= {min}"),
    }
}

/// Who has to act on an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// The request was invalid; retrying it unchanged will fail again.
    Client,
    /// The remote side failed; the request itself may be fine.
    Server,
}

/// Structured, serializable description of a [`QueryError`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    /// Stable error identifier.
    pub error: &'static str,
    /// Human readable message.
    pub message: String,
    /// The request field that was rejected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalid_field: Option<&'static str>,
    /// The offending input(s).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provided: Option<Vec<String>>,
    /// The legal set for the rejected field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<Vec<String>>,
}

impl QueryError {
    /// Whether the caller or the remote side is at fault.
    pub fn class(&self) -> ErrorClass {
        match self {
            QueryError::InvalidColumns { .. }
            | QueryError::UnknownFilterColumn { .. }
            | QueryError::InvalidFilterValue { .. }
            | QueryError::OutOfRangeParameter { .. } => ErrorClass::Client,
            QueryError::StorageUnavailable { .. }
            | QueryError::SchemaUnavailable { .. }
            | QueryError::Execution { .. } => ErrorClass::Server,
        }
    }

    /// Storage and metadata failures may succeed on retry; nothing else will.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            QueryError::StorageUnavailable { .. } | QueryError::SchemaUnavailable { .. }
        )
    }

    /// Stable identifier used in [`ErrorBody::error`].
    pub fn code(&self) -> &'static str {
        match self {
            QueryError::StorageUnavailable { .. } => "storage_unavailable",
            QueryError::SchemaUnavailable { .. } => "schema_unavailable",
            QueryError::InvalidColumns { .. } => "invalid_columns",
            QueryError::UnknownFilterColumn { .. } => "unknown_filter_column",
            QueryError::InvalidFilterValue { .. } => "invalid_filter_value",
            QueryError::OutOfRangeParameter { .. } => "out_of_range_parameter",
            QueryError::Execution { .. } => "execution_failed",
        }
    }

    /// Render the error as a serializable body.
    pub fn to_body(&self) -> ErrorBody {
        let mut body = ErrorBody {
            error: self.code(),
            message: self.to_string(),
            invalid_field: None,
            provided: None,
            available: None,
        };

        match self {
            QueryError::InvalidColumns {
                invalid, available, ..
            } => {
                body.invalid_field = Some("columns");
                body.provided = Some(invalid.clone());
                body.available = Some(available.clone());
            }
            QueryError::UnknownFilterColumn {
                requested,
                available,
            } => {
                body.invalid_field = Some("filter_column");
                body.provided = Some(vec![requested.clone()]);
                body.available = Some(available.clone());
            }
            QueryError::InvalidFilterValue { value, .. } => {
                body.invalid_field = Some("filter_value");
                body.provided = Some(vec![value.clone()]);
            }
            QueryError::OutOfRangeParameter { field, value, .. } => {
                body.invalid_field = Some(*field);
                body.provided = Some(vec![value.to_string()]);
            }
            QueryError::StorageUnavailable { .. }
            | QueryError::SchemaUnavailable { .. }
            | QueryError::Execution { .. } => {}
        }

        body
    }
}

fn storage_from_engine(path: &str, err: DataFusionError) -> QueryError {
    QueryError::StorageUnavailable {
        source: EngineSnafu { path }.into_error(err),
    }
}

/// Classify an engine error raised while resolving metadata.
pub(crate) fn schema_failure(path: &str, err: DataFusionError) -> QueryError {
    if is_storage_failure(&err) {
        storage_from_engine(path, err)
    } else {
        SchemaUnavailableSnafu { path }.into_error(err)
    }
}

/// Classify an engine error raised by a terminal execution.
pub(crate) fn execution_failure(path: &str, err: DataFusionError) -> QueryError {
    if is_storage_failure(&err) {
        storage_from_engine(path, err)
    } else {
        ExecutionSnafu { path }.into_error(err)
    }
}

/// A remote call exceeded the configured bound.
pub(crate) fn timed_out(path: &str, elapsed: std::time::Duration) -> QueryError {
    QueryError::StorageUnavailable {
        source: TimeoutSnafu { path, elapsed }.build(),
    }
}
