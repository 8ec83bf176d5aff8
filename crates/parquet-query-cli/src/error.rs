use parquet_query_core::{ErrorBody, ErrorClass, QueryError, StorageError};
use snafu::Snafu;

pub type CliResult<T> = std::result::Result<T, CliError>;

/// Exit status for requests the caller has to fix.
pub const EXIT_CLIENT: i32 = 2;
/// Exit status for failures on the storage or engine side.
pub const EXIT_SERVER: i32 = 1;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CliError {
    #[snafu(display("Invalid --store '{spec}': {source}"))]
    InvalidStore { spec: String, source: StorageError },

    #[snafu(display("Cannot connect to {store}: {source}"))]
    Connect { store: String, source: StorageError },

    #[snafu(context(false), display("{source}"))]
    Query { source: QueryError },

    #[snafu(display("Failed to encode output: {source}"))]
    Encode { source: serde_json::Error },

    #[snafu(display("Failed to write output: {source}"))]
    WriteOutput { source: std::io::Error },
}

impl CliError {
    /// Client errors exit with 2, everything else with 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidStore { .. } => EXIT_CLIENT,
            CliError::Query { source } if source.class() == ErrorClass::Client => EXIT_CLIENT,
            _ => EXIT_SERVER,
        }
    }

    /// Structured form written to stderr.
    pub fn to_body(&self) -> ErrorBody {
        match self {
            CliError::Query { source } => source.to_body(),
            CliError::InvalidStore { spec, .. } => ErrorBody {
                error: "invalid_store",
                message: self.to_string(),
                invalid_field: Some("store"),
                provided: Some(vec![spec.clone()]),
                available: None,
            },
            CliError::Connect { .. } => ErrorBody {
                error: "storage_unavailable",
                message: self.to_string(),
                invalid_field: None,
                provided: None,
                available: None,
            },
            CliError::Encode { .. } | CliError::WriteOutput { .. } => ErrorBody {
                error: "output_failed",
                message: self.to_string(),
                invalid_field: None,
                provided: None,
                available: None,
            },
        }
    }
}
