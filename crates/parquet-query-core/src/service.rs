//! The exposed operations and their serializable payloads.
//!
//! Each call opens the file afresh through the scanner, so every request owns
//! its own dataset handle and engine session and nothing carries over between
//! calls.

use log::debug;
use serde::Serialize;

use crate::{
    error::QueryResult,
    query::{
        NumericStats, Pagination, QueryPlan, ResultRow, params::validate,
        stats::plan_numeric_stats,
    },
    scanner::RemoteScanner,
    schema::DatasetSchema,
};

/// `schema_info` payload.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SchemaInfo {
    /// Column name → type tag, in file order.
    pub columns: DatasetSchema,
    /// Total number of rows.
    pub row_count: u64,
}

/// Raw, unvalidated parameters of a `rows` request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RowsParams {
    /// Page size; defaults to 100.
    pub limit: Option<i64>,
    /// Rows to skip; defaults to 0.
    pub offset: Option<i64>,
    /// Comma separated projection.
    pub columns: Option<String>,
    /// Column for the equality filter.
    pub filter_column: Option<String>,
    /// Literal for the equality filter.
    pub filter_value: Option<String>,
}

/// `rows` payload.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RowsPage {
    /// Materialized rows.
    pub data: Vec<ResultRow>,
    /// Number of rows in `data`.
    pub count: usize,
    /// Effective offset.
    pub offset: usize,
    /// Effective limit.
    pub limit: usize,
}

/// `stats` payload.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DatasetStats {
    /// Total number of rows.
    pub total_rows: u64,
    /// Number of columns.
    pub total_columns: usize,
    /// Column names in file order.
    pub columns: Vec<String>,
    /// Min/max/mean per numeric column; omitted when there is none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numeric_columns: Option<NumericStats>,
}

/// Liveness payload. Produced without touching storage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthInfo {
    /// Always `healthy`.
    pub status: &'static str,
    /// Configured storage location.
    pub store: String,
}

/// Schema discovery, row retrieval and numeric statistics over files of one
/// storage location.
#[derive(Clone, Debug)]
pub struct DatasetService {
    scanner: RemoteScanner,
}

impl DatasetService {
    /// Serve files through `scanner`.
    pub fn new(scanner: RemoteScanner) -> Self {
        Self { scanner }
    }

    /// The underlying scanner.
    pub fn scanner(&self) -> &RemoteScanner {
        &self.scanner
    }

    /// Liveness report.
    pub fn health(&self) -> HealthInfo {
        HealthInfo {
            status: "healthy",
            store: self.scanner.location().to_string(),
        }
    }

    /// Column types and row count of `file`.
    pub async fn schema_info(&self, file: &str) -> QueryResult<SchemaInfo> {
        let handle = self.scanner.open(file).await?;
        let row_count = handle.row_count().await?;
        Ok(SchemaInfo {
            columns: handle.schema().clone(),
            row_count,
        })
    }

    /// One page of rows of `file`.
    ///
    /// Pagination is range-checked before the file is opened.
    pub async fn rows(&self, file: &str, params: &RowsParams) -> QueryResult<RowsPage> {
        let (plan, pagination) = self.plan_rows(file, params).await?;
        let data = plan.execute().await?;
        Ok(RowsPage {
            count: data.len(),
            data,
            offset: pagination.offset(),
            limit: pagination.limit(),
        })
    }

    /// The optimized logical plan a `rows` request would run, without
    /// running it.
    pub async fn explain_rows(&self, file: &str, params: &RowsParams) -> QueryResult<String> {
        let (plan, _) = self.plan_rows(file, params).await?;
        plan.explain()
    }

    async fn plan_rows(
        &self,
        file: &str,
        params: &RowsParams,
    ) -> QueryResult<(QueryPlan, Pagination)> {
        let pagination = Pagination::from_optional(params.offset, params.limit)?;
        let handle = self.scanner.open(file).await?;
        let spec = validate(
            handle.schema(),
            params.columns.as_deref(),
            params.filter_column.as_deref(),
            params.filter_value.as_deref(),
            pagination,
        )?;
        let plan = QueryPlan::build(&handle, &spec);
        debug!("{file}: planned {:?}", plan.ops());
        Ok((plan, pagination))
    }

    /// Row count, column list and numeric statistics of `file`.
    pub async fn stats(&self, file: &str) -> QueryResult<DatasetStats> {
        let handle = self.scanner.open(file).await?;
        let total_rows = handle.row_count().await?;

        let numeric_columns = match plan_numeric_stats(&handle) {
            Some(plan) => Some(plan.execute().await?),
            None => {
                debug!("{file}: no numeric columns, skipping aggregation");
                None
            }
        };

        Ok(DatasetStats {
            total_rows,
            total_columns: handle.schema().len(),
            columns: handle.schema().names(),
            numeric_columns,
        })
    }
}
