//! Lazy row query plans.

use std::time::Duration;

use datafusion::{
    common::ScalarValue,
    error::{DataFusionError, Result as DFResult},
    logical_expr::{ident, lit},
    prelude::DataFrame,
};
use log::debug;

use crate::{
    dataset::DatasetHandle,
    error::{QueryResult, execution_failure, timed_out},
};

use super::{
    materialize::{ResultRow, rows_from_batches},
    params::QuerySpec,
};

/// One step of a row query, applied in plan order.
#[derive(Clone, Debug, PartialEq)]
pub enum PlanOp {
    /// Keep rows whose `column` equals `value`.
    Filter {
        /// Filtered column.
        column: String,
        /// Typed literal.
        value: ScalarValue,
    },
    /// Keep only `columns`, in this order.
    Project {
        /// Output columns.
        columns: Vec<String>,
    },
    /// Skip `offset` rows, then keep at most `limit`.
    Slice {
        /// Rows to skip.
        offset: usize,
        /// Maximum rows to keep.
        limit: usize,
    },
}

impl PlanOp {
    fn apply(&self, frame: DataFrame) -> DFResult<DataFrame> {
        match self {
            PlanOp::Filter { column, value } => frame.filter(ident(column).eq(lit(value.clone()))),
            PlanOp::Project { columns } => {
                let names: Vec<&str> = columns.iter().map(String::as_str).collect();
                frame.select_columns(&names)
            }
            PlanOp::Slice { offset, limit } => frame.limit(*offset, Some(*limit)),
        }
    }
}

/// A built, not yet executed row query.
///
/// The operation order is always filter, then projection, then slice, so a
/// filter may reference a column the projection drops and the page window
/// counts filtered rows only.
#[derive(Debug)]
pub struct QueryPlan {
    path: String,
    base: DataFrame,
    ops: Vec<PlanOp>,
    timeout: Duration,
}

impl QueryPlan {
    /// Lay out the operations for `spec` over `handle`. No I/O happens here.
    pub fn build(handle: &DatasetHandle, spec: &QuerySpec) -> Self {
        let mut ops = Vec::with_capacity(3);

        if let Some(filter) = spec.filter() {
            ops.push(PlanOp::Filter {
                column: filter.column().to_string(),
                value: filter.value().clone(),
            });
        }
        if let Some(columns) = spec.projection() {
            ops.push(PlanOp::Project {
                columns: columns.to_vec(),
            });
        }
        let page = spec.pagination();
        ops.push(PlanOp::Slice {
            offset: page.offset(),
            limit: page.limit(),
        });

        Self {
            path: handle.path().to_string(),
            base: handle.frame(),
            ops,
            timeout: handle.timeout(),
        }
    }

    /// Operations in application order.
    pub fn ops(&self) -> &[PlanOp] {
        &self.ops
    }

    /// Render the optimized logical plan without executing it.
    pub fn explain(&self) -> QueryResult<String> {
        let plan = self
            .compose()
            .and_then(DataFrame::into_optimized_plan)
            .map_err(|e| execution_failure(&self.path, e))?;
        Ok(plan.display_indent().to_string())
    }

    /// Run the plan once and materialize the page.
    pub async fn execute(self) -> QueryResult<Vec<ResultRow>> {
        let frame = self
            .compose()
            .map_err(|e| execution_failure(&self.path, e))?;

        let batches = tokio::time::timeout(self.timeout, frame.collect())
            .await
            .map_err(|_| timed_out(&self.path, self.timeout))?
            .map_err(|e| execution_failure(&self.path, e))?;

        let rows = rows_from_batches(&batches)
            .map_err(|e| execution_failure(&self.path, DataFusionError::from(e)))?;
        debug!("{}: {} rows materialized", self.path, rows.len());
        Ok(rows)
    }

    fn compose(&self) -> DFResult<DataFrame> {
        self.ops
            .iter()
            .try_fold(self.base.clone(), |frame, op| op.apply(frame))
    }
}
