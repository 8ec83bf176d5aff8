//! Numeric column statistics as a single aggregation.
//!
//! All min/max/mean aggregates of every numeric column are issued in one
//! scan. Aggregate outputs are aliased by column position, never by name, so
//! any column name (dots, spaces, clashes with generated names) is safe.
//!
//! NaN in floating point columns is treated as missing: it is mapped to null
//! before aggregating, so one NaN does not poison the column's max and mean.

use std::time::Duration;

use arrow::{
    array::{Array, AsArray},
    compute::cast,
    datatypes::{DataType, Float64Type},
    error::ArrowError,
    record_batch::RecordBatch,
};
use datafusion::{
    common::ScalarValue,
    error::{DataFusionError, Result as DFResult},
    functions::math::expr_fn::isnan,
    functions_aggregate::expr_fn::{avg, max, min},
    logical_expr::{Expr, ident, lit, when},
    prelude::DataFrame,
};
use log::debug;
use serde::{Serialize, Serializer};

use crate::{
    dataset::DatasetHandle,
    error::{QueryResult, execution_failure, timed_out},
    schema::ColumnType,
};

/// Min, max and mean of one numeric column; `None` when the column has no
/// non-null, non-NaN values or the value is not finite.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct ColumnStats {
    /// Smallest non-null value.
    pub min: Option<f64>,
    /// Largest non-null value.
    pub max: Option<f64>,
    /// Arithmetic mean of non-null values.
    pub mean: Option<f64>,
}

/// Per-column statistics in schema order. Serializes as an ordered map.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NumericStats(Vec<(String, ColumnStats)>);

impl NumericStats {
    /// Statistics for `column`, if it is numeric.
    pub fn get(&self, column: &str) -> Option<&ColumnStats> {
        self.0.iter().find(|(name, _)| name == column).map(|(_, s)| s)
    }

    /// Entries in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ColumnStats)> {
        self.0.iter().map(|(name, s)| (name.as_str(), s))
    }

    /// Number of numeric columns.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no numeric columns.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for NumericStats {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

const STATS: [&str; 3] = ["min", "max", "mean"];

fn stat_alias(position: usize, stat: &str) -> String {
    format!("__stats_{position}_{stat}")
}

/// A built, not yet executed statistics aggregation.
#[derive(Debug)]
pub struct StatsPlan {
    path: String,
    base: DataFrame,
    columns: Vec<String>,
    floats: Vec<bool>,
    timeout: Duration,
}

impl StatsPlan {
    /// Plan the aggregation over every numeric column of `handle`.
    ///
    /// Returns `None` when the dataset has no numeric column; nothing is
    /// planned or executed in that case.
    pub fn plan(handle: &DatasetHandle) -> Option<Self> {
        let (columns, floats): (Vec<String>, Vec<bool>) = handle
            .schema()
            .numeric_columns()
            .map(|c| (c.name.clone(), matches!(c.column_type, ColumnType::Float { .. })))
            .unzip();
        if columns.is_empty() {
            return None;
        }
        Some(Self {
            path: handle.path().to_string(),
            base: handle.frame(),
            columns,
            floats,
            timeout: handle.timeout(),
        })
    }

    /// Numeric columns covered, in schema order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// The aggregate expressions, three per column.
    pub fn aggregates(&self) -> DFResult<Vec<Expr>> {
        let mut exprs = Vec::with_capacity(self.columns.len() * 3);
        for (idx, (name, float)) in self.columns.iter().zip(&self.floats).enumerate() {
            let input = if *float {
                without_nan(name)?
            } else {
                ident(name)
            };
            exprs.push(min(input.clone()).alias(stat_alias(idx, STATS[0])));
            exprs.push(max(input.clone()).alias(stat_alias(idx, STATS[1])));
            exprs.push(avg(input).alias(stat_alias(idx, STATS[2])));
        }
        Ok(exprs)
    }

    /// Run the aggregation once.
    pub async fn execute(self) -> QueryResult<NumericStats> {
        let frame = self
            .aggregates()
            .and_then(|exprs| self.base.clone().aggregate(vec![], exprs))
            .map_err(|e| execution_failure(&self.path, e))?;

        let batches = tokio::time::timeout(self.timeout, frame.collect())
            .await
            .map_err(|_| timed_out(&self.path, self.timeout))?
            .map_err(|e| execution_failure(&self.path, e))?;

        let stats = decode(&batches, &self.columns)
            .map_err(|e| execution_failure(&self.path, DataFusionError::from(e)))?;
        debug!("{}: stats for {} numeric columns", self.path, stats.len());
        Ok(stats)
    }
}

/// `CASE WHEN isnan(col) THEN NULL ELSE col END`
fn without_nan(name: &str) -> DFResult<Expr> {
    when(isnan(ident(name)), lit(ScalarValue::Null)).otherwise(ident(name))
}

/// Plan min/max/mean over every numeric column of `handle`; `None` when
/// there is none.
pub fn plan_numeric_stats(handle: &DatasetHandle) -> Option<StatsPlan> {
    StatsPlan::plan(handle)
}

fn decode(batches: &[RecordBatch], columns: &[String]) -> Result<NumericStats, ArrowError> {
    let row = batches.iter().find(|b| b.num_rows() > 0);
    let mut out = Vec::with_capacity(columns.len());

    for (idx, name) in columns.iter().enumerate() {
        let stats = match row {
            Some(batch) => ColumnStats {
                min: stat_value(batch, &stat_alias(idx, STATS[0]))?,
                max: stat_value(batch, &stat_alias(idx, STATS[1]))?,
                mean: stat_value(batch, &stat_alias(idx, STATS[2]))?,
            },
            None => ColumnStats::default(),
        };
        out.push((name.clone(), stats));
    }

    Ok(NumericStats(out))
}

fn stat_value(batch: &RecordBatch, alias: &str) -> Result<Option<f64>, ArrowError> {
    let column = batch
        .column_by_name(alias)
        .ok_or_else(|| ArrowError::SchemaError(format!("aggregate output {alias} missing")))?;
    if column.is_null(0) {
        return Ok(None);
    }
    let as_float = cast(column, &DataType::Float64)?;
    let value = as_float.as_primitive::<Float64Type>().value(0);
    Ok(value.is_finite().then_some(value))
}
