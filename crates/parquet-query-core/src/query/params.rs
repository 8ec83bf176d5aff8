//! Request parameter validation.
//!
//! Everything here runs against the resolved schema only; no rows are read.
//! Checks run in a fixed order so the first failing rule decides the error:
//! pagination, projection, filter column, filter literal.

use datafusion::common::ScalarValue;
use log::debug;
use snafu::prelude::*;

use crate::{
    error::{
        InvalidColumnsSnafu, InvalidFilterValueSnafu, OutOfRangeParameterSnafu, QueryResult,
        UnknownFilterColumnSnafu,
    },
    schema::{ColumnSchema, DatasetSchema},
};

/// Rows returned when no limit is given.
pub const DEFAULT_LIMIT: i64 = 100;
/// Largest accepted page size.
pub const MAX_LIMIT: i64 = 10_000;

/// A validated page window: `offset >= 0`, `1 <= limit <= MAX_LIMIT`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    offset: usize,
    limit: usize,
}

impl Pagination {
    /// Validate raw pagination values.
    ///
    /// Offset is checked before limit.
    pub fn new(offset: i64, limit: i64) -> QueryResult<Self> {
        let checked_offset = usize::try_from(offset).ok().context(OutOfRangeParameterSnafu {
            field: "offset",
            value: offset,
            min: 0i64,
            max: None::<i64>,
        })?;

        ensure!(
            (1..=MAX_LIMIT).contains(&limit),
            OutOfRangeParameterSnafu {
                field: "limit",
                value: limit,
                min: 1i64,
                max: Some(MAX_LIMIT),
            }
        );

        Ok(Self {
            offset: checked_offset,
            limit: limit as usize,
        })
    }

    /// Like [`Pagination::new`], substituting defaults for absent values.
    pub fn from_optional(offset: Option<i64>, limit: Option<i64>) -> QueryResult<Self> {
        Self::new(offset.unwrap_or(0), limit.unwrap_or(DEFAULT_LIMIT))
    }

    /// Rows to skip.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Maximum rows to return.
    pub fn limit(&self) -> usize {
        self.limit
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_LIMIT as usize,
        }
    }
}

/// Equality predicate on one column, with the literal already typed.
#[derive(Clone, Debug, PartialEq)]
pub struct EqualityFilter {
    column: String,
    raw: String,
    value: ScalarValue,
}

impl EqualityFilter {
    /// Type `raw` as a literal of `column`'s type.
    pub fn typed(column: &ColumnSchema, raw: &str) -> QueryResult<Self> {
        let value = ScalarValue::try_from_string(raw.to_string(), &column.data_type)
            .ok()
            .context(InvalidFilterValueSnafu {
                column: column.name.as_str(),
                value: raw,
                data_type: column.column_type.to_string(),
            })?;

        Ok(Self {
            column: column.name.clone(),
            raw: raw.to_string(),
            value,
        })
    }

    /// Filtered column.
    pub fn column(&self) -> &str {
        &self.column
    }

    /// The literal as supplied by the caller.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The literal, typed to the column.
    pub fn value(&self) -> &ScalarValue {
        &self.value
    }
}

/// A fully validated request, ready to be planned.
#[derive(Clone, Debug, PartialEq)]
pub struct QuerySpec {
    projection: Option<Vec<String>>,
    filter: Option<EqualityFilter>,
    pagination: Pagination,
}

impl QuerySpec {
    /// Projected columns in requested order, duplicates removed; `None`
    /// keeps every column.
    pub fn projection(&self) -> Option<&[String]> {
        self.projection.as_deref()
    }

    /// Equality filter, if any.
    pub fn filter(&self) -> Option<&EqualityFilter> {
        self.filter.as_ref()
    }

    /// Page window.
    pub fn pagination(&self) -> Pagination {
        self.pagination
    }
}

/// Split a comma separated column list, trimming each name.
///
/// Only the empty string means "no projection"; a whitespace-only list is
/// one empty name and fails validation.
pub fn parse_column_list(raw: &str) -> Option<Vec<String>> {
    if raw.is_empty() {
        return None;
    }
    Some(raw.split(',').map(|c| c.trim().to_string()).collect())
}

fn dedup_preserving_order(names: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        if !out.contains(name) {
            out.push(name.clone());
        }
    }
    out
}

/// Check a request against `schema` and produce a [`QuerySpec`].
///
/// `columns` is the raw comma separated projection. A `filter_value` without
/// a `filter_column` is ignored; a `filter_column` is validated even when no
/// value accompanies it, but then filters nothing. An empty `filter_value`
/// counts as absent.
pub fn validate(
    schema: &DatasetSchema,
    columns: Option<&str>,
    filter_column: Option<&str>,
    filter_value: Option<&str>,
    pagination: Pagination,
) -> QueryResult<QuerySpec> {
    let projection = match columns.and_then(parse_column_list) {
        Some(requested) => {
            let missing: Vec<String> = requested
                .iter()
                .filter(|c| !schema.contains(c))
                .cloned()
                .collect();
            ensure!(
                missing.is_empty(),
                InvalidColumnsSnafu {
                    requested: requested.clone(),
                    invalid: dedup_preserving_order(&missing),
                    available: schema.names(),
                }
            );
            Some(dedup_preserving_order(&requested))
        }
        None => None,
    };

    let filter = match filter_column {
        Some(name) => {
            let column = schema.column(name).context(UnknownFilterColumnSnafu {
                requested: name,
                available: schema.names(),
            })?;
            match filter_value.filter(|raw| !raw.is_empty()) {
                Some(raw) => Some(EqualityFilter::typed(column, raw)?),
                None => None,
            }
        }
        None => {
            if filter_value.is_some() {
                debug!("filter value given without a filter column; ignoring it");
            }
            None
        }
    };

    Ok(QuerySpec {
        projection,
        filter,
        pagination,
    })
}
