//! Query construction and execution.
//!
//! A request moves strictly forward through three states:
//!
//! - **Unbuilt**: raw parameters. [`params::Pagination::new`] and
//!   [`params::validate`] turn them into a [`QuerySpec`], or reject them.
//! - **Built**: a [`QueryPlan`] (or [`StatsPlan`]) is an immutable list of
//!   operations over a dataset handle. Building performs no I/O and the plan
//!   can be inspected or explained.
//! - **Executed**: `execute(self)` consumes the plan, runs it once and returns
//!   the materialized payload. A plan cannot be executed twice.

pub mod materialize;
pub mod params;
pub mod plan;
pub mod stats;

pub use materialize::ResultRow;
pub use params::{DEFAULT_LIMIT, EqualityFilter, MAX_LIMIT, Pagination, QuerySpec, validate};
pub use plan::{PlanOp, QueryPlan};
pub use stats::{ColumnStats, NumericStats, StatsPlan, plan_numeric_stats};
