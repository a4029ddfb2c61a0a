//! Skiff data selection: one pipeline for every summary kind.
//!
//! Stages run in a fixed order: filter, sort, (optionally) metric attachment
//! over the whole sorted list, then paginate. The filtered count is recorded
//! before pagination and becomes `listMeta.totalItems`.

#![forbid(unsafe_code)]

pub mod attach;
pub mod cell;
pub mod parse;
pub mod query;
pub mod select;

pub use attach::{attach_metrics, cumulative, select_list, MetricsClient};
pub use cell::{meta_property, property, ComparableValue, DataCell};
pub use parse::{QueryError, QueryParams};
pub use query::{FilterBy, MatchMode, MetricQuery, Pagination, SelectQuery, SortBy};
pub use select::{filter, filter_sort, paginate, select, sort, Selection};
