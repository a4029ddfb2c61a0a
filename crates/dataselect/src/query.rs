//! Declarative selection request.

use std::ops::Range;

use serde::{Deserialize, Serialize};
use skiff_core::Aggregation;
use smallvec::SmallVec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchMode {
    Exact,
    Contains,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterBy {
    pub property: String,
    pub value: String,
    pub mode: MatchMode,
}

impl FilterBy {
    pub fn exact(property: &str, value: &str) -> Self {
        Self { property: property.to_string(), value: value.to_string(), mode: MatchMode::Exact }
    }

    pub fn contains(property: &str, value: &str) -> Self {
        Self { property: property.to_string(), value: value.to_string(), mode: MatchMode::Contains }
    }

    pub fn matches(&self, rendered: &str) -> bool {
        match self.mode {
            MatchMode::Exact => rendered == self.value,
            MatchMode::Contains => rendered.contains(self.value.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortBy {
    pub property: String,
    pub ascending: bool,
}

impl SortBy {
    pub fn asc(property: &str) -> Self { Self { property: property.to_string(), ascending: true } }
    pub fn desc(property: &str) -> Self { Self { property: property.to_string(), ascending: false } }
}

/// Page window. `items_per_page <= 0` disables pagination; pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Pagination {
    pub items_per_page: i64,
    pub page: i64,
}

impl Pagination {
    pub fn new(items_per_page: i64, page: i64) -> Self { Self { items_per_page, page } }

    pub fn is_enabled(&self) -> bool { self.items_per_page > 0 }

    /// Index range of the page within `len` items; `None` when pagination is off.
    /// Pages before the first or past the end are empty ranges.
    pub fn window(&self, len: usize) -> Option<Range<usize>> {
        if !self.is_enabled() { return None; }
        if self.page < 1 { return Some(0..0); }
        let per = self.items_per_page as u64;
        let start = per.saturating_mul(self.page as u64 - 1);
        if start >= len as u64 { return Some(len..len); }
        let start = start as usize;
        let end = start.saturating_add(per as usize).min(len);
        Some(start..end)
    }
}

/// Metrics to fetch per item of the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MetricQuery {
    pub metric_names: Vec<String>,
    pub aggregations: Vec<Aggregation>,
}

impl MetricQuery {
    pub fn new(metric_names: Vec<String>, aggregations: Vec<Aggregation>) -> Self {
        let aggregations = if aggregations.is_empty() { vec![Aggregation::Sum] } else { aggregations };
        Self { metric_names, aggregations }
    }

    pub fn is_empty(&self) -> bool { self.metric_names.is_empty() }
}

/// Filter, sort, page and metric request. The default selects everything in
/// input order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SelectQuery {
    pub filter: Vec<FilterBy>,
    pub sort: SmallVec<[SortBy; 2]>,
    pub pagination: Pagination,
    pub metrics: Option<MetricQuery>,
}

impl SelectQuery {
    /// Pass-through query.
    pub fn none() -> Self { Self::default() }

    pub fn filter_by(mut self, f: FilterBy) -> Self {
        self.filter.push(f);
        self
    }

    pub fn sort_by(mut self, s: SortBy) -> Self {
        self.sort.push(s);
        self
    }

    pub fn paginate(mut self, items_per_page: i64, page: i64) -> Self {
        self.pagination = Pagination::new(items_per_page, page);
        self
    }

    pub fn with_metrics(mut self, m: MetricQuery) -> Self {
        self.metrics = if m.is_empty() { None } else { Some(m) };
        self
    }

    pub fn wants_metrics(&self) -> bool { self.metrics.as_ref().map(|m| !m.is_empty()).unwrap_or(false) }
}
