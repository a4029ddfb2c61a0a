//! Turning boundary query strings into a [`SelectQuery`].
//!
//! - `sortBy`: `a|d,property` pairs, e.g. `d,creationTimestamp,a,name`
//! - `filterBy`: `property,value` pairs; `name` matches by substring, the rest exactly
//! - `itemsPerPage` / `page`: page window (page defaults to 1)
//! - `metricNames` / `aggregations`: comma lists

use serde::{Deserialize, Serialize};
use skiff_core::Aggregation;

use crate::cell::property;
use crate::query::{FilterBy, MetricQuery, SelectQuery, SortBy};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryParams {
    pub sort_by: Option<String>,
    pub filter_by: Option<String>,
    pub items_per_page: Option<i64>,
    pub page: Option<i64>,
    pub metric_names: Option<String>,
    pub aggregations: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("sortBy needs direction,property pairs, got {0:?}")]
    SortPairs(String),
    #[error("unknown sort direction {0:?} (expected a or d)")]
    SortDirection(String),
    #[error("filterBy needs property,value pairs, got {0:?}")]
    FilterPairs(String),
    #[error("unknown aggregation {0:?}")]
    Aggregation(String),
}

fn split_list(s: &str) -> Vec<&str> {
    s.split(',').map(str::trim).filter(|p| !p.is_empty()).collect()
}

fn parse_sort(raw: &str) -> Result<Vec<SortBy>, QueryError> {
    let parts = split_list(raw);
    if parts.len() % 2 != 0 { return Err(QueryError::SortPairs(raw.to_string())); }
    parts
        .chunks(2)
        .map(|pair| match pair[0] {
            "a" => Ok(SortBy::asc(pair[1])),
            "d" => Ok(SortBy::desc(pair[1])),
            other => Err(QueryError::SortDirection(other.to_string())),
        })
        .collect()
}

fn parse_filter(raw: &str) -> Result<Vec<FilterBy>, QueryError> {
    let parts = split_list(raw);
    if parts.len() % 2 != 0 { return Err(QueryError::FilterPairs(raw.to_string())); }
    Ok(parts
        .chunks(2)
        .map(|pair| {
            if pair[0] == property::NAME { FilterBy::contains(pair[0], pair[1]) } else { FilterBy::exact(pair[0], pair[1]) }
        })
        .collect())
}

fn parse_aggregations(raw: &str) -> Result<Vec<Aggregation>, QueryError> {
    split_list(raw)
        .into_iter()
        .map(|a| Aggregation::parse(a).ok_or_else(|| QueryError::Aggregation(a.to_string())))
        .collect()
}

impl SelectQuery {
    pub fn parse(params: &QueryParams) -> Result<Self, QueryError> {
        let mut q = SelectQuery::none();
        if let Some(raw) = params.sort_by.as_deref() {
            for s in parse_sort(raw)? { q = q.sort_by(s); }
        }
        if let Some(raw) = params.filter_by.as_deref() {
            for f in parse_filter(raw)? { q = q.filter_by(f); }
        }
        if let Some(per) = params.items_per_page {
            q = q.paginate(per, params.page.unwrap_or(1));
        }
        let names = params.metric_names.as_deref().map(split_list).unwrap_or_default();
        if !names.is_empty() {
            let aggs = match params.aggregations.as_deref() {
                Some(raw) => parse_aggregations(raw)?,
                None => Vec::new(),
            };
            q = q.with_metrics(MetricQuery::new(names.into_iter().map(String::from).collect(), aggs));
        }
        Ok(q)
    }
}
