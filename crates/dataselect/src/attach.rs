//! Optional metric attachment. A missing client or a failing lookup yields empty
//! metrics; it never fails the selection.

use std::collections::BTreeMap;
use std::time::Instant;

use skiff_core::{Aggregation, AggregateList, DataPoint, ItemMetrics, ListMeta, Metric};
use tracing::{debug, warn};

use crate::cell::DataCell;
use crate::query::{MetricQuery, SelectQuery};
use crate::select::{filter_sort, paginate};

/// External metrics backend.
#[async_trait::async_trait]
pub trait MetricsClient: Send + Sync {
    /// Samples for one item. Errors are contained to that item.
    async fn metrics(&self, identity: &skiff_core::Identity, query: &MetricQuery) -> anyhow::Result<Vec<Metric>>;
}

/// Fetch metrics for each item, in item order.
pub async fn attach_metrics<T: DataCell>(items: &[T], query: &MetricQuery, client: &dyn MetricsClient) -> Vec<ItemMetrics> {
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        let identity = item.identity();
        let metrics = match client.metrics(&identity, query).await {
            Ok(m) => m,
            Err(e) => {
                warn!(item = %identity, error = %e, "metric lookup failed; item keeps empty metrics");
                metrics::counter!("metric_attach_failures_total", 1);
                Vec::new()
            }
        };
        out.push(ItemMetrics { identity, metrics });
    }
    out
}

/// Fold item metrics into one series per (metric name, aggregation), keyed by
/// timestamp.
pub fn cumulative(items: &[ItemMetrics]) -> Vec<Metric> {
    let mut acc: BTreeMap<(String, Aggregation), BTreeMap<i64, i64>> = BTreeMap::new();
    for m in items.iter().flat_map(|i| i.metrics.iter()) {
        let series = acc.entry((m.metric_name.clone(), m.aggregation)).or_default();
        for p in m.data_points.iter() {
            series.entry(p.x).and_modify(|y| *y = m.aggregation.fold(*y, p.y)).or_insert(p.y);
        }
    }
    acc.into_iter()
        .map(|((metric_name, aggregation), series)| Metric {
            metric_name,
            aggregation,
            data_points: series.into_iter().map(|(x, y)| DataPoint { x, y }).collect(),
        })
        .collect()
}

/// Full pipeline. Metrics, when asked for and a client is present, are fetched
/// for every filtered item so the cumulative series spans the whole list; only
/// the page keeps its per-item metrics.
pub async fn select_list<T: DataCell>(items: Vec<T>, query: &SelectQuery, client: Option<&dyn MetricsClient>) -> AggregateList<T> {
    let started = Instant::now();
    let sorted = filter_sort(items, query);
    let total_items = sorted.len();
    let (all_metrics, cumulative_metrics) = match (query.metrics.as_ref().filter(|m| !m.is_empty()), client) {
        (Some(mq), Some(client)) => {
            let im = attach_metrics(&sorted, mq, client).await;
            let cm = cumulative(&im);
            (im, cm)
        }
        (Some(_), None) => {
            debug!("metrics requested without a metrics client; returning empty metrics");
            (Vec::new(), Vec::new())
        }
        _ => (Vec::new(), Vec::new()),
    };
    // item metrics run parallel to `sorted`, so the same window pages both
    let item_metrics = paginate(all_metrics, &query.pagination);
    let items = paginate(sorted, &query.pagination);
    metrics::histogram!("dataselect_ms", started.elapsed().as_secs_f64() * 1_000.0);
    AggregateList { list_meta: ListMeta { total_items }, cumulative_metrics, item_metrics, items }
}
