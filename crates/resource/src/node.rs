//! Node list: readiness, schedulability and pod slot usage.

use std::time::Instant;

use k8s_openapi::api::core::v1::{Node, Pod};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use skiff_core::{AggregateList, FetchError, Identity, ObjectMeta, ResourceKind, TypeMeta};
use skiff_dataselect::{meta_property, property, select_list, ComparableValue, DataCell, MetricsClient, SelectQuery};
use skiff_kubehub::{read, read_items, Drained, ResourceChannels};

use crate::{observe, DEPENDENT, PRIMARY};

pub const CONDITION_READY: &str = "Ready";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodeSummary {
    pub object_meta: ObjectMeta,
    pub type_meta: TypeMeta,
    /// Status of the `Ready` condition: `True`, `False` or `Unknown`.
    pub ready: String,
    pub unschedulable: bool,
    pub allocated_pods: i64,
    pub pod_capacity: i64,
    /// Allocated pods as a percentage of capacity.
    pub pod_utilization: f64,
}

impl DataCell for NodeSummary {
    fn identity(&self) -> Identity { self.object_meta.identity(ResourceKind::Node) }

    fn property(&self, name: &str) -> Option<ComparableValue> {
        match name {
            property::STATUS => Some(self.ready.as_str().into()),
            _ => meta_property(&self.object_meta, name),
        }
    }
}

fn ready_condition(node: &Node) -> String {
    node.status
        .as_ref()
        .and_then(|s| s.conditions.as_ref())
        .and_then(|cs| cs.iter().find(|c| c.type_ == CONDITION_READY))
        .map(|c| c.status.clone())
        .unwrap_or_else(|| "Unknown".to_string())
}

/// Pod slots from `status.capacity["pods"]`; unparsable or absent is zero.
fn pod_capacity(node: &Node) -> i64 {
    node.status
        .as_ref()
        .and_then(|s| s.capacity.as_ref())
        .and_then(|c| c.get("pods"))
        .and_then(|q| q.0.trim().parse::<i64>().ok())
        .unwrap_or(0)
}

pub fn utilization(allocated: i64, capacity: i64) -> f64 {
    if capacity <= 0 { return 0.0; }
    allocated as f64 * 100.0 / capacity as f64
}

pub fn node_summary(node: &Node, allocated_pods: i64) -> NodeSummary {
    let pod_capacity = pod_capacity(node);
    NodeSummary {
        object_meta: ObjectMeta::from(&node.metadata),
        type_meta: TypeMeta::new(ResourceKind::Node),
        ready: ready_condition(node),
        unschedulable: node.spec.as_ref().and_then(|s| s.unschedulable).unwrap_or(false),
        allocated_pods,
        pod_capacity,
        pod_utilization: utilization(allocated_pods, pod_capacity),
    }
}

pub async fn create_node_list(
    nodes: &[Node],
    pods: &[Pod],
    query: &SelectQuery,
    metrics: Option<&dyn MetricsClient>,
) -> AggregateList<NodeSummary> {
    let mut per_node: FxHashMap<&str, i64> = FxHashMap::default();
    for name in pods.iter().filter_map(|p| p.spec.as_ref()?.node_name.as_deref()) {
        *per_node.entry(name).or_default() += 1;
    }
    let items = nodes
        .iter()
        .map(|n| {
            let allocated = n.metadata.name.as_deref().and_then(|name| per_node.get(name)).copied().unwrap_or(0);
            node_summary(n, allocated)
        })
        .collect();
    select_list(items, query, metrics).await
}

pub async fn build_node_list(
    mut channels: ResourceChannels,
    query: &SelectQuery,
    metrics: Option<&dyn MetricsClient>,
) -> Result<AggregateList<NodeSummary>, FetchError> {
    let t0 = Instant::now();
    let res = drain_and_build(&mut channels, query, metrics).await;
    observe(ResourceKind::Node, t0, res)
}

async fn drain_and_build(
    channels: &mut ResourceChannels,
    query: &SelectQuery,
    metrics: Option<&dyn MetricsClient>,
) -> Result<AggregateList<NodeSummary>, FetchError> {
    let nodes = match read(channels.nodes.take(), ResourceKind::Node, PRIMARY).await? {
        Drained::Items(v) => v,
        Drained::Missing => return Ok(AggregateList::empty()),
    };
    let pods = read_items(channels.pods.take(), ResourceKind::Pod, DEPENDENT).await?;
    Ok(create_node_list(&nodes, &pods, query, metrics).await)
}
