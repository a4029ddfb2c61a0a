//! Skiff resource aggregation: correlate owners with their pods, assemble
//! status, and build the selected list for each resource kind.
//!
//! Every `build_*_list` drains the channels it needs from a
//! [`ResourceChannels`] set. Channels it does not read are dropped, which
//! releases their producers.

#![forbid(unsafe_code)]

use std::time::Instant;

use k8s_openapi::api::apps::v1::{DaemonSet, ReplicaSet, StatefulSet};
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::ReplicationController;
use serde::Serialize;
use skiff_core::{AggregateList, Event, FetchError, ResourceKind};
use skiff_dataselect::{MetricsClient, SelectQuery};
use skiff_kubehub::{MissPolicy, ResourceChannels};
use tracing::{info, warn};

pub mod event;
pub mod node;
pub mod owner;
pub mod pod;
pub mod service;
pub mod status;
pub mod workload;

pub use event::build_event_list;
pub use node::{build_node_list, NodeSummary};
pub use owner::{correlate, is_controlled_by, Correlation, OwnerKey};
pub use pod::{build_pod_list, PodSummary};
pub use service::{build_service_list, ServiceSummary};
pub use workload::{build_workload_list, create_workload_list, Workload, WorkloadSummary};

/// Not-found on the list being built makes the whole result empty.
pub const PRIMARY: MissPolicy = MissPolicy::EmptyResult;
/// Not-found on a list used only for correlation counts as an empty list.
pub const DEPENDENT: MissPolicy = MissPolicy::EmptyList;

/// Record the outcome of one list build.
pub(crate) fn observe<T>(kind: ResourceKind, t0: Instant, res: Result<AggregateList<T>, FetchError>) -> Result<AggregateList<T>, FetchError> {
    let took_ms = t0.elapsed().as_millis();
    metrics::histogram!("aggregate_build_ms", took_ms as f64, "kind" => kind.as_str());
    match &res {
        Ok(list) => {
            metrics::counter!("aggregate_lists_total", 1, "kind" => kind.as_str());
            info!(kind = %kind, total = list.total_items(), items = list.items.len(), took_ms = %took_ms, "aggregate: list built");
        }
        Err(e) => {
            metrics::counter!("aggregate_failures_total", 1, "kind" => kind.as_str());
            warn!(kind = %kind, error = %e, took_ms = %took_ms, "aggregate: list failed");
        }
    }
    res
}

/// Channels a kind's list is built from, primary first.
pub fn required_kinds(kind: ResourceKind) -> &'static [ResourceKind] {
    use ResourceKind as K;
    match kind {
        K::ReplicaSet => &[K::ReplicaSet, K::Pod, K::Event],
        K::ReplicationController => &[K::ReplicationController, K::Pod, K::Event],
        K::StatefulSet => &[K::StatefulSet, K::Pod, K::Event],
        K::DaemonSet => &[K::DaemonSet, K::Pod, K::Event],
        K::Job => &[K::Job, K::Pod, K::Event],
        K::Pod => &[K::Pod, K::Event],
        K::Node => &[K::Node, K::Pod],
        K::Service => &[K::Service],
        K::Event => &[K::Event],
    }
}

/// A built list of any kind.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "listKind", rename_all = "camelCase")]
pub enum ResourceList {
    Workloads(AggregateList<WorkloadSummary>),
    Pods(AggregateList<PodSummary>),
    Nodes(AggregateList<NodeSummary>),
    Services(AggregateList<ServiceSummary>),
    Events(AggregateList<Event>),
}

impl ResourceList {
    pub fn total_items(&self) -> usize {
        match self {
            ResourceList::Workloads(l) => l.total_items(),
            ResourceList::Pods(l) => l.total_items(),
            ResourceList::Nodes(l) => l.total_items(),
            ResourceList::Services(l) => l.total_items(),
            ResourceList::Events(l) => l.total_items(),
        }
    }

    /// Items on the returned page.
    pub fn len(&self) -> usize {
        match self {
            ResourceList::Workloads(l) => l.items.len(),
            ResourceList::Pods(l) => l.items.len(),
            ResourceList::Nodes(l) => l.items.len(),
            ResourceList::Services(l) => l.items.len(),
            ResourceList::Events(l) => l.items.len(),
        }
    }

    pub fn is_empty(&self) -> bool { self.len() == 0 }
}

/// Build the list for `kind` from `channels`.
pub async fn build_list(
    kind: ResourceKind,
    channels: ResourceChannels,
    query: &SelectQuery,
    metrics: Option<&dyn MetricsClient>,
) -> Result<ResourceList, FetchError> {
    let list = match kind {
        ResourceKind::ReplicaSet => ResourceList::Workloads(build_workload_list::<ReplicaSet>(channels, query, metrics).await?),
        ResourceKind::ReplicationController => {
            ResourceList::Workloads(build_workload_list::<ReplicationController>(channels, query, metrics).await?)
        }
        ResourceKind::StatefulSet => ResourceList::Workloads(build_workload_list::<StatefulSet>(channels, query, metrics).await?),
        ResourceKind::DaemonSet => ResourceList::Workloads(build_workload_list::<DaemonSet>(channels, query, metrics).await?),
        ResourceKind::Job => ResourceList::Workloads(build_workload_list::<Job>(channels, query, metrics).await?),
        ResourceKind::Pod => ResourceList::Pods(build_pod_list(channels, query, metrics).await?),
        ResourceKind::Node => ResourceList::Nodes(build_node_list(channels, query, metrics).await?),
        ResourceKind::Service => ResourceList::Services(build_service_list(channels, query, metrics).await?),
        ResourceKind::Event => ResourceList::Events(build_event_list(channels, query, metrics).await?),
    };
    Ok(list)
}
