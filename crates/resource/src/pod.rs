//! Pod list: one row per pod with its phase, placement and warnings.

use std::time::Instant;

use k8s_openapi::api::core::v1::{Event as CoreEvent, Pod};
use serde::{Deserialize, Serialize};
use skiff_core::{AggregateList, Event, FetchError, Identity, ObjectMeta, ResourceKind, TypeMeta};
use skiff_dataselect::{meta_property, property, select_list, ComparableValue, DataCell, MetricsClient, SelectQuery};
use skiff_kubehub::{read, read_items, Drained, ResourceChannels};

use crate::status::{pod_phase, WarningIndex};
use crate::{observe, DEPENDENT, PRIMARY};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PodSummary {
    pub object_meta: ObjectMeta,
    pub type_meta: TypeMeta,
    pub phase: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub node_name: String,
    pub restart_count: i32,
    pub ready_containers: i32,
    pub total_containers: i32,
    pub warnings: Vec<Event>,
}

impl DataCell for PodSummary {
    fn identity(&self) -> Identity { self.object_meta.identity(ResourceKind::Pod) }

    fn property(&self, name: &str) -> Option<ComparableValue> {
        match name {
            property::STATUS => Some(self.phase.as_str().into()),
            property::NODE => Some(self.node_name.as_str().into()),
            property::RESTARTS => Some(self.restart_count.into()),
            _ => meta_property(&self.object_meta, name),
        }
    }
}

pub fn pod_summary(pod: &Pod, warnings: &WarningIndex<'_>) -> PodSummary {
    let statuses = pod.status.as_ref().and_then(|s| s.container_statuses.as_deref()).unwrap_or(&[]);
    PodSummary {
        object_meta: ObjectMeta::from(&pod.metadata),
        type_meta: TypeMeta::new(ResourceKind::Pod),
        phase: pod_phase(pod).to_string(),
        node_name: pod.spec.as_ref().and_then(|s| s.node_name.clone()).unwrap_or_default(),
        restart_count: statuses.iter().map(|c| c.restart_count).sum(),
        ready_containers: statuses.iter().filter(|c| c.ready).count() as i32,
        total_containers: pod.spec.as_ref().map(|s| s.containers.len() as i32).unwrap_or(0),
        warnings: warnings.for_pods(&[pod]),
    }
}

pub async fn create_pod_list(
    pods: &[Pod],
    events: &[CoreEvent],
    query: &SelectQuery,
    metrics: Option<&dyn MetricsClient>,
) -> AggregateList<PodSummary> {
    let warnings = WarningIndex::new(events);
    let items = pods.iter().map(|p| pod_summary(p, &warnings)).collect();
    select_list(items, query, metrics).await
}

pub async fn build_pod_list(
    mut channels: ResourceChannels,
    query: &SelectQuery,
    metrics: Option<&dyn MetricsClient>,
) -> Result<AggregateList<PodSummary>, FetchError> {
    let t0 = Instant::now();
    let res = drain_and_build(&mut channels, query, metrics).await;
    observe(ResourceKind::Pod, t0, res)
}

async fn drain_and_build(
    channels: &mut ResourceChannels,
    query: &SelectQuery,
    metrics: Option<&dyn MetricsClient>,
) -> Result<AggregateList<PodSummary>, FetchError> {
    let pods = match read(channels.pods.take(), ResourceKind::Pod, PRIMARY).await? {
        Drained::Items(v) => v,
        Drained::Missing => return Ok(AggregateList::empty()),
    };
    let events = read_items(channels.events.take(), ResourceKind::Event, DEPENDENT).await?;
    Ok(create_pod_list(&pods, &events, query, metrics).await)
}
