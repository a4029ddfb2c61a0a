//! Workload lists: owners joined with the pods they control and the warnings
//! raised about those pods.

use std::time::Instant;

use k8s_openapi::api::apps::v1::{DaemonSet, ReplicaSet, StatefulSet};
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::{Event as CoreEvent, Pod, PodSpec, ReplicationController};
use kube::Resource;
use serde::{Deserialize, Serialize};
use skiff_core::{AggregateList, FetchError, Identity, ObjectMeta, PodInfo, ResourceKind, TypeMeta};
use skiff_dataselect::{meta_property, property, select_list, ComparableValue, DataCell, MetricsClient, SelectQuery};
use skiff_kubehub::{read, read_items, Drained, ListChannel, ResourceChannels};
use tracing::debug;

use crate::owner::correlate;
use crate::status::{assemble, WarningIndex};
use crate::{observe, DEPENDENT, PRIMARY};

/// A kind that owns pods through controller references and declares how many it wants.
pub trait Workload: Resource<DynamicType = ()> + Send + Sync + 'static {
    const KIND: ResourceKind;

    /// Declared replica count; `None` when the object leaves it unset.
    fn desired(&self) -> Option<i32>;

    /// Replica count reported by the controller.
    fn current(&self) -> i32;

    fn pod_spec(&self) -> Option<&PodSpec>;

    /// Take this kind's channel out of the set.
    fn take_channel(channels: &mut ResourceChannels) -> Option<ListChannel<Self>>
    where
        Self: Sized;
}

impl Workload for ReplicaSet {
    const KIND: ResourceKind = ResourceKind::ReplicaSet;
    fn desired(&self) -> Option<i32> { self.spec.as_ref().and_then(|s| s.replicas) }
    fn current(&self) -> i32 { self.status.as_ref().map(|s| s.replicas).unwrap_or(0) }
    fn pod_spec(&self) -> Option<&PodSpec> { self.spec.as_ref()?.template.as_ref()?.spec.as_ref() }
    fn take_channel(channels: &mut ResourceChannels) -> Option<ListChannel<Self>> { channels.replica_sets.take() }
}

impl Workload for ReplicationController {
    const KIND: ResourceKind = ResourceKind::ReplicationController;
    fn desired(&self) -> Option<i32> { self.spec.as_ref().and_then(|s| s.replicas) }
    fn current(&self) -> i32 { self.status.as_ref().map(|s| s.replicas).unwrap_or(0) }
    fn pod_spec(&self) -> Option<&PodSpec> { self.spec.as_ref()?.template.as_ref()?.spec.as_ref() }
    fn take_channel(channels: &mut ResourceChannels) -> Option<ListChannel<Self>> { channels.replication_controllers.take() }
}

impl Workload for StatefulSet {
    const KIND: ResourceKind = ResourceKind::StatefulSet;
    fn desired(&self) -> Option<i32> { self.spec.as_ref().and_then(|s| s.replicas) }
    fn current(&self) -> i32 { self.status.as_ref().map(|s| s.replicas).unwrap_or(0) }
    fn pod_spec(&self) -> Option<&PodSpec> { self.spec.as_ref()?.template.spec.as_ref() }
    fn take_channel(channels: &mut ResourceChannels) -> Option<ListChannel<Self>> { channels.stateful_sets.take() }
}

// Daemon sets have no replica field; the scheduler's counts stand in for it.
impl Workload for DaemonSet {
    const KIND: ResourceKind = ResourceKind::DaemonSet;
    fn desired(&self) -> Option<i32> { self.status.as_ref().map(|s| s.desired_number_scheduled) }
    fn current(&self) -> i32 { self.status.as_ref().map(|s| s.current_number_scheduled).unwrap_or(0) }
    fn pod_spec(&self) -> Option<&PodSpec> { self.spec.as_ref()?.template.spec.as_ref() }
    fn take_channel(channels: &mut ResourceChannels) -> Option<ListChannel<Self>> { channels.daemon_sets.take() }
}

impl Workload for Job {
    const KIND: ResourceKind = ResourceKind::Job;
    fn desired(&self) -> Option<i32> { self.spec.as_ref().and_then(|s| s.completions.or(s.parallelism)) }
    fn current(&self) -> i32 { self.status.as_ref().and_then(|s| s.active).unwrap_or(0) }
    fn pod_spec(&self) -> Option<&PodSpec> { self.spec.as_ref()?.template.spec.as_ref() }
    fn take_channel(channels: &mut ResourceChannels) -> Option<ListChannel<Self>> { channels.jobs.take() }
}

/// Images of the template's containers, in declaration order.
pub fn container_images(spec: Option<&PodSpec>) -> Vec<String> {
    spec.map(|s| s.containers.iter().filter_map(|c| c.image.clone()).collect()).unwrap_or_default()
}

/// One row of a workload list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadSummary {
    pub object_meta: ObjectMeta,
    pub type_meta: TypeMeta,
    pub pods: PodInfo,
    pub container_images: Vec<String>,
}

impl DataCell for WorkloadSummary {
    fn identity(&self) -> Identity { self.object_meta.identity(self.type_meta.kind) }

    fn property(&self, name: &str) -> Option<ComparableValue> {
        match name {
            property::STATUS => Some(self.status().into()),
            _ => meta_property(&self.object_meta, name),
        }
    }
}

impl WorkloadSummary {
    /// Coarse health: `failed` if any owned pod failed, `pending` while pods are
    /// pending or fewer are reported than declared, `running` otherwise.
    pub fn status(&self) -> &'static str {
        let p = &self.pods;
        if p.failed > 0 {
            "failed"
        } else if p.pending > 0 || p.current < p.desired {
            "pending"
        } else {
            "running"
        }
    }
}

/// Build one summary per owner. Owners stay in input order.
pub fn summarize<W: Workload>(owners: &[W], pods: &[Pod], events: &[CoreEvent]) -> Vec<WorkloadSummary> {
    let correlation = correlate(owners, pods);
    let warnings = WarningIndex::new(events);
    debug!(kind = %W::KIND, owners = owners.len(), pods = pods.len(), orphans = correlation.orphans(), "correlated");
    owners
        .iter()
        .zip(correlation.buckets())
        .map(|(owner, owned)| WorkloadSummary {
            object_meta: ObjectMeta::from(owner.meta()),
            type_meta: TypeMeta::new(W::KIND),
            pods: assemble(owner.current(), owner.desired(), owned, &warnings),
            container_images: container_images(owner.pod_spec()),
        })
        .collect()
}

/// Summaries for already-fetched lists, run through `query`.
pub async fn create_workload_list<W: Workload>(
    owners: &[W],
    pods: &[Pod],
    events: &[CoreEvent],
    query: &SelectQuery,
    metrics: Option<&dyn MetricsClient>,
) -> AggregateList<WorkloadSummary> {
    select_list(summarize(owners, pods, events), query, metrics).await
}

/// Drain the owner, pod and event channels and build the list.
///
/// Not-found on the owner list yields an empty list; not-found on pods or
/// events counts as no pods or events. Any other failure is returned as-is and
/// the remaining channels are dropped unread.
pub async fn build_workload_list<W: Workload>(
    mut channels: ResourceChannels,
    query: &SelectQuery,
    metrics: Option<&dyn MetricsClient>,
) -> Result<AggregateList<WorkloadSummary>, FetchError> {
    let t0 = Instant::now();
    let res = drain_and_build::<W>(&mut channels, query, metrics).await;
    observe(W::KIND, t0, res)
}

async fn drain_and_build<W: Workload>(
    channels: &mut ResourceChannels,
    query: &SelectQuery,
    metrics: Option<&dyn MetricsClient>,
) -> Result<AggregateList<WorkloadSummary>, FetchError> {
    let owners = match read(W::take_channel(channels), W::KIND, PRIMARY).await? {
        Drained::Items(v) => v,
        Drained::Missing => return Ok(AggregateList::empty()),
    };
    let pods = read_items(channels.pods.take(), ResourceKind::Pod, DEPENDENT).await?;
    let events = read_items(channels.events.take(), ResourceKind::Event, DEPENDENT).await?;
    Ok(create_workload_list(&owners, &pods, &events, query, metrics).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::apps::v1::{DaemonSetStatus, ReplicaSetSpec, ReplicaSetStatus};
    use k8s_openapi::api::batch::v1::{JobSpec, JobStatus};
    use k8s_openapi::api::core::v1::{Container, PodTemplateSpec};

    #[test]
    fn job_desired_falls_back_to_parallelism() {
        let mut job = Job { spec: Some(JobSpec { parallelism: Some(3), ..Default::default() }), ..Default::default() };
        assert_eq!(job.desired(), Some(3));
        job.spec.as_mut().unwrap().completions = Some(5);
        assert_eq!(job.desired(), Some(5));
        job.status = Some(JobStatus { active: Some(2), ..Default::default() });
        assert_eq!(job.current(), 2);
        assert_eq!(Job::default().desired(), None);
    }

    #[test]
    fn daemon_set_counts_come_from_status() {
        let ds = DaemonSet {
            status: Some(DaemonSetStatus { desired_number_scheduled: 4, current_number_scheduled: 3, ..Default::default() }),
            ..Default::default()
        };
        assert_eq!((ds.desired(), ds.current()), (Some(4), 3));
        assert_eq!(DaemonSet::default().current(), 0);
    }

    #[test]
    fn images_come_from_the_template() {
        let rs = ReplicaSet {
            spec: Some(ReplicaSetSpec {
                replicas: Some(2),
                template: Some(PodTemplateSpec {
                    spec: Some(PodSpec {
                        containers: vec![
                            Container { name: "app".into(), image: Some("nginx:1.25".into()), ..Default::default() },
                            Container { name: "side".into(), image: Some("envoy".into()), ..Default::default() },
                        ],
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            status: Some(ReplicaSetStatus { replicas: 1, ..Default::default() }),
            ..Default::default()
        };
        assert_eq!(container_images(rs.pod_spec()), vec!["nginx:1.25", "envoy"]);
        assert_eq!((rs.desired(), rs.current()), (Some(2), 1));
        assert!(container_images(ReplicaSet::default().pod_spec()).is_empty());
    }

    #[test]
    fn status_property_reflects_pods() {
        let mut s = WorkloadSummary {
            object_meta: ObjectMeta::default(),
            type_meta: TypeMeta::new(ResourceKind::ReplicaSet),
            pods: PodInfo { current: 2, desired: 2, running: 2, ..Default::default() },
            container_images: Vec::new(),
        };
        assert_eq!(s.property(property::STATUS), Some("running".into()));
        s.pods.current = 1;
        assert_eq!(s.status(), "pending");
        s.pods.failed = 1;
        assert_eq!(s.status(), "failed");
    }
}
