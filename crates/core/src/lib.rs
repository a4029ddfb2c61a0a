//! Skiff core types shared by the fetch layer, the aggregators and the API façade.
//!
//! Everything here is UI-facing: summaries are built once per aggregation pass
//! and handed to the caller, who owns them afterwards.

#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod error;
pub mod metric;

pub use error::FetchError;
pub use metric::{Aggregation, DataPoint, ItemMetrics, Metric};

pub mod prelude {
    pub use super::{
        AggregateList, Event, FetchError, Identity, ListMeta, Metric, ObjectMeta, PodInfo, ResourceKind, TypeMeta,
    };
}

/// Resource kinds the aggregation layer knows how to list.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    ReplicaSet,
    ReplicationController,
    StatefulSet,
    DaemonSet,
    Job,
    Pod,
    Node,
    Service,
    Event,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 9] = [
        ResourceKind::ReplicaSet,
        ResourceKind::ReplicationController,
        ResourceKind::StatefulSet,
        ResourceKind::DaemonSet,
        ResourceKind::Job,
        ResourceKind::Pod,
        ResourceKind::Node,
        ResourceKind::Service,
        ResourceKind::Event,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::ReplicaSet => "replicaset",
            ResourceKind::ReplicationController => "replicationcontroller",
            ResourceKind::StatefulSet => "statefulset",
            ResourceKind::DaemonSet => "daemonset",
            ResourceKind::Job => "job",
            ResourceKind::Pod => "pod",
            ResourceKind::Node => "node",
            ResourceKind::Service => "service",
            ResourceKind::Event => "event",
        }
    }

    /// Workload kinds own pods through controller references.
    pub fn is_workload(&self) -> bool {
        matches!(
            self,
            ResourceKind::ReplicaSet
                | ResourceKind::ReplicationController
                | ResourceKind::StatefulSet
                | ResourceKind::DaemonSet
                | ResourceKind::Job
        )
    }

    pub fn namespaced(&self) -> bool { !matches!(self, ResourceKind::Node) }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown resource kind: {0}")]
pub struct UnknownKind(pub String);

impl FromStr for ResourceKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        let kind = match lower.as_str() {
            "replicaset" | "replicasets" | "rs" => ResourceKind::ReplicaSet,
            "replicationcontroller" | "replicationcontrollers" | "rc" => ResourceKind::ReplicationController,
            "statefulset" | "statefulsets" | "sts" => ResourceKind::StatefulSet,
            "daemonset" | "daemonsets" | "ds" => ResourceKind::DaemonSet,
            "job" | "jobs" => ResourceKind::Job,
            "pod" | "pods" | "po" => ResourceKind::Pod,
            "node" | "nodes" | "no" => ResourceKind::Node,
            "service" | "services" | "svc" => ResourceKind::Service,
            "event" | "events" | "ev" => ResourceKind::Event,
            _ => return Err(UnknownKind(s.to_string())),
        };
        Ok(kind)
    }
}

/// Identity of a summary: enough to address it in the cluster or in a metrics backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Identity {
    pub kind: Option<ResourceKind>,
    pub namespace: Option<String>,
    pub name: String,
    pub uid: String,
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{}/{}", ns, self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Stable identity fields of a summary object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub uid: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<DateTime<Utc>>,
}

impl ObjectMeta {
    pub fn identity(&self, kind: ResourceKind) -> Identity {
        Identity { kind: Some(kind), namespace: self.namespace.clone(), name: self.name.clone(), uid: self.uid.clone() }
    }
}

impl From<&kube::core::ObjectMeta> for ObjectMeta {
    fn from(m: &kube::core::ObjectMeta) -> Self {
        Self {
            name: m.name.clone().unwrap_or_default(),
            namespace: m.namespace.clone(),
            uid: m.uid.clone().unwrap_or_default(),
            labels: m.labels.clone().unwrap_or_default(),
            annotations: m.annotations.clone().unwrap_or_default(),
            creation_timestamp: m.creation_timestamp.as_ref().map(|t| t.0),
        }
    }
}

/// Normalized kind tag carried by every summary.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TypeMeta {
    pub kind: ResourceKind,
}

impl TypeMeta {
    pub fn new(kind: ResourceKind) -> Self { Self { kind } }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ListMeta {
    /// Item count after filtering and before pagination.
    pub total_items: usize,
}

/// Projection of a cluster event as shown next to the objects it concerns.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub object_meta: ObjectMeta,
    pub reason: String,
    pub message: String,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub source_component: String,
    pub count: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_seen: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub involved_kind: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub involved_name: String,
}

pub const EVENT_TYPE_WARNING: &str = "Warning";

impl Event {
    pub fn is_warning(&self) -> bool { self.event_type == EVENT_TYPE_WARNING }
}

/// Pod status of a workload: declared vs. reported replicas and owned pods by phase.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PodInfo {
    pub current: i32,
    pub desired: i32,
    pub running: i32,
    pub pending: i32,
    pub failed: i32,
    pub succeeded: i32,
    pub warnings: Vec<Event>,
}

/// A page of summaries plus list-level metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AggregateList<T> {
    pub list_meta: ListMeta,
    pub cumulative_metrics: Vec<Metric>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub item_metrics: Vec<ItemMetrics>,
    pub items: Vec<T>,
}

impl<T> AggregateList<T> {
    pub fn empty() -> Self {
        Self { list_meta: ListMeta::default(), cumulative_metrics: Vec::new(), item_metrics: Vec::new(), items: Vec::new() }
    }

    pub fn total_items(&self) -> usize { self.list_meta.total_items }
}

impl<T> Default for AggregateList<T> {
    fn default() -> Self { Self::empty() }
}
