//! One-shot list channels. Each pair carries exactly one `Result<Vec<T>, FetchError>`
//! and is consumed at most once.

use k8s_openapi::api::apps::v1::{DaemonSet, ReplicaSet, StatefulSet};
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::{Event, Node, Pod, ReplicationController, Service};
use skiff_core::{FetchError, ResourceKind};
use tokio::sync::oneshot;
use tracing::debug;

pub type ListResult<T> = Result<Vec<T>, FetchError>;

/// Classified result of a single fetch.
#[derive(Debug)]
pub enum FetchOutcome<T> {
    Ok(Vec<T>),
    /// The list (or the kind itself) does not exist. Call sites decide whether
    /// that is an empty list or an error.
    NotFound(FetchError),
    Failed(FetchError),
}

impl<T> From<ListResult<T>> for FetchOutcome<T> {
    fn from(res: ListResult<T>) -> Self {
        match res {
            Ok(items) => FetchOutcome::Ok(items),
            Err(e) if e.is_not_found() => FetchOutcome::NotFound(e),
            Err(e) => FetchOutcome::Failed(e),
        }
    }
}

/// Producer half. Sending consumes it, so a producer can write only once.
pub struct ListSender<T> {
    kind: ResourceKind,
    tx: oneshot::Sender<ListResult<T>>,
}

impl<T> ListSender<T> {
    pub fn kind(&self) -> ResourceKind { self.kind }

    /// Deliver the result. If the aggregation already gave up and dropped its
    /// receiver the result is discarded and the producer is never blocked.
    pub fn send(self, result: ListResult<T>) {
        let kind = self.kind;
        if self.tx.send(result).is_err() {
            debug!(kind = %kind, "list receiver dropped; result discarded");
        }
    }
}

/// Consumer half.
pub struct ListChannel<T> {
    kind: ResourceKind,
    rx: oneshot::Receiver<ListResult<T>>,
}

impl<T> ListChannel<T> {
    pub fn kind(&self) -> ResourceKind { self.kind }

    /// A channel that already holds its result.
    pub fn ready(kind: ResourceKind, result: ListResult<T>) -> Self {
        let (tx, rx) = list_channel(kind);
        tx.send(result);
        rx
    }

    /// Wait for the producer's single write.
    pub async fn recv(self) -> FetchOutcome<T> {
        match self.rx.await {
            Ok(res) => FetchOutcome::from(res),
            Err(_) => FetchOutcome::Failed(FetchError::Closed { kind: self.kind }),
        }
    }
}

pub fn list_channel<T>(kind: ResourceKind) -> (ListSender<T>, ListChannel<T>) {
    let (tx, rx) = oneshot::channel();
    (ListSender { kind, tx }, ListChannel { kind, rx })
}

/// One optional channel per resource kind. An aggregation takes the channels it
/// needs; whatever is left is dropped with the bundle, which releases producers.
#[derive(Default)]
pub struct ResourceChannels {
    pub replica_sets: Option<ListChannel<ReplicaSet>>,
    pub replication_controllers: Option<ListChannel<ReplicationController>>,
    pub stateful_sets: Option<ListChannel<StatefulSet>>,
    pub daemon_sets: Option<ListChannel<DaemonSet>>,
    pub jobs: Option<ListChannel<Job>>,
    pub pods: Option<ListChannel<Pod>>,
    pub nodes: Option<ListChannel<Node>>,
    pub services: Option<ListChannel<Service>>,
    pub events: Option<ListChannel<Event>>,
}

impl ResourceChannels {
    pub fn new() -> Self { Self::default() }

    /// Kinds that currently have a channel attached.
    pub fn wired(&self) -> Vec<ResourceKind> {
        let mut out = Vec::new();
        if self.replica_sets.is_some() { out.push(ResourceKind::ReplicaSet); }
        if self.replication_controllers.is_some() { out.push(ResourceKind::ReplicationController); }
        if self.stateful_sets.is_some() { out.push(ResourceKind::StatefulSet); }
        if self.daemon_sets.is_some() { out.push(ResourceKind::DaemonSet); }
        if self.jobs.is_some() { out.push(ResourceKind::Job); }
        if self.pods.is_some() { out.push(ResourceKind::Pod); }
        if self.nodes.is_some() { out.push(ResourceKind::Node); }
        if self.services.is_some() { out.push(ResourceKind::Service); }
        if self.events.is_some() { out.push(ResourceKind::Event); }
        out
    }

    pub fn with_replica_sets(mut self, res: ListResult<ReplicaSet>) -> Self {
        self.replica_sets = Some(ListChannel::ready(ResourceKind::ReplicaSet, res));
        self
    }

    pub fn with_replication_controllers(mut self, res: ListResult<ReplicationController>) -> Self {
        self.replication_controllers = Some(ListChannel::ready(ResourceKind::ReplicationController, res));
        self
    }

    pub fn with_stateful_sets(mut self, res: ListResult<StatefulSet>) -> Self {
        self.stateful_sets = Some(ListChannel::ready(ResourceKind::StatefulSet, res));
        self
    }

    pub fn with_daemon_sets(mut self, res: ListResult<DaemonSet>) -> Self {
        self.daemon_sets = Some(ListChannel::ready(ResourceKind::DaemonSet, res));
        self
    }

    pub fn with_jobs(mut self, res: ListResult<Job>) -> Self {
        self.jobs = Some(ListChannel::ready(ResourceKind::Job, res));
        self
    }

    pub fn with_pods(mut self, res: ListResult<Pod>) -> Self {
        self.pods = Some(ListChannel::ready(ResourceKind::Pod, res));
        self
    }

    pub fn with_nodes(mut self, res: ListResult<Node>) -> Self {
        self.nodes = Some(ListChannel::ready(ResourceKind::Node, res));
        self
    }

    pub fn with_services(mut self, res: ListResult<Service>) -> Self {
        self.services = Some(ListChannel::ready(ResourceKind::Service, res));
        self
    }

    pub fn with_events(mut self, res: ListResult<Event>) -> Self {
        self.events = Some(ListChannel::ready(ResourceKind::Event, res));
        self
    }
}
