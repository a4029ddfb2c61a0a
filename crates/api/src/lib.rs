//! Skiff public API façade (in-process).
//!
//! Frontends (the CLI today) depend on the [`Aggregator`] trait and the types
//! here. [`InProcAggregator`] fetches from the cluster; [`MockAggregator`]
//! serves canned lists through the same assembly path.

#![forbid(unsafe_code)]

use std::sync::Arc;
use std::time::Instant;

use k8s_openapi::api::apps::v1::{DaemonSet, ReplicaSet, StatefulSet};
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::{Event, Node, Pod, ReplicationController, Service};
use serde::{Deserialize, Serialize};
use skiff_core::{FetchError, ResourceKind, UnknownKind};
use skiff_dataselect::{MetricsClient, QueryError, SelectQuery};
use skiff_kubehub::{spawn_channels, ListResult, NamespaceQuery, ResourceChannels};
use skiff_resource::{build_list, required_kinds};
use tracing::info;

pub use skiff_resource::ResourceList;

/// Runtime configuration read from `SKIFF_*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ApiConfig {
    /// Tracing filter (`SKIFF_LOG`).
    pub log_filter: Option<String>,
    /// Prometheus listener address (`SKIFF_METRICS_ADDR`).
    pub metrics_addr: Option<String>,
    /// Items per page when a request does not say (`SKIFF_PAGE_SIZE`).
    pub default_page_size: Option<i64>,
}

impl ApiConfig {
    pub fn from_env() -> Self { Self::from_lookup(|k| std::env::var(k).ok()) }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            log_filter: lookup("SKIFF_LOG").filter(|s| !s.is_empty()),
            metrics_addr: lookup("SKIFF_METRICS_ADDR").filter(|s| !s.is_empty()),
            default_page_size: lookup("SKIFF_PAGE_SIZE").and_then(|s| s.trim().parse::<i64>().ok()).filter(|n| *n > 0),
        }
    }
}

/// API errors suitable for transport over RPC later.
#[derive(Debug, thiserror::Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum SkiffError {
    #[error("validation: {0}")]
    Validation(String),
    #[error("not_found: {0}")]
    NotFound(String),
    #[error("fetch: {0}")]
    Fetch(String),
    #[error("internal: {0}")]
    Internal(String),
}

pub type SkiffResult<T> = Result<T, SkiffError>;

impl From<FetchError> for SkiffError {
    fn from(e: FetchError) -> Self {
        if e.is_not_found() { SkiffError::NotFound(e.to_string()) } else { SkiffError::Fetch(e.to_string()) }
    }
}

impl From<QueryError> for SkiffError {
    fn from(e: QueryError) -> Self { SkiffError::Validation(e.to_string()) }
}

impl From<UnknownKind> for SkiffError {
    fn from(e: UnknownKind) -> Self { SkiffError::Validation(e.to_string()) }
}

/// One list request: which kind, where, and how to select.
#[derive(Debug, Clone)]
pub struct ListRequest {
    pub kind: ResourceKind,
    pub namespaces: NamespaceQuery,
    pub query: SelectQuery,
}

impl ListRequest {
    pub fn new(kind: ResourceKind) -> Self { Self { kind, namespaces: NamespaceQuery::all(), query: SelectQuery::none() } }

    pub fn in_namespaces(mut self, namespaces: NamespaceQuery) -> Self {
        self.namespaces = namespaces;
        self
    }

    pub fn with_query(mut self, query: SelectQuery) -> Self {
        self.query = query;
        self
    }
}

/// Declarative Skiff API surface.
#[async_trait::async_trait]
pub trait Aggregator: Send + Sync {
    /// Kinds this aggregator can list.
    async fn kinds(&self) -> SkiffResult<Vec<ResourceKind>> { Ok(ResourceKind::ALL.to_vec()) }

    /// Build the selected list for one kind.
    async fn list(&self, req: ListRequest) -> SkiffResult<ResourceList>;

    /// Runtime configuration.
    async fn stats(&self) -> SkiffResult<ApiConfig>;
}

// ----------------- In-process implementation -----------------

/// Fetches from the cluster and assembles in-process.
pub struct InProcAggregator {
    client: kube::Client,
    metrics: Option<Arc<dyn MetricsClient>>,
    config: ApiConfig,
}

impl InProcAggregator {
    pub fn new(client: kube::Client, config: ApiConfig) -> Self { Self { client, metrics: None, config } }

    /// Client from the ambient kubeconfig or in-cluster environment.
    pub async fn try_default(config: ApiConfig) -> SkiffResult<Self> {
        let client = kube::Client::try_default().await.map_err(|e| SkiffError::Internal(e.to_string()))?;
        Ok(Self::new(client, config))
    }

    pub fn with_metrics_client(mut self, client: Arc<dyn MetricsClient>) -> Self {
        self.metrics = Some(client);
        self
    }
}

#[async_trait::async_trait]
impl Aggregator for InProcAggregator {
    async fn list(&self, req: ListRequest) -> SkiffResult<ResourceList> {
        let t0 = Instant::now();
        let ns = if req.namespaces.is_all() { "(all)".to_string() } else { req.namespaces.namespaces().join(",") };
        info!(kind = %req.kind, ns = %ns, "api: list start");
        let channels = spawn_channels(&self.client, &req.namespaces, required_kinds(req.kind));
        let list = build_list(req.kind, channels, &req.query, self.metrics.as_deref()).await?;
        info!(kind = %req.kind, total = list.total_items(), items = list.len(), took_ms = %t0.elapsed().as_millis(), "api: list ok");
        Ok(list)
    }

    async fn stats(&self) -> SkiffResult<ApiConfig> { Ok(self.config.clone()) }
}

// ----------------- Mock implementation -----------------

/// In-memory aggregator for tests. Raw objects go through the real list
/// assembly; kinds in `missing` answer not-found and kinds in `failing` fail
/// with the given message.
#[derive(Default, Clone)]
pub struct MockAggregator {
    pub replica_sets: Vec<ReplicaSet>,
    pub replication_controllers: Vec<ReplicationController>,
    pub stateful_sets: Vec<StatefulSet>,
    pub daemon_sets: Vec<DaemonSet>,
    pub jobs: Vec<Job>,
    pub pods: Vec<Pod>,
    pub nodes: Vec<Node>,
    pub services: Vec<Service>,
    pub events: Vec<Event>,
    pub missing: Vec<ResourceKind>,
    pub failing: Vec<(ResourceKind, String)>,
    pub config: ApiConfig,
}

impl MockAggregator {
    pub fn new() -> Self { Self::default() }

    fn result<T: Clone>(&self, kind: ResourceKind, items: &[T]) -> ListResult<T> {
        if let Some((_, msg)) = self.failing.iter().find(|(k, _)| *k == kind) {
            return Err(FetchError::other(msg));
        }
        if self.missing.contains(&kind) {
            return Err(FetchError::not_found(&format!("{kind} not found")));
        }
        Ok(items.to_vec())
    }

    fn channels(&self, kinds: &[ResourceKind]) -> ResourceChannels {
        kinds.iter().fold(ResourceChannels::new(), |ch, kind| match kind {
            ResourceKind::ReplicaSet => ch.with_replica_sets(self.result(*kind, &self.replica_sets)),
            ResourceKind::ReplicationController => ch.with_replication_controllers(self.result(*kind, &self.replication_controllers)),
            ResourceKind::StatefulSet => ch.with_stateful_sets(self.result(*kind, &self.stateful_sets)),
            ResourceKind::DaemonSet => ch.with_daemon_sets(self.result(*kind, &self.daemon_sets)),
            ResourceKind::Job => ch.with_jobs(self.result(*kind, &self.jobs)),
            ResourceKind::Pod => ch.with_pods(self.result(*kind, &self.pods)),
            ResourceKind::Node => ch.with_nodes(self.result(*kind, &self.nodes)),
            ResourceKind::Service => ch.with_services(self.result(*kind, &self.services)),
            ResourceKind::Event => ch.with_events(self.result(*kind, &self.events)),
        })
    }
}

#[async_trait::async_trait]
impl Aggregator for MockAggregator {
    async fn list(&self, req: ListRequest) -> SkiffResult<ResourceList> {
        let channels = self.channels(required_kinds(req.kind));
        Ok(build_list(req.kind, channels, &req.query, None).await?)
    }

    async fn stats(&self) -> SkiffResult<ApiConfig> { Ok(self.config.clone()) }
}
