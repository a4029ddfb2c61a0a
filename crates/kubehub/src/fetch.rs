//! kube-rs producers: one spawned list per resource kind, each writing its
//! channel exactly once.

use std::fmt::Debug;
use std::time::Instant;

use k8s_openapi::api::apps::v1::{DaemonSet, ReplicaSet, StatefulSet};
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::{Event, Node, Pod, ReplicationController, Service};
use k8s_openapi::NamespaceResourceScope;
use kube::api::{Api, ListParams};
use kube::{Client, Resource, ResourceExt};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use skiff_core::{FetchError, ResourceKind};
use tracing::{debug, warn};

use crate::channel::{list_channel, ListChannel, ResourceChannels};

/// Namespaces a fetch is scoped to. Empty means all namespaces.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceQuery {
    namespaces: Vec<String>,
}

impl NamespaceQuery {
    pub fn all() -> Self { Self::default() }

    pub fn new<I, S>(namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut namespaces: Vec<String> = namespaces.into_iter().map(Into::into).filter(|s| !s.is_empty()).collect();
        namespaces.sort();
        namespaces.dedup();
        Self { namespaces }
    }

    pub fn namespaces(&self) -> &[String] { &self.namespaces }

    pub fn is_all(&self) -> bool { self.namespaces.is_empty() }

    /// The namespace to list from when exactly one is requested.
    pub fn single(&self) -> Option<&str> {
        match self.namespaces.as_slice() {
            [ns] => Some(ns.as_str()),
            _ => None,
        }
    }

    /// Cluster-scoped objects (no namespace) always match.
    pub fn matches(&self, namespace: Option<&str>) -> bool {
        match namespace {
            None => true,
            Some(ns) => self.is_all() || self.namespaces.iter().any(|n| n == ns),
        }
    }
}

fn finish<K>(kind: ResourceKind, started: Instant, res: kube::Result<Vec<K>>) -> Result<Vec<K>, FetchError> {
    let took_ms = started.elapsed().as_millis();
    match res {
        Ok(items) => {
            debug!(kind = %kind, items = items.len(), took_ms = %took_ms, "fetch: list ok");
            metrics::histogram!("fetch_list_ms", started.elapsed().as_secs_f64() * 1_000.0, "kind" => kind.as_str());
            Ok(items)
        }
        Err(e) => {
            warn!(kind = %kind, error = %e, took_ms = %took_ms, "fetch: list failed");
            Err(FetchError::from(e))
        }
    }
}

/// Spawn a list of a namespaced kind. Several namespaces list cluster-wide and
/// filter locally.
pub fn spawn_namespaced<K>(client: Client, namespaces: &NamespaceQuery, kind: ResourceKind) -> ListChannel<K>
where
    K: Resource<Scope = NamespaceResourceScope, DynamicType = ()> + Clone + DeserializeOwned + Debug + Send + Sync + 'static,
{
    let (tx, rx) = list_channel(kind);
    let nsq = namespaces.clone();
    tokio::spawn(async move {
        let started = Instant::now();
        let api: Api<K> = match nsq.single() {
            Some(ns) => Api::namespaced(client, ns),
            None => Api::all(client),
        };
        let res = api
            .list(&ListParams::default())
            .await
            .map(|list| list.items.into_iter().filter(|o| nsq.matches(o.namespace().as_deref())).collect());
        tx.send(finish(kind, started, res));
    });
    rx
}

/// Spawn a list of a cluster-scoped kind.
pub fn spawn_cluster<K>(client: Client, kind: ResourceKind) -> ListChannel<K>
where
    K: Resource<DynamicType = ()> + Clone + DeserializeOwned + Debug + Send + Sync + 'static,
{
    let (tx, rx) = list_channel(kind);
    tokio::spawn(async move {
        let started = Instant::now();
        let api: Api<K> = Api::all(client);
        let res = api.list(&ListParams::default()).await.map(|list| list.items);
        tx.send(finish(kind, started, res));
    });
    rx
}

/// Start one fetch per requested kind and bundle the channels.
pub fn spawn_channels(client: &Client, namespaces: &NamespaceQuery, kinds: &[ResourceKind]) -> ResourceChannels {
    let mut ch = ResourceChannels::new();
    for kind in kinds {
        let c = client.clone();
        match kind {
            ResourceKind::ReplicaSet => ch.replica_sets = Some(spawn_namespaced::<ReplicaSet>(c, namespaces, *kind)),
            ResourceKind::ReplicationController => {
                ch.replication_controllers = Some(spawn_namespaced::<ReplicationController>(c, namespaces, *kind))
            }
            ResourceKind::StatefulSet => ch.stateful_sets = Some(spawn_namespaced::<StatefulSet>(c, namespaces, *kind)),
            ResourceKind::DaemonSet => ch.daemon_sets = Some(spawn_namespaced::<DaemonSet>(c, namespaces, *kind)),
            ResourceKind::Job => ch.jobs = Some(spawn_namespaced::<Job>(c, namespaces, *kind)),
            ResourceKind::Pod => ch.pods = Some(spawn_namespaced::<Pod>(c, namespaces, *kind)),
            ResourceKind::Service => ch.services = Some(spawn_namespaced::<Service>(c, namespaces, *kind)),
            ResourceKind::Event => ch.events = Some(spawn_namespaced::<Event>(c, namespaces, *kind)),
            ResourceKind::Node => ch.nodes = Some(spawn_cluster::<Node>(c, *kind)),
        }
    }
    ch
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespace_query_normalizes() {
        let q = NamespaceQuery::new(["b", "", "a", "b"]);
        assert_eq!(q.namespaces(), &["a".to_string(), "b".to_string()]);
        assert_eq!(q.single(), None);
        assert!(q.matches(Some("a")));
        assert!(!q.matches(Some("c")));
        assert!(q.matches(None));
    }

    #[test]
    fn all_and_single() {
        assert!(NamespaceQuery::all().is_all());
        assert!(NamespaceQuery::all().matches(Some("anything")));
        assert_eq!(NamespaceQuery::new(["prod"]).single(), Some("prod"));
    }
}
