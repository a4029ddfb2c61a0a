//! Service list.

use std::collections::BTreeMap;
use std::time::Instant;

use k8s_openapi::api::core::v1::Service;
use serde::{Deserialize, Serialize};
use skiff_core::{AggregateList, FetchError, Identity, ObjectMeta, ResourceKind, TypeMeta};
use skiff_dataselect::{meta_property, property, select_list, ComparableValue, DataCell, MetricsClient, SelectQuery};
use skiff_kubehub::{read, Drained, ResourceChannels};

use crate::{observe, PRIMARY};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ServicePort {
    pub port: i32,
    pub protocol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_port: Option<i32>,
}

/// In-cluster address of a service: `name.namespace` plus its ports.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Endpoint {
    pub host: String,
    pub ports: Vec<ServicePort>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSummary {
    pub object_meta: ObjectMeta,
    pub type_meta: TypeMeta,
    #[serde(rename = "type")]
    pub service_type: String,
    pub cluster_ip: String,
    pub internal_endpoint: Endpoint,
    pub selector: BTreeMap<String, String>,
}

impl DataCell for ServiceSummary {
    fn identity(&self) -> Identity { self.object_meta.identity(ResourceKind::Service) }

    fn property(&self, name: &str) -> Option<ComparableValue> {
        match name {
            property::TYPE => Some(self.service_type.as_str().into()),
            _ => meta_property(&self.object_meta, name),
        }
    }
}

fn internal_endpoint(svc: &Service) -> Endpoint {
    let name = svc.metadata.name.as_deref().unwrap_or("");
    let host = match svc.metadata.namespace.as_deref() {
        Some(ns) if !ns.is_empty() => format!("{name}.{ns}"),
        _ => name.to_string(),
    };
    let ports = svc
        .spec
        .as_ref()
        .and_then(|s| s.ports.as_ref())
        .map(|ps| {
            ps.iter()
                .map(|p| ServicePort {
                    port: p.port,
                    protocol: p.protocol.clone().unwrap_or_else(|| "TCP".to_string()),
                    node_port: p.node_port,
                })
                .collect()
        })
        .unwrap_or_default();
    Endpoint { host, ports }
}

pub fn service_summary(svc: &Service) -> ServiceSummary {
    let spec = svc.spec.as_ref();
    ServiceSummary {
        object_meta: ObjectMeta::from(&svc.metadata),
        type_meta: TypeMeta::new(ResourceKind::Service),
        service_type: spec.and_then(|s| s.type_.clone()).unwrap_or_else(|| "ClusterIP".to_string()),
        cluster_ip: spec.and_then(|s| s.cluster_ip.clone()).unwrap_or_default(),
        internal_endpoint: internal_endpoint(svc),
        selector: spec.and_then(|s| s.selector.clone()).unwrap_or_default(),
    }
}

pub async fn create_service_list(
    services: &[Service],
    query: &SelectQuery,
    metrics: Option<&dyn MetricsClient>,
) -> AggregateList<ServiceSummary> {
    select_list(services.iter().map(service_summary).collect(), query, metrics).await
}

pub async fn build_service_list(
    mut channels: ResourceChannels,
    query: &SelectQuery,
    metrics: Option<&dyn MetricsClient>,
) -> Result<AggregateList<ServiceSummary>, FetchError> {
    let t0 = Instant::now();
    let res = match read(channels.services.take(), ResourceKind::Service, PRIMARY).await {
        Ok(Drained::Items(services)) => Ok(create_service_list(&services, query, metrics).await),
        Ok(Drained::Missing) => Ok(AggregateList::empty()),
        Err(e) => Err(e),
    };
    observe(ResourceKind::Service, t0, res)
}
