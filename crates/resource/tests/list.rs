use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use k8s_openapi::api::apps::v1::{ReplicaSet, ReplicaSetSpec, ReplicaSetStatus};
use k8s_openapi::api::core::v1::{Event as CoreEvent, ObjectReference, Pod, PodStatus};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta as KubeMeta, OwnerReference, Time};
use skiff_core::{AggregateList, FetchError, ObjectMeta, PodInfo, ResourceKind, TypeMeta};
use skiff_dataselect::SelectQuery;
use skiff_kubehub::{list_channel, ResourceChannels};
use skiff_resource::{build_list, build_workload_list, create_workload_list, ResourceList, WorkloadSummary};

fn rs(name: &str, ns: &str, uid: &str, desired: i32, current: i32) -> ReplicaSet {
    ReplicaSet {
        metadata: KubeMeta {
            name: Some(name.into()),
            namespace: Some(ns.into()),
            uid: Some(uid.into()),
            labels: Some(BTreeMap::from([("key".to_string(), "value".to_string())])),
            creation_timestamp: Some(Time(Utc.timestamp_opt(111, 222).unwrap())),
            ..Default::default()
        },
        spec: Some(ReplicaSetSpec { replicas: Some(desired), ..Default::default() }),
        status: Some(ReplicaSetStatus { replicas: current, ..Default::default() }),
    }
}

fn pod(ns: &str, uid: &str, owner: &str, owner_uid: &str, phase: &str) -> Pod {
    Pod {
        metadata: KubeMeta {
            namespace: Some(ns.into()),
            uid: Some(uid.into()),
            owner_references: Some(vec![OwnerReference {
                name: owner.into(),
                uid: owner_uid.into(),
                controller: Some(true),
                ..Default::default()
            }]),
            ..Default::default()
        },
        status: Some(PodStatus { phase: Some(phase.into()), ..Default::default() }),
        ..Default::default()
    }
}

fn warning(pod_uid: &str, reason: &str, message: &str) -> CoreEvent {
    CoreEvent {
        metadata: KubeMeta { uid: Some(format!("{pod_uid}-{reason}")), ..Default::default() },
        type_: Some("Warning".into()),
        reason: Some(reason.into()),
        message: Some(message.into()),
        involved_object: ObjectReference { uid: Some(pod_uid.into()), ..Default::default() },
        ..Default::default()
    }
}

fn channels(rs: Result<Vec<ReplicaSet>, FetchError>, pods: Vec<Pod>) -> ResourceChannels {
    ResourceChannels::new()
        .with_replica_sets(rs)
        .with_pods(Ok(pods))
        .with_events(Ok(Vec::new()))
        .with_nodes(Ok(Vec::new()))
        .with_services(Ok(Vec::new()))
}

async fn build(ch: ResourceChannels) -> Result<AggregateList<WorkloadSummary>, FetchError> {
    build_workload_list::<ReplicaSet>(ch, &SelectQuery::none(), None).await
}

#[tokio::test]
async fn empty_lists_give_an_empty_result() {
    let list = build(channels(Ok(Vec::new()), Vec::new())).await.unwrap();
    assert_eq!(list.total_items(), 0);
    assert!(list.items.is_empty());
    assert!(list.cumulative_metrics.is_empty());
}

#[tokio::test]
async fn custom_error_is_returned_verbatim() {
    let err = build(channels(Err(FetchError::other("MyCustomError")), Vec::new())).await.unwrap_err();
    assert_eq!(err.to_string(), "MyCustomError");
}

#[tokio::test]
async fn status_errors_other_than_not_found_are_hard() {
    for reason in ["", "foo-bar", "Forbidden"] {
        let err = build(channels(Err(FetchError::status(reason, "", 0)), Vec::new())).await.unwrap_err();
        assert!(matches!(err, FetchError::Status(ref s) if s.reason == reason), "reason {reason:?}");
    }
}

#[tokio::test]
async fn not_found_primary_is_an_empty_list() {
    let list = build(channels(Err(FetchError::not_found("replicasets not found")), Vec::new())).await.unwrap();
    assert_eq!(list, AggregateList::empty());
}

#[tokio::test]
async fn not_found_pods_count_as_no_pods() {
    let ch = ResourceChannels::new()
        .with_replica_sets(Ok(vec![rs("rs-name", "rs-namespace", "uid", 3, 3)]))
        .with_pods(Err(FetchError::not_found("pods")))
        .with_events(Err(FetchError::not_found("events")));
    let list = build(ch).await.unwrap();
    assert_eq!(list.total_items(), 1);
    assert_eq!(list.items[0].pods.failed, 0);
}

#[tokio::test]
async fn owned_pods_are_counted_and_strangers_ignored() {
    let pods = vec![
        pod("rs-namespace", "p1", "rs-name", "uid", "Failed"),
        pod("rs-namespace", "p2", "rs-name-wrong", "uid-wrong", "Failed"),
    ];
    let list = build(channels(Ok(vec![rs("rs-name", "rs-namespace", "uid", 21, 7)]), pods)).await.unwrap();

    assert_eq!(list.total_items(), 1);
    let expected = WorkloadSummary {
        object_meta: ObjectMeta {
            name: "rs-name".into(),
            namespace: Some("rs-namespace".into()),
            uid: "uid".into(),
            labels: BTreeMap::from([("key".to_string(), "value".to_string())]),
            annotations: BTreeMap::new(),
            creation_timestamp: Some(Utc.timestamp_opt(111, 222).unwrap()),
        },
        type_meta: TypeMeta::new(ResourceKind::ReplicaSet),
        pods: PodInfo { current: 7, desired: 21, failed: 1, ..Default::default() },
        container_images: Vec::new(),
    };
    assert_eq!(list.items, vec![expected]);
}

#[tokio::test]
async fn create_list_without_pods_has_zeroed_status() {
    let mut owner = rs("replica-set", "ns-1", "", 0, 0);
    owner.status = None;
    let list = create_workload_list(&[owner], &[], &[], &SelectQuery::none(), None).await;
    assert_eq!(list.total_items(), 1);
    assert_eq!(list.items[0].pods, PodInfo::default());
    assert_eq!(list.items[0].object_meta.name, "replica-set");
}

#[tokio::test]
async fn warnings_cover_all_owned_pods() {
    let pods = vec![pod("ns", "p1", "a", "ua", "Running"), pod("ns", "p2", "a", "ua", "Pending"), pod("ns", "p3", "b", "ub", "Running")];
    let events = vec![
        warning("p2", "FailedScheduling", "no nodes"),
        warning("p1", "BackOff", "restarting"),
        warning("p2", "FailedScheduling", "no nodes"),
        warning("p3", "Unhealthy", "probe failed"),
    ];
    let owners = vec![rs("a", "ns", "ua", 2, 2), rs("b", "ns", "ub", 1, 1)];
    let list = create_workload_list(&owners, &pods, &events, &SelectQuery::none(), None).await;

    let reasons: Vec<Vec<&str>> = list.items.iter().map(|w| w.pods.warnings.iter().map(|e| e.reason.as_str()).collect()).collect();
    assert_eq!(reasons, vec![vec!["FailedScheduling", "BackOff"], vec!["Unhealthy"]]);
    assert_eq!((list.items[0].pods.running, list.items[0].pods.pending), (1, 1));
}

#[tokio::test]
async fn dispatch_builds_the_requested_kind() {
    let ch = channels(Ok(vec![rs("a", "ns", "ua", 1, 1)]), Vec::new());
    let list = build_list(ResourceKind::ReplicaSet, ch, &SelectQuery::none(), None).await.unwrap();
    assert!(matches!(list, ResourceList::Workloads(ref l) if l.items.len() == 1));

    let ch = ResourceChannels::new().with_services(Ok(Vec::new()));
    let list = build_list(ResourceKind::Service, ch, &SelectQuery::none(), None).await.unwrap();
    assert!(matches!(list, ResourceList::Services(_)));
    assert!(list.is_empty());
}

#[tokio::test]
async fn unwired_dependent_channel_is_a_failure() {
    let ch = ResourceChannels::new().with_replica_sets(Ok(Vec::new()));
    let err = build(ch).await.unwrap_err();
    assert!(matches!(err, FetchError::Unwired { kind: ResourceKind::Pod }));
}

#[tokio::test]
async fn early_failure_releases_pending_producers() {
    let (pods_tx, pods_rx) = list_channel::<Pod>(ResourceKind::Pod);
    let (events_tx, events_rx) = list_channel::<CoreEvent>(ResourceKind::Event);
    let producers = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        pods_tx.send(Ok(Vec::new()));
        events_tx.send(Ok(Vec::new()));
    });
    let ch = ResourceChannels {
        replica_sets: Some(skiff_kubehub::ListChannel::ready(ResourceKind::ReplicaSet, Err(FetchError::other("boom")))),
        pods: Some(pods_rx),
        events: Some(events_rx),
        ..Default::default()
    };
    assert!(build(ch).await.is_err());
    tokio::time::timeout(Duration::from_secs(1), producers).await.unwrap().unwrap();
}
