//! Status assembly: pod phase counts and warning events for a set of owned pods.

use k8s_openapi::api::core::v1::{Event as CoreEvent, Pod};
use rustc_hash::{FxHashMap, FxHashSet};
use skiff_core::{Event, ObjectMeta, PodInfo, EVENT_TYPE_WARNING};

pub const PHASE_RUNNING: &str = "Running";
pub const PHASE_PENDING: &str = "Pending";
pub const PHASE_FAILED: &str = "Failed";
pub const PHASE_SUCCEEDED: &str = "Succeeded";

/// Reported phase, or `""` when the pod has no status yet.
pub fn pod_phase(pod: &Pod) -> &str { pod.status.as_ref().and_then(|s| s.phase.as_deref()).unwrap_or("") }

/// Replica counts plus owned pods bucketed by phase. Warnings are left empty.
pub fn pod_info(current: i32, desired: Option<i32>, pods: &[&Pod]) -> PodInfo {
    let mut info = PodInfo { current, desired: desired.unwrap_or(0), ..Default::default() };
    for p in pods {
        match pod_phase(p) {
            PHASE_RUNNING => info.running += 1,
            PHASE_PENDING => info.pending += 1,
            PHASE_FAILED => info.failed += 1,
            PHASE_SUCCEEDED => info.succeeded += 1,
            _ => {}
        }
    }
    info
}

/// Project a cluster event into its summary form.
pub fn event_summary(e: &CoreEvent) -> Event {
    Event {
        object_meta: ObjectMeta::from(&e.metadata),
        reason: e.reason.clone().unwrap_or_default(),
        message: e.message.clone().unwrap_or_default(),
        event_type: e.type_.clone().unwrap_or_default(),
        source_component: e.source.as_ref().and_then(|s| s.component.clone()).unwrap_or_default(),
        count: e.count.unwrap_or(0),
        first_seen: e.first_timestamp.as_ref().map(|t| t.0).or_else(|| e.event_time.as_ref().map(|t| t.0)),
        last_seen: e.last_timestamp.as_ref().map(|t| t.0).or_else(|| e.event_time.as_ref().map(|t| t.0)),
        involved_kind: e.involved_object.kind.clone().unwrap_or_default(),
        involved_name: e.involved_object.name.clone().unwrap_or_default(),
    }
}

fn is_warning(e: &CoreEvent) -> bool { e.type_.as_deref() == Some(EVENT_TYPE_WARNING) }

/// Warning events indexed by the uid of the pod they concern.
pub struct WarningIndex<'a> {
    events: &'a [CoreEvent],
    by_pod: FxHashMap<&'a str, Vec<usize>>,
}

impl<'a> WarningIndex<'a> {
    pub fn new(events: &'a [CoreEvent]) -> Self {
        let mut by_pod: FxHashMap<&'a str, Vec<usize>> = FxHashMap::default();
        for (i, e) in events.iter().enumerate() {
            if !is_warning(e) { continue; }
            if let Some(uid) = e.involved_object.uid.as_deref().filter(|u| !u.is_empty()) {
                by_pod.entry(uid).or_default().push(i);
            }
        }
        Self { events, by_pod }
    }

    /// Warnings about any of `pods`, one per distinct event, in event-list
    /// order.
    pub fn for_pods(&self, pods: &[&Pod]) -> Vec<Event> {
        let mut positions: Vec<usize> = pods
            .iter()
            .filter_map(|p| p.metadata.uid.as_deref())
            .filter_map(|uid| self.by_pod.get(uid))
            .flatten()
            .copied()
            .collect();
        positions.sort_unstable();
        positions.dedup();

        let mut seen: FxHashSet<EventKey<'_>> = FxHashSet::default();
        let mut out = Vec::new();
        for i in positions {
            let e = &self.events[i];
            if seen.insert(EventKey::of(e, i)) {
                out.push(event_summary(e));
            }
        }
        out
    }
}

/// Identity of a listed event: its uid, else namespace and name. Events with
/// neither are told apart by list position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum EventKey<'a> {
    Uid(&'a str),
    Name(Option<&'a str>, &'a str),
    Position(usize),
}

impl<'a> EventKey<'a> {
    fn of(e: &'a CoreEvent, position: usize) -> Self {
        let m = &e.metadata;
        if let Some(uid) = m.uid.as_deref().filter(|u| !u.is_empty()) {
            return EventKey::Uid(uid);
        }
        match m.name.as_deref().filter(|n| !n.is_empty()) {
            Some(name) => EventKey::Name(m.namespace.as_deref(), name),
            None => EventKey::Position(position),
        }
    }
}

/// Full pod status of one owner.
pub fn assemble(current: i32, desired: Option<i32>, pods: &[&Pod], warnings: &WarningIndex<'_>) -> PodInfo {
    let mut info = pod_info(current, desired, pods);
    info.warnings = warnings.for_pods(pods);
    info
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::{ObjectReference, PodStatus};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta as KubeMeta;

    fn pod(uid: &str, phase: Option<&str>) -> Pod {
        Pod {
            metadata: KubeMeta { name: Some(format!("pod-{uid}")), uid: Some(uid.into()), ..Default::default() },
            status: phase.map(|p| PodStatus { phase: Some(p.into()), ..Default::default() }),
            ..Default::default()
        }
    }

    fn event(pod_uid: &str, type_: &str, reason: &str, message: &str) -> CoreEvent {
        CoreEvent {
            type_: Some(type_.into()),
            reason: Some(reason.into()),
            message: Some(message.into()),
            involved_object: ObjectReference { kind: Some("Pod".into()), uid: Some(pod_uid.into()), ..Default::default() },
            ..Default::default()
        }
    }

    fn with_uid(mut e: CoreEvent, uid: &str) -> CoreEvent {
        e.metadata.uid = Some(uid.into());
        e
    }

    #[test]
    fn phases_are_counted() {
        let pods = [pod("a", Some("Running")), pod("b", Some("Running")), pod("c", Some("Failed")), pod("d", None), pod("e", Some("Succeeded")), pod("f", Some("Pending"))];
        let refs: Vec<&Pod> = pods.iter().collect();
        let info = pod_info(6, Some(8), &refs);
        assert_eq!((info.current, info.desired), (6, 8));
        assert_eq!((info.running, info.pending, info.failed, info.succeeded), (2, 1, 1, 1));
    }

    #[test]
    fn unset_desired_is_zero() {
        assert_eq!(pod_info(3, None, &[]).desired, 0);
    }

    #[test]
    fn warnings_dedup_and_keep_event_order() {
        let pods = [pod("a", Some("Failed")), pod("b", Some("Running"))];
        let events = vec![
            with_uid(event("b", "Warning", "BackOff", "restarting"), "e1"),
            with_uid(event("a", "Normal", "Pulled", "ok"), "e2"),
            with_uid(event("a", "Warning", "FailedMount", "no volume"), "e3"),
            with_uid(event("b", "Warning", "BackOff", "restarting"), "e1"),
            with_uid(event("zzz", "Warning", "Evicted", "not ours"), "e4"),
        ];
        let idx = WarningIndex::new(&events);
        let w = idx.for_pods(&[&pods[1], &pods[0]]);
        let reasons: Vec<&str> = w.iter().map(|e| e.reason.as_str()).collect();
        assert_eq!(reasons, vec!["BackOff", "FailedMount"]);
        assert!(w.iter().all(Event::is_warning));
        assert!(idx.for_pods(&[]).is_empty());
    }

    #[test]
    fn distinct_events_with_the_same_text_are_kept() {
        let pods = [pod("a", Some("Running")), pod("b", Some("Running"))];
        let events = vec![
            with_uid(event("a", "Warning", "BackOff", "restarting"), "e1"),
            with_uid(event("b", "Warning", "BackOff", "restarting"), "e2"),
        ];
        let w = WarningIndex::new(&events).for_pods(&[&pods[0], &pods[1]]);
        let uids: Vec<&str> = w.iter().map(|e| e.object_meta.uid.as_str()).collect();
        assert_eq!(uids, vec!["e1", "e2"]);
    }

    #[test]
    fn events_without_uid_dedup_by_name() {
        let pods = [pod("a", Some("Running"))];
        let mut named = event("a", "Warning", "BackOff", "restarting");
        named.metadata.namespace = Some("ns".into());
        named.metadata.name = Some("a.1".into());
        let anonymous = event("a", "Warning", "BackOff", "restarting");
        let events = vec![named.clone(), anonymous.clone(), named, anonymous];
        let w = WarningIndex::new(&events).for_pods(&[&pods[0]]);
        let names: Vec<&str> = w.iter().map(|e| e.object_meta.name.as_str()).collect();
        assert_eq!(names, vec!["a.1", "", ""]);
    }

    #[test]
    fn summary_projects_fields() {
        let mut e = event("a", "Warning", "BackOff", "restarting");
        e.count = Some(5);
        e.involved_object.name = Some("pod-a".into());
        let s = event_summary(&e);
        assert_eq!(s.count, 5);
        assert_eq!(s.involved_kind, "Pod");
        assert_eq!(s.involved_name, "pod-a");
        assert_eq!(s.first_seen, None);
    }
}
