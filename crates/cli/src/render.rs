//! Human table output for `skiffctl ls`.

use std::fmt::Write;

use chrono::{DateTime, Utc};
use skiff_api::ResourceList;

pub fn render_age(created: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(created) = created else { return "-".to_string() };
    let mut secs = (now - created).num_seconds().max(0) as u64;
    let days = secs / 86_400; secs %= 86_400;
    let hours = secs / 3600; secs %= 3600;
    let mins = secs / 60; secs %= 60;
    if days > 0 { format!("{}d{}h", days, hours) }
    else if hours > 0 { format!("{}h{}m", hours, mins) }
    else if mins > 0 { format!("{}m", mins) }
    else { format!("{}s", secs) }
}

fn ns(n: &Option<String>) -> &str { n.as_deref().unwrap_or("-") }

pub fn table(list: &ResourceList, now: DateTime<Utc>) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = write_table(&mut out, list, now);
    out
}

fn write_table(out: &mut String, list: &ResourceList, now: DateTime<Utc>) -> std::fmt::Result {
    match list {
        ResourceList::Workloads(l) => {
            writeln!(out, "{:<16} {:<28} {:<8} {:<8} {:<7} IMAGES", "NAMESPACE", "NAME", "PODS", "STATUS", "AGE")?;
            for w in &l.items {
                let pods = format!("{}/{}", w.pods.running, w.pods.desired);
                let age = render_age(w.object_meta.creation_timestamp, now);
                writeln!(out, "{:<16} {:<28} {:<8} {:<8} {:<7} {}", ns(&w.object_meta.namespace), w.object_meta.name, pods, w.status(), age, w.container_images.join(","))?;
                for e in &w.pods.warnings {
                    writeln!(out, "  ! {}: {}", e.reason, e.message)?;
                }
            }
        }
        ResourceList::Pods(l) => {
            writeln!(out, "{:<16} {:<36} {:<10} {:<6} {:<8} {:<20} AGE", "NAMESPACE", "NAME", "PHASE", "READY", "RESTARTS", "NODE")?;
            for p in &l.items {
                let ready = format!("{}/{}", p.ready_containers, p.total_containers);
                let age = render_age(p.object_meta.creation_timestamp, now);
                writeln!(out, "{:<16} {:<36} {:<10} {:<6} {:<8} {:<20} {}", ns(&p.object_meta.namespace), p.object_meta.name, p.phase, ready, p.restart_count, p.node_name, age)?;
            }
        }
        ResourceList::Nodes(l) => {
            writeln!(out, "{:<28} {:<8} {:<10} {:<6} AGE", "NAME", "READY", "PODS", "UTIL")?;
            for n in &l.items {
                let ready = if n.unschedulable { format!("{},cordon", n.ready) } else { n.ready.clone() };
                let pods = format!("{}/{}", n.allocated_pods, n.pod_capacity);
                let util = format!("{:.0}%", n.pod_utilization);
                writeln!(out, "{:<28} {:<8} {:<10} {:<6} {}", n.object_meta.name, ready, pods, util, render_age(n.object_meta.creation_timestamp, now))?;
            }
        }
        ResourceList::Services(l) => {
            writeln!(out, "{:<16} {:<28} {:<12} {:<16} {:<20} AGE", "NAMESPACE", "NAME", "TYPE", "CLUSTER-IP", "PORTS")?;
            for s in &l.items {
                let ports: Vec<String> = s.internal_endpoint.ports.iter().map(|p| format!("{}/{}", p.port, p.protocol)).collect();
                let age = render_age(s.object_meta.creation_timestamp, now);
                writeln!(out, "{:<16} {:<28} {:<12} {:<16} {:<20} {}", ns(&s.object_meta.namespace), s.object_meta.name, s.service_type, s.cluster_ip, ports.join(","), age)?;
            }
        }
        ResourceList::Events(l) => {
            writeln!(out, "{:<16} {:<8} {:<8} {:<20} {:<32} MESSAGE", "NAMESPACE", "SEEN", "TYPE", "REASON", "OBJECT")?;
            for e in &l.items {
                let object = format!("{}/{}", e.involved_kind.to_lowercase(), e.involved_name);
                writeln!(out, "{:<16} {:<8} {:<8} {:<20} {:<32} {}", ns(&e.object_meta.namespace), render_age(e.last_seen, now), e.event_type, e.reason, object, e.message)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use skiff_core::{AggregateList, ListMeta, ObjectMeta, PodInfo, ResourceKind, TypeMeta};
    use skiff_resource::WorkloadSummary;

    #[test]
    fn ages() {
        let now = Utc.timestamp_opt(1_000_000, 0).unwrap();
        assert_eq!(render_age(None, now), "-");
        assert_eq!(render_age(Some(now), now), "0s");
        assert_eq!(render_age(Some(Utc.timestamp_opt(1_000_000 - 90_000, 0).unwrap()), now), "1d1h");
        assert_eq!(render_age(Some(Utc.timestamp_opt(1_000_000 - 125, 0).unwrap()), now), "2m");
    }

    #[test]
    fn workload_rows_show_pods_and_warnings() {
        let w = WorkloadSummary {
            object_meta: ObjectMeta { name: "web".into(), namespace: Some("shop".into()), ..Default::default() },
            type_meta: TypeMeta::new(ResourceKind::ReplicaSet),
            pods: PodInfo {
                current: 2,
                desired: 3,
                running: 2,
                warnings: vec![skiff_core::Event { reason: "BackOff".into(), message: "restarting".into(), ..Default::default() }],
                ..Default::default()
            },
            container_images: vec!["nginx".into()],
        };
        let list = ResourceList::Workloads(AggregateList { list_meta: ListMeta { total_items: 1 }, items: vec![w], ..AggregateList::empty() });
        let out = table(&list, Utc::now());
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("2/3") && lines[1].contains("pending") && lines[1].ends_with("nginx"));
        assert_eq!(lines[2], "  ! BackOff: restarting");
    }
}
