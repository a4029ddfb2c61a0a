//! Capabilities a summary exposes to the selection pipeline.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use skiff_core::{Event, Identity, ObjectMeta, ResourceKind};

/// Property names understood by the built-in summaries.
pub mod property {
    pub const NAME: &str = "name";
    pub const NAMESPACE: &str = "namespace";
    pub const CREATION_TIMESTAMP: &str = "creationTimestamp";
    pub const STATUS: &str = "status";
    pub const TYPE: &str = "type";
    pub const REASON: &str = "reason";
    pub const COUNT: &str = "count";
    pub const FIRST_SEEN: &str = "firstSeen";
    pub const LAST_SEEN: &str = "lastSeen";
    pub const NODE: &str = "node";
    pub const RESTARTS: &str = "restarts";
}

/// A sortable, filterable property value. Values of different variants order
/// by variant (text < int < time).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum ComparableValue {
    Text(String),
    Int(i64),
    Time(DateTime<Utc>),
}

impl ComparableValue {
    /// String form used for filtering.
    pub fn render(&self) -> String {
        match self {
            ComparableValue::Text(s) => s.clone(),
            ComparableValue::Int(i) => i.to_string(),
            ComparableValue::Time(t) => t.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

impl fmt::Display for ComparableValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.render()) }
}

impl From<&str> for ComparableValue {
    fn from(s: &str) -> Self { ComparableValue::Text(s.to_string()) }
}

impl From<String> for ComparableValue {
    fn from(s: String) -> Self { ComparableValue::Text(s) }
}

impl From<i64> for ComparableValue {
    fn from(i: i64) -> Self { ComparableValue::Int(i) }
}

impl From<i32> for ComparableValue {
    fn from(i: i32) -> Self { ComparableValue::Int(i as i64) }
}

impl From<DateTime<Utc>> for ComparableValue {
    fn from(t: DateTime<Utc>) -> Self { ComparableValue::Time(t) }
}

/// Anything the pipeline can select over.
pub trait DataCell {
    fn identity(&self) -> Identity;

    /// Value of `name`, or `None` when this kind has no such property.
    fn property(&self, name: &str) -> Option<ComparableValue>;
}

/// Properties every summary shares through its metadata.
pub fn meta_property(meta: &ObjectMeta, name: &str) -> Option<ComparableValue> {
    match name {
        property::NAME => Some(meta.name.as_str().into()),
        property::NAMESPACE => meta.namespace.as_deref().map(Into::into),
        property::CREATION_TIMESTAMP => meta.creation_timestamp.map(Into::into),
        _ => None,
    }
}

impl DataCell for Event {
    fn identity(&self) -> Identity { self.object_meta.identity(ResourceKind::Event) }

    fn property(&self, name: &str) -> Option<ComparableValue> {
        match name {
            property::REASON => Some(self.reason.as_str().into()),
            property::TYPE => Some(self.event_type.as_str().into()),
            property::COUNT => Some(self.count.into()),
            property::FIRST_SEEN => self.first_seen.map(Into::into),
            property::LAST_SEEN => self.last_seen.map(Into::into),
            _ => meta_property(&self.object_meta, name),
        }
    }
}
