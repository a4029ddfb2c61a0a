//! Shape of metric data attached to summaries. Collection itself happens elsewhere.

use serde::{Deserialize, Serialize};

use crate::Identity;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    #[default]
    Sum,
    Min,
    Max,
}

impl Aggregation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Aggregation::Sum => "sum",
            Aggregation::Min => "min",
            Aggregation::Max => "max",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "sum" => Some(Aggregation::Sum),
            "min" => Some(Aggregation::Min),
            "max" => Some(Aggregation::Max),
            _ => None,
        }
    }

    pub fn fold(&self, acc: i64, y: i64) -> i64 {
        match self {
            Aggregation::Sum => acc.saturating_add(y),
            Aggregation::Min => acc.min(y),
            Aggregation::Max => acc.max(y),
        }
    }
}

/// One sample: `x` is a unix timestamp, `y` the value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DataPoint {
    pub x: i64,
    pub y: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Metric {
    pub metric_name: String,
    pub aggregation: Aggregation,
    pub data_points: Vec<DataPoint>,
}

/// Metrics fetched for a single item of a page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemMetrics {
    pub identity: Identity,
    pub metrics: Vec<Metric>,
}
