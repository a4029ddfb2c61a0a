//! Channel reader: wait for one list and apply the call site's not-found policy.

use skiff_core::{FetchError, ResourceKind};
use tracing::{debug, warn};

use crate::channel::{FetchOutcome, ListChannel};

/// What a call site does when its list comes back `NotFound`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissPolicy {
    /// Not-found is a hard failure like any other error.
    Fail,
    /// Treat the list as empty and keep aggregating.
    EmptyList,
    /// Stop here; the whole aggregation is an empty list.
    EmptyResult,
}

/// Result of draining one channel.
#[derive(Debug)]
pub enum Drained<T> {
    Items(Vec<T>),
    /// Soft miss under [`MissPolicy::EmptyResult`].
    Missing,
}

impl<T> Drained<T> {
    /// Items, with `Missing` flattened to an empty list.
    pub fn into_items(self) -> Vec<T> {
        match self {
            Drained::Items(v) => v,
            Drained::Missing => Vec::new(),
        }
    }
}

/// Wait for `channel` and classify its result. A channel that was never wired
/// is a hard failure regardless of policy.
pub async fn read<T>(channel: Option<ListChannel<T>>, kind: ResourceKind, policy: MissPolicy) -> Result<Drained<T>, FetchError> {
    let channel = channel.ok_or(FetchError::Unwired { kind })?;
    match channel.recv().await {
        FetchOutcome::Ok(items) => {
            debug!(kind = %kind, items = items.len(), "list received");
            Ok(Drained::Items(items))
        }
        FetchOutcome::NotFound(e) => match policy {
            MissPolicy::Fail => {
                warn!(kind = %kind, error = %e, "list not found");
                Err(e)
            }
            MissPolicy::EmptyList => {
                debug!(kind = %kind, "list not found; continuing with an empty list");
                metrics::counter!("aggregate_soft_miss_total", 1, "kind" => kind.as_str());
                Ok(Drained::Items(Vec::new()))
            }
            MissPolicy::EmptyResult => {
                debug!(kind = %kind, "list not found; aggregation yields an empty result");
                metrics::counter!("aggregate_soft_miss_total", 1, "kind" => kind.as_str());
                Ok(Drained::Missing)
            }
        },
        FetchOutcome::Failed(e) => {
            warn!(kind = %kind, error = %e, "list fetch failed");
            Err(e)
        }
    }
}

/// Like [`read`] for policies that never short-circuit.
pub async fn read_items<T>(channel: Option<ListChannel<T>>, kind: ResourceKind, policy: MissPolicy) -> Result<Vec<T>, FetchError> {
    read(channel, kind, policy).await.map(Drained::into_items)
}
