//! Event list.

use std::time::Instant;

use k8s_openapi::api::core::v1::Event as CoreEvent;
use skiff_core::{AggregateList, Event, FetchError, ResourceKind};
use skiff_dataselect::{select_list, MetricsClient, SelectQuery};
use skiff_kubehub::{read, Drained, ResourceChannels};

use crate::status::event_summary;
use crate::{observe, PRIMARY};

pub async fn create_event_list(
    events: &[CoreEvent],
    query: &SelectQuery,
    metrics: Option<&dyn MetricsClient>,
) -> AggregateList<Event> {
    select_list(events.iter().map(event_summary).collect(), query, metrics).await
}

pub async fn build_event_list(
    mut channels: ResourceChannels,
    query: &SelectQuery,
    metrics: Option<&dyn MetricsClient>,
) -> Result<AggregateList<Event>, FetchError> {
    let t0 = Instant::now();
    let res = match read(channels.events.take(), ResourceKind::Event, PRIMARY).await {
        Ok(Drained::Items(events)) => Ok(create_event_list(&events, query, metrics).await),
        Ok(Drained::Missing) => Ok(AggregateList::empty()),
        Err(e) => Err(e),
    };
    observe(ResourceKind::Event, t0, res)
}
