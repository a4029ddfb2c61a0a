//! Skiff kubehub: the fetch layer and the channels it fills.
//!
//! Producers run as independent tasks and write one `(list | error)` result
//! each; aggregators drain the channels they need with [`reader::read`].

#![forbid(unsafe_code)]

pub mod channel;
pub mod fetch;
pub mod reader;

pub use channel::{list_channel, FetchOutcome, ListChannel, ListResult, ListSender, ResourceChannels};
pub use fetch::{spawn_channels, spawn_cluster, spawn_namespaced, NamespaceQuery};
pub use reader::{read, read_items, Drained, MissPolicy};
