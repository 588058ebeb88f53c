//! PostgREST outbound adapter.
//!
//! [`RestClient`] issues single requests described by [`TableQuery`];
//! [`RestInventoryStore`] implements the inventory port on top of it and
//! feeds subscribers through a polling task.

mod client;
mod dto;
mod poll;
mod query;
mod store;

pub use client::{DEFAULT_REQUEST_TIMEOUT, RestClient, RestClientConfig, RestClientError};
pub use poll::{DEFAULT_POLL_INTERVAL, PollSubscription, SnapshotSource, poll_once, spawn_poller};
pub use query::{SortOrder, TableQuery};
pub use store::RestInventoryStore;
