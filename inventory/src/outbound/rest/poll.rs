//! Polling subscription that pushes full snapshots on a fixed cadence.
//!
//! The remote API offers no change feed, so subscribers are fed by a
//! background task that re-reads all three tables every period. Polls run
//! inside one loop, so a slow poll delays the next tick instead of
//! overlapping it; ticks missed in the meantime are skipped.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::warn;

use super::client::RestClientError;
use crate::domain::{InventorySnapshot, OutboundStagingEntry, Product, Transaction};

/// Cadence used when none is configured.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// The three reads a poll issues.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Product table.
    async fn fetch_products(&self) -> Result<Vec<Product>, RestClientError>;
    /// Transaction table, newest first.
    async fn fetch_transactions(&self) -> Result<Vec<Transaction>, RestClientError>;
    /// Staging table.
    async fn fetch_staging(&self) -> Result<Vec<OutboundStagingEntry>, RestClientError>;
}

/// Handle to a running poll task.
///
/// The task stops when the handle is cancelled or dropped.
#[derive(Debug)]
pub struct PollSubscription {
    task: JoinHandle<()>,
}

impl PollSubscription {
    /// Stop polling. Consumes the handle, so it can only happen once.
    pub fn cancel(self) {
        drop(self);
    }

    /// Whether the poll task is still running.
    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for PollSubscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Spawn a task that polls `source` every `period` and hands each snapshot
/// to `callback`. The first poll happens one period after the call.
///
/// Must be called from within a tokio runtime.
pub fn spawn_poller<S, F>(source: Arc<S>, period: Duration, mut callback: F) -> PollSubscription
where
    S: SnapshotSource + ?Sized + 'static,
    F: FnMut(InventorySnapshot) + Send + 'static,
{
    let period = period.max(MIN_POLL_INTERVAL);
    let task = tokio::spawn(async move {
        let mut ticker = time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            callback(poll_once(source.as_ref()).await);
        }
    });
    PollSubscription { task }
}

/// Issue the three reads once. A failed read contributes an empty
/// collection and a warning.
pub async fn poll_once<S>(source: &S) -> InventorySnapshot
where
    S: SnapshotSource + ?Sized,
{
    let (products, transactions, staging) = tokio::join!(
        source.fetch_products(),
        source.fetch_transactions(),
        source.fetch_staging(),
    );
    InventorySnapshot {
        products: or_empty("products", products),
        transactions: or_empty("transactions", transactions),
        staging: or_empty("daily_outbound", staging),
    }
}

fn or_empty<T>(table: &'static str, result: Result<Vec<T>, RestClientError>) -> Vec<T> {
    result.unwrap_or_else(|error| {
        warn!(table, %error, "poll read failed; substituting an empty collection");
        Vec::new()
    })
}
