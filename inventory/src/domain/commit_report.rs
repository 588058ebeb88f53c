//! Outcome accumulation for the multi-step outbound commit.
//!
//! An outbound commit is a sequence of independent writes with no rollback.
//! The report records exactly how far the sequence got so callers can tell a
//! clean commit from a partial one.

use serde_json::json;

use super::error::Error;
use super::product::ProductId;
use super::transaction::Transaction;

/// A staged line that was fully applied: stock written and OUT recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedLine {
    /// Product shipped.
    pub product_id: ProductId,
    /// Units requested by the staging entry.
    pub quantity: u32,
    /// Stock before the commit.
    pub previous_stock: u32,
    /// Stock written, clamped at zero.
    pub new_stock: u32,
    /// Recorded OUT transaction.
    pub transaction: Transaction,
}

/// Write step within an outbound commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitStep {
    /// Persisting the recomputed stock of one product.
    UpdateStock,
    /// Appending the OUT transaction of one product.
    AppendTransaction,
    /// Clearing the staging list after all lines.
    ClearStaging,
}

impl CommitStep {
    fn as_str(self) -> &'static str {
        match self {
            Self::UpdateStock => "update_stock",
            Self::AppendTransaction => "append_transaction",
            Self::ClearStaging => "clear_staging",
        }
    }
}

/// The step that stopped the commit.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitFailure {
    /// Product being processed, `None` for [`CommitStep::ClearStaging`].
    pub product_id: Option<ProductId>,
    /// Failing step.
    pub step: CommitStep,
    /// Error reported by the store.
    pub error: Error,
}

/// Accumulated result of an outbound commit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutboundCommitReport {
    committed: Vec<CommittedLine>,
    skipped: Vec<ProductId>,
    failure: Option<CommitFailure>,
    staging_cleared: bool,
}

impl OutboundCommitReport {
    pub(crate) fn record_committed(&mut self, line: CommittedLine) {
        self.committed.push(line);
    }

    pub(crate) fn record_skipped(&mut self, product_id: ProductId) {
        self.skipped.push(product_id);
    }

    pub(crate) fn record_failure(&mut self, failure: CommitFailure) {
        self.failure = Some(failure);
    }

    pub(crate) fn mark_staging_cleared(&mut self) {
        self.staging_cleared = true;
    }

    /// Lines applied in full, in staging order.
    pub fn committed(&self) -> &[CommittedLine] {
        &self.committed
    }

    /// Staged products that no longer exist and were passed over.
    pub fn skipped(&self) -> &[ProductId] {
        &self.skipped
    }

    /// The failing step, if the commit stopped early.
    pub fn failure(&self) -> Option<&CommitFailure> {
        self.failure.as_ref()
    }

    /// Whether the staging list was cleared at the end.
    pub fn staging_cleared(&self) -> bool {
        self.staging_cleared
    }

    /// Whether every step succeeded.
    pub fn is_complete(&self) -> bool {
        self.failure.is_none() && self.staging_cleared
    }

    /// Collapse the report into a single success/failure outcome.
    ///
    /// # Errors
    ///
    /// Returns the store error of the failing step, annotated with how many
    /// lines had already been committed.
    pub fn outcome(&self) -> Result<(), Error> {
        let Some(failure) = &self.failure else {
            return Ok(());
        };
        Err(failure.error.clone().with_details(json!({
            "failedStep": failure.step.as_str(),
            "productId": failure.product_id.map(ProductId::get),
            "committedLines": self.committed.len(),
            "stagingCleared": self.staging_cleared,
        })))
    }
}
