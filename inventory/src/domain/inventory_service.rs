//! Domain operations over an [`InventoryStore`].
//!
//! The service validates input against the store's current contents before
//! issuing any write, then performs the writes one at a time. The storage
//! medium has no transactions, so a failure part way through a multi-step
//! operation leaves the earlier writes in place; [`OutboundCommitReport`]
//! records how far an outbound commit got.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use mockable::Clock;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::domain::ports::InventoryStore;
use crate::domain::{
    CommitFailure, CommitStep, CommittedLine, Direction, Error, InventorySnapshot,
    OutboundCommitReport, OutboundStagingEntry, Product, ProductDraft, ProductId,
    StagingAdjustment, Transaction, TransactionDraft, apply_quantity_delta, date_and_time,
    find_by_barcode,
};

/// Goods received against one product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundRequest {
    /// Product receiving stock.
    pub product_id: ProductId,
    /// Units received; must be positive.
    pub quantity: u32,
    /// Date recorded on the IN transaction; today when `None`.
    pub date: Option<NaiveDate>,
}

/// Result of a successful inbound commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundReceipt {
    /// Product with its updated stock.
    pub product: Product,
    /// Recorded IN transaction.
    pub transaction: Transaction,
}

/// Inventory service implementing barcode staging and stock commits.
#[derive(Clone)]
pub struct InventoryService<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S> InventoryService<S> {
    /// Create a new service over `store`, stamping transactions with `clock`.
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Underlying store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }
}

impl<S> InventoryService<S>
where
    S: InventoryStore,
{
    /// Read products, transactions and staging entries.
    ///
    /// # Errors
    ///
    /// Unlike the polling subscription, a failed read is surfaced rather
    /// than replaced with an empty collection.
    pub async fn snapshot(&self) -> Result<InventorySnapshot, Error> {
        let products = self.store.list_products().await?;
        let transactions = self.store.list_transactions().await?;
        let staging = self.store.list_staging().await?;
        Ok(InventorySnapshot {
            products,
            transactions,
            staging,
        })
    }

    /// Resolve a barcode to a product.
    ///
    /// # Errors
    ///
    /// [`ErrorCode::InvalidRequest`](crate::domain::ErrorCode::InvalidRequest)
    /// for a blank barcode,
    /// [`ErrorCode::NotFound`](crate::domain::ErrorCode::NotFound) when no
    /// product carries it.
    pub async fn lookup_barcode(&self, barcode: &str) -> Result<Product, Error> {
        let barcode = require_barcode(barcode)?;
        let products = self.store.list_products().await?;
        find_by_barcode(&products, barcode)
            .cloned()
            .ok_or_else(|| unknown_barcode(barcode))
    }

    /// Stage one unit of the product carrying `barcode`.
    ///
    /// Increments the existing entry or creates a new one with quantity 1.
    /// Stock is not consulted; see [`OutboundStagingEntry::can_increment`].
    ///
    /// # Errors
    ///
    /// Validation errors as for [`Self::lookup_barcode`]; nothing is written
    /// in that case.
    pub async fn scan_barcode(&self, barcode: &str) -> Result<OutboundStagingEntry, Error> {
        let product = self.lookup_barcode(barcode).await?;

        // Existence check and write are separate calls; concurrent scanners
        // can both create an entry.
        if let Some(mut entry) = self.store.find_staging_entry(product.id).await? {
            entry.quantity = entry.quantity.saturating_add(1);
            self.store
                .set_staging_quantity(product.id, entry.quantity)
                .await?;
            debug!(product_id = %product.id, quantity = entry.quantity, "staging incremented");
            return Ok(entry);
        }

        let entry = OutboundStagingEntry::for_product(&product);
        self.store.insert_staging_entry(&entry).await?;
        debug!(product_id = %product.id, "staging entry created");
        Ok(entry)
    }

    /// Apply a signed delta to a staged quantity.
    ///
    /// A result of zero deletes the entry. A product with no entry is left
    /// alone and reported as [`StagingAdjustment::Missing`].
    pub async fn adjust_staging_quantity(
        &self,
        product_id: ProductId,
        delta: i64,
    ) -> Result<StagingAdjustment, Error> {
        let Some(entry) = self.store.find_staging_entry(product_id).await? else {
            return Ok(StagingAdjustment::Missing);
        };

        let quantity = apply_quantity_delta(entry.quantity, delta);
        if quantity == 0 {
            self.store.delete_staging_entry(product_id).await?;
            return Ok(StagingAdjustment::Removed);
        }
        self.store.set_staging_quantity(product_id, quantity).await?;
        Ok(StagingAdjustment::Updated(quantity))
    }

    /// Remove every staging entry.
    pub async fn clear_staging(&self) -> Result<(), Error> {
        self.store.clear_staging().await?;
        Ok(())
    }

    /// Ship every staged quantity.
    ///
    /// For each entry in staging order the product's stock is reduced
    /// (clamping at zero) and an OUT transaction is appended; the staging
    /// list is cleared afterwards. Entries whose product has disappeared are
    /// skipped. The first failing write stops the sequence and is recorded
    /// in the returned report; earlier writes are not undone.
    ///
    /// # Errors
    ///
    /// [`ErrorCode::InvalidRequest`](crate::domain::ErrorCode::InvalidRequest)
    /// when nothing is staged, or the store error when the initial reads
    /// fail. Write failures are reported through
    /// [`OutboundCommitReport::outcome`].
    pub async fn commit_outbound(&self) -> Result<OutboundCommitReport, Error> {
        let staging = self.store.list_staging().await?;
        if staging.is_empty() {
            return Err(Error::invalid_request("no outbound items are staged"));
        }
        let products = self.store.list_products().await?;
        let (date, time) = date_and_time(&self.clock.local());

        // Running stock per product, so duplicate entries for one product
        // keep stacking.
        let mut stock_levels: HashMap<ProductId, u32> =
            products.iter().map(|p| (p.id, p.stock)).collect();

        let mut report = OutboundCommitReport::default();
        for entry in &staging {
            let Some(product) = products.iter().find(|p| p.id == entry.product_id) else {
                warn!(product_id = %entry.product_id, "staged product no longer exists; skipping");
                report.record_skipped(entry.product_id);
                continue;
            };

            let previous_stock = stock_levels
                .get(&product.id)
                .copied()
                .unwrap_or(product.stock);
            let new_stock = previous_stock.saturating_sub(entry.quantity);
            if let Err(err) = self.store.update_stock(product.id, new_stock).await {
                report.record_failure(CommitFailure {
                    product_id: Some(product.id),
                    step: CommitStep::UpdateStock,
                    error: err.into(),
                });
                return Ok(log_outcome(report));
            }
            stock_levels.insert(product.id, new_stock);

            let draft = TransactionDraft {
                product_id: product.id,
                product_name: product.name.clone(),
                direction: Direction::Out,
                quantity: entry.quantity,
                date: Some(date),
                time: Some(time),
            };
            match self.store.append_transaction(&draft).await {
                Ok(transaction) => report.record_committed(CommittedLine {
                    product_id: product.id,
                    quantity: entry.quantity,
                    previous_stock,
                    new_stock,
                    transaction,
                }),
                Err(err) => {
                    report.record_failure(CommitFailure {
                        product_id: Some(product.id),
                        step: CommitStep::AppendTransaction,
                        error: err.into(),
                    });
                    return Ok(log_outcome(report));
                }
            }
        }

        match self.store.clear_staging().await {
            Ok(()) => report.mark_staging_cleared(),
            Err(err) => report.record_failure(CommitFailure {
                product_id: None,
                step: CommitStep::ClearStaging,
                error: err.into(),
            }),
        }
        Ok(log_outcome(report))
    }

    /// Receive goods against one product.
    ///
    /// # Errors
    ///
    /// [`ErrorCode::InvalidRequest`](crate::domain::ErrorCode::InvalidRequest)
    /// for a zero quantity and
    /// [`ErrorCode::NotFound`](crate::domain::ErrorCode::NotFound) for an
    /// unknown product, both before any write. If the transaction append
    /// fails the stock update has already been persisted.
    pub async fn commit_inbound(&self, request: InboundRequest) -> Result<InboundReceipt, Error> {
        if request.quantity == 0 {
            return Err(Error::invalid_request("inbound quantity must be positive")
                .with_details(json!({ "field": "quantity" })));
        }
        let products = self.store.list_products().await?;
        let mut product = products
            .into_iter()
            .find(|p| p.id == request.product_id)
            .ok_or_else(|| {
                Error::not_found(format!("product {} does not exist", request.product_id))
            })?;

        product.stock = product.stock.saturating_add(request.quantity);
        self.store.update_stock(product.id, product.stock).await?;

        let (today, time) = date_and_time(&self.clock.local());
        let draft = TransactionDraft {
            product_id: product.id,
            product_name: product.name.clone(),
            direction: Direction::In,
            quantity: request.quantity,
            date: Some(request.date.unwrap_or(today)),
            time: Some(time),
        };
        let transaction = self.store.append_transaction(&draft).await?;
        info!(
            product_id = %product.id,
            quantity = request.quantity,
            stock = product.stock,
            "inbound committed"
        );
        Ok(InboundReceipt {
            product,
            transaction,
        })
    }

    /// Register a new product.
    ///
    /// # Errors
    ///
    /// [`ErrorCode::InvalidRequest`](crate::domain::ErrorCode::InvalidRequest)
    /// for a blank barcode or name,
    /// [`ErrorCode::Conflict`](crate::domain::ErrorCode::Conflict) when the
    /// barcode is already registered. Uniqueness is checked against the
    /// current product list only.
    pub async fn register_product(&self, draft: ProductDraft) -> Result<Product, Error> {
        if draft.barcode.trim().is_empty() || draft.name.trim().is_empty() {
            return Err(Error::invalid_request("barcode and name are required"));
        }
        let products = self.store.list_products().await?;
        if find_by_barcode(&products, &draft.barcode).is_some() {
            return Err(
                Error::conflict(format!("barcode {} is already registered", draft.barcode))
                    .with_details(json!({ "barcode": draft.barcode })),
            );
        }
        let product = self.store.insert_product(&draft).await?;
        info!(product_id = %product.id, barcode = %product.barcode, "product registered");
        Ok(product)
    }
}

fn log_outcome(report: OutboundCommitReport) -> OutboundCommitReport {
    match report.failure() {
        None => info!(
            committed = report.committed().len(),
            skipped = report.skipped().len(),
            "outbound commit completed"
        ),
        Some(failure) => warn!(
            committed = report.committed().len(),
            step = ?failure.step,
            error = %failure.error,
            "outbound commit stopped part way"
        ),
    }
    report
}

/// Blank input is rejected; anything else is matched exactly as given, the
/// same way `register_product` stores it.
fn require_barcode(barcode: &str) -> Result<&str, Error> {
    if barcode.trim().is_empty() {
        return Err(Error::invalid_request("barcode must not be blank"));
    }
    Ok(barcode)
}

fn unknown_barcode(barcode: &str) -> Error {
    Error::not_found(format!("no product registered for barcode {barcode}"))
        .with_details(json!({ "barcode": barcode }))
}

#[cfg(test)]
#[path = "inventory_service_tests.rs"]
mod tests;
