//! Point-in-time view of all three collections.

use serde::{Deserialize, Serialize};

use super::product::{Product, ProductId};
use super::staging::OutboundStagingEntry;
use super::transaction::Transaction;

/// Products, transaction history and the staging list read together.
///
/// The serialised form is also the local document and export format:
/// `{ "products": [...], "transactions": [...], "dailyOutbound": [...] }`.
/// Transactions are ordered newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventorySnapshot {
    /// Product catalogue.
    #[serde(default)]
    pub products: Vec<Product>,
    /// Transaction history, newest first.
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    /// Today's outbound staging list, in insertion order.
    #[serde(default, rename = "dailyOutbound")]
    pub staging: Vec<OutboundStagingEntry>,
}

impl InventorySnapshot {
    /// Product with the given identifier.
    pub fn product(&self, id: ProductId) -> Option<&Product> {
        self.products.iter().find(|product| product.id == id)
    }

    /// Staging entry for the given product.
    pub fn staging_entry(&self, product_id: ProductId) -> Option<&OutboundStagingEntry> {
        self.staging
            .iter()
            .find(|entry| entry.product_id == product_id)
    }

    /// Whether all three collections are empty.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty() && self.transactions.is_empty() && self.staging.is_empty()
    }
}
