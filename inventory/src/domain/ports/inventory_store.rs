//! Port for the inventory storage medium.
//!
//! The [`InventoryStore`] trait is the only contract the domain service
//! relies on. Two adapters implement it: the PostgREST client in
//! `outbound::rest` and the JSON document store in `outbound::local`.
//! Every method is a single independent write or read; the medium offers no
//! transactions, so multi-step sequences are assembled by the service.

use async_trait::async_trait;

use crate::domain::{
    OutboundStagingEntry, Product, ProductDraft, ProductId, Transaction, TransactionDraft,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by inventory store adapters.
    pub enum InventoryStoreError {
        /// The medium could not be reached (network failure, timeout).
        Connection { message: String } =>
            "inventory store connection failed: {message}",
        /// The medium rejected a read or write (non-success status).
        Query { message: String } =>
            "inventory store query failed: {message}",
        /// Local persistence failed (I/O, quota).
        Storage { message: String } =>
            "inventory storage failed: {message}",
        /// A payload could not be decoded.
        Decode { message: String } =>
            "inventory store returned malformed data: {message}",
    }
}

/// Port for reading and writing the three inventory collections.
///
/// # Ordering
///
/// - `list_transactions` returns transactions newest first.
/// - `list_staging` returns entries in insertion order.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// All products.
    async fn list_products(&self) -> Result<Vec<Product>, InventoryStoreError>;

    /// Transaction history, newest first.
    async fn list_transactions(&self) -> Result<Vec<Transaction>, InventoryStoreError>;

    /// The outbound staging list.
    async fn list_staging(&self) -> Result<Vec<OutboundStagingEntry>, InventoryStoreError>;

    /// Persist a new product and return it with its assigned identifier.
    async fn insert_product(&self, draft: &ProductDraft) -> Result<Product, InventoryStoreError>;

    /// Overwrite the stock of one product.
    async fn update_stock(&self, id: ProductId, stock: u32) -> Result<(), InventoryStoreError>;

    /// Append a transaction and return it as stored.
    ///
    /// Missing `date`/`time` values are filled in by the store.
    async fn append_transaction(
        &self,
        draft: &TransactionDraft,
    ) -> Result<Transaction, InventoryStoreError>;

    /// Staging entry for a product, if any.
    async fn find_staging_entry(
        &self,
        product_id: ProductId,
    ) -> Result<Option<OutboundStagingEntry>, InventoryStoreError>;

    /// Add a staging entry.
    async fn insert_staging_entry(
        &self,
        entry: &OutboundStagingEntry,
    ) -> Result<(), InventoryStoreError>;

    /// Overwrite the staged quantity of one product.
    async fn set_staging_quantity(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), InventoryStoreError>;

    /// Remove the staging entry of one product.
    async fn delete_staging_entry(&self, product_id: ProductId)
    -> Result<(), InventoryStoreError>;

    /// Remove every staging entry.
    async fn clear_staging(&self) -> Result<(), InventoryStoreError>;
}
