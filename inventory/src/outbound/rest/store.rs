//! [`InventoryStore`] adapter over the PostgREST client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mockable::{Clock, DefaultClock};
use serde_json::Value;

use super::client::{RestClient, RestClientError};
use super::dto::{
    DAILY_OUTBOUND, NewProductRow, NewTransactionRow, PRODUCTS, ProductRow, QuantityPatch,
    StagingRow, StockPatch, TRANSACTIONS, TransactionRow, decode_each,
};
use super::poll::{PollSubscription, SnapshotSource, spawn_poller};
use super::query::{SortOrder, TableQuery};
use crate::domain::ports::{InventoryStore, InventoryStoreError};
use crate::domain::{
    InventorySnapshot, OutboundStagingEntry, Product, ProductDraft, ProductId, Transaction,
    TransactionDraft,
};

/// Remote inventory store backed by three PostgREST tables.
pub struct RestInventoryStore {
    client: RestClient,
    clock: Arc<dyn Clock>,
}

impl RestInventoryStore {
    /// Wrap a configured client.
    pub fn new(client: RestClient) -> Self {
        Self::with_clock(client, Arc::new(DefaultClock))
    }

    /// Wrap a configured client, stamping `updated_at` from `clock`.
    pub fn with_clock(client: RestClient, clock: Arc<dyn Clock>) -> Self {
        Self { client, clock }
    }

    /// Underlying client.
    pub fn client(&self) -> &RestClient {
        &self.client
    }

    /// Push a full snapshot to `callback` every `period` until the returned
    /// handle is cancelled or dropped.
    ///
    /// Must be called from within a tokio runtime.
    pub fn subscribe<F>(self: &Arc<Self>, period: Duration, callback: F) -> PollSubscription
    where
        F: FnMut(InventorySnapshot) + Send + 'static,
    {
        spawn_poller(Arc::clone(self), period, callback)
    }

    fn staging_for(product_id: ProductId) -> TableQuery {
        TableQuery::table(DAILY_OUTBOUND).eq("product_id", product_id)
    }
}

#[async_trait]
impl SnapshotSource for RestInventoryStore {
    async fn fetch_products(&self) -> Result<Vec<Product>, RestClientError> {
        let raw = self.client.fetch(&TableQuery::table(PRODUCTS)).await?;
        let rows: Vec<ProductRow> = decode_each(PRODUCTS, raw);
        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn fetch_transactions(&self) -> Result<Vec<Transaction>, RestClientError> {
        let query = TableQuery::table(TRANSACTIONS).order("created_at", SortOrder::Descending);
        let raw = self.client.fetch(&query).await?;
        let rows: Vec<TransactionRow> = decode_each(TRANSACTIONS, raw);
        Ok(rows.into_iter().map(Transaction::from).collect())
    }

    async fn fetch_staging(&self) -> Result<Vec<OutboundStagingEntry>, RestClientError> {
        let query = TableQuery::table(DAILY_OUTBOUND).order("id", SortOrder::Ascending);
        let raw = self.client.fetch(&query).await?;
        let rows: Vec<StagingRow> = decode_each(DAILY_OUTBOUND, raw);
        Ok(rows.into_iter().map(OutboundStagingEntry::from).collect())
    }
}

#[async_trait]
impl InventoryStore for RestInventoryStore {
    async fn list_products(&self) -> Result<Vec<Product>, InventoryStoreError> {
        Ok(self.fetch_products().await?)
    }

    async fn list_transactions(&self) -> Result<Vec<Transaction>, InventoryStoreError> {
        Ok(self.fetch_transactions().await?)
    }

    async fn list_staging(&self) -> Result<Vec<OutboundStagingEntry>, InventoryStoreError> {
        Ok(self.fetch_staging().await?)
    }

    async fn insert_product(&self, draft: &ProductDraft) -> Result<Product, InventoryStoreError> {
        let rows: Vec<ProductRow> = self
            .client
            .insert(&TableQuery::table(PRODUCTS), &[NewProductRow::from(draft)])
            .await?;
        rows.into_iter()
            .next()
            .map(Product::from)
            .ok_or_else(|| InventoryStoreError::decode("product insert returned no rows"))
    }

    async fn update_stock(&self, id: ProductId, stock: u32) -> Result<(), InventoryStoreError> {
        let patch = StockPatch {
            stock,
            updated_at: self.clock.utc(),
        };
        let query = TableQuery::table(PRODUCTS).eq("id", id);
        let _: Vec<Value> = self.client.update(&query, &patch).await?;
        Ok(())
    }

    async fn append_transaction(
        &self,
        draft: &TransactionDraft,
    ) -> Result<Transaction, InventoryStoreError> {
        let rows: Vec<TransactionRow> = self
            .client
            .insert(
                &TableQuery::table(TRANSACTIONS),
                &[NewTransactionRow::from(draft)],
            )
            .await?;
        rows.into_iter()
            .next()
            .map(Transaction::from)
            .ok_or_else(|| InventoryStoreError::decode("transaction insert returned no rows"))
    }

    async fn find_staging_entry(
        &self,
        product_id: ProductId,
    ) -> Result<Option<OutboundStagingEntry>, InventoryStoreError> {
        let query = Self::staging_for(product_id).limit(1);
        let rows: Vec<StagingRow> = self.client.fetch(&query).await?;
        Ok(rows.into_iter().next().map(OutboundStagingEntry::from))
    }

    async fn insert_staging_entry(
        &self,
        entry: &OutboundStagingEntry,
    ) -> Result<(), InventoryStoreError> {
        let _: Vec<Value> = self
            .client
            .insert(&TableQuery::table(DAILY_OUTBOUND), &[StagingRow::from(entry)])
            .await?;
        Ok(())
    }

    async fn set_staging_quantity(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), InventoryStoreError> {
        let _: Vec<Value> = self
            .client
            .update(&Self::staging_for(product_id), &QuantityPatch { quantity })
            .await?;
        Ok(())
    }

    async fn delete_staging_entry(
        &self,
        product_id: ProductId,
    ) -> Result<(), InventoryStoreError> {
        self.client.delete(&Self::staging_for(product_id)).await?;
        Ok(())
    }

    async fn clear_staging(&self) -> Result<(), InventoryStoreError> {
        let every_row = TableQuery::table(DAILY_OUTBOUND).neq("id", 0);
        self.client.delete(&every_row).await?;
        Ok(())
    }
}
