//! JSON document store in a local directory.
//!
//! The whole inventory lives in one document, `inventory-data.json`, which
//! is re-read before and rewritten after every mutation. Operations are
//! synchronous and durable on return. A process-local mutex serialises
//! read-modify-write cycles; other processes sharing the directory are not
//! coordinated with.

use std::io;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use camino::Utf8Path;
use cap_std::ambient_authority;
use cap_std::fs::Dir;
use mockable::Clock;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{info, warn};

use super::atomic_io::write_atomic;
use super::error::LocalStoreError;
use super::seed::demo_document;
use crate::domain::ports::{InventoryStore, InventoryStoreError};
use crate::domain::{
    InventorySnapshot, OutboundStagingEntry, Product, ProductDraft, ProductId, Transaction,
    TransactionDraft, TransactionId,
};

/// File name of the persisted document.
pub const DOCUMENT_FILE: &str = "inventory-data.json";

/// Explicit answer to the "delete everything?" prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearConfirmation {
    /// Wipe all data and restore the demonstration catalogue.
    Confirmed,
    /// Leave everything untouched.
    Declined,
}

/// Serialised backup ready to be saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotExport {
    /// `inventory-backup-<YYYY-MM-DD>.json`.
    pub file_name: String,
    /// Pretty-printed document.
    pub contents: String,
}

/// Inventory store persisting to a single local JSON document.
pub struct LocalInventoryStore {
    dir: Dir,
    clock: Arc<dyn Clock>,
    guard: Mutex<()>,
}

impl LocalInventoryStore {
    /// Open a store in `dir`, seeding demonstration products when no
    /// document exists yet.
    ///
    /// # Errors
    ///
    /// [`LocalStoreError::Write`] when the seed document cannot be written.
    pub fn open(dir: Dir, clock: Arc<dyn Clock>) -> Result<Self, LocalStoreError> {
        let store = Self {
            dir,
            clock,
            guard: Mutex::new(()),
        };
        if !store.document_exists() {
            store.write_all(&demo_document())?;
            info!(file = DOCUMENT_FILE, "seeded demonstration inventory");
        }
        Ok(store)
    }

    /// Create `path` if needed and open a store there.
    ///
    /// # Errors
    ///
    /// [`LocalStoreError::Open`] when the directory cannot be created or
    /// opened, otherwise as [`Self::open`].
    pub fn open_path(path: &Utf8Path, clock: Arc<dyn Clock>) -> Result<Self, LocalStoreError> {
        let open_error = |err: io::Error| LocalStoreError::Open {
            path: path.to_path_buf(),
            message: err.to_string(),
        };
        Dir::create_ambient_dir_all(path, ambient_authority()).map_err(open_error)?;
        let dir = Dir::open_ambient_dir(path, ambient_authority()).map_err(open_error)?;
        Self::open(dir, clock)
    }

    fn document_exists(&self) -> bool {
        self.dir.exists(DOCUMENT_FILE)
    }

    /// Read the whole document.
    ///
    /// An absent document reads as empty. A document that is not a JSON
    /// object also reads as empty; individual records that cannot be decoded
    /// are left out. Both cases are logged.
    pub fn read_all(&self) -> InventorySnapshot {
        match self.load() {
            Ok(loaded) => loaded.document,
            Err(err) => {
                warn!(file = DOCUMENT_FILE, error = %err, "reading inventory document as empty");
                InventorySnapshot::default()
            }
        }
    }

    fn load(&self) -> Result<LoadedDocument, LocalStoreError> {
        let raw = match self.dir.read_to_string(DOCUMENT_FILE) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(LoadedDocument::default());
            }
            Err(err) => return Err(corrupt(err)),
        };
        let parsed: Value = serde_json::from_str(&raw).map_err(corrupt)?;
        let Value::Object(mut fields) = parsed else {
            return Err(corrupt("document is not a JSON object"));
        };
        let mut skipped = 0;
        let document = InventorySnapshot {
            products: decode_records(&mut fields, "products", &mut skipped)?,
            transactions: decode_records(&mut fields, "transactions", &mut skipped)?,
            staging: decode_records(&mut fields, "dailyOutbound", &mut skipped)?,
        };
        Ok(LoadedDocument { document, skipped })
    }

    /// Overwrite the whole document.
    ///
    /// # Errors
    ///
    /// [`LocalStoreError::Encode`] or [`LocalStoreError::Write`].
    pub fn write_all(&self, document: &InventorySnapshot) -> Result<(), LocalStoreError> {
        let contents = encode(document)?;
        write_atomic(&self.dir, Utf8Path::new(DOCUMENT_FILE), &contents)
    }

    fn modify<T>(
        &self,
        change: impl FnOnce(&mut InventorySnapshot) -> T,
    ) -> Result<T, LocalStoreError> {
        let _held = self.guard.lock().unwrap_or_else(PoisonError::into_inner);
        let LoadedDocument {
            mut document,
            skipped,
        } = self.load()?;
        if skipped > 0 {
            return Err(corrupt(format!(
                "{skipped} stored record(s) could not be decoded; import a backup or clear the data"
            )));
        }
        let outcome = change(&mut document);
        self.write_all(&document)?;
        Ok(outcome)
    }

    fn now_millis(&self) -> i64 {
        self.clock.utc().timestamp_millis()
    }

    /// Append a product under a fresh identifier.
    ///
    /// # Errors
    ///
    /// [`LocalStoreError::Corrupt`] when the stored document cannot be read
    /// in full, otherwise as [`Self::write_all`].
    pub fn add_product(&self, draft: &ProductDraft) -> Result<Product, LocalStoreError> {
        let now = self.now_millis();
        self.modify(|document| {
            let largest = document.products.iter().map(|p| p.id.get()).max();
            let product = draft.clone().into_product(ProductId::new(fresh_id(now, largest)));
            document.products.push(product.clone());
            product
        })
    }

    /// Replace the stock of one product. Returns `false` when no product
    /// has that identifier, in which case nothing changes.
    ///
    /// # Errors
    ///
    /// [`LocalStoreError::Corrupt`] when the stored document cannot be read
    /// in full, otherwise as [`Self::write_all`].
    pub fn update_stock_by_id(&self, id: ProductId, stock: u32) -> Result<bool, LocalStoreError> {
        self.modify(|document| {
            let Some(product) = document.products.iter_mut().find(|p| p.id == id) else {
                return false;
            };
            product.stock = stock;
            true
        })
    }

    /// Prepend a transaction, filling in a fresh identifier and, when
    /// absent, the current date and time.
    ///
    /// # Errors
    ///
    /// [`LocalStoreError::Corrupt`] when the stored document cannot be read
    /// in full, otherwise as [`Self::write_all`].
    pub fn append_transaction(
        &self,
        draft: &TransactionDraft,
    ) -> Result<Transaction, LocalStoreError> {
        let now = self.clock.local();
        let now_millis = now.timestamp_millis();
        self.modify(|document| {
            let largest = document.transactions.iter().map(|t| t.id.get()).max();
            let id = TransactionId::new(fresh_id(now_millis, largest));
            let transaction = draft.clone().into_transaction(id, &now);
            document.transactions.insert(0, transaction.clone());
            transaction
        })
    }

    /// Overwrite the staging list.
    ///
    /// # Errors
    ///
    /// [`LocalStoreError::Corrupt`] when the stored document cannot be read
    /// in full, otherwise as [`Self::write_all`].
    pub fn replace_staging_list(
        &self,
        entries: Vec<OutboundStagingEntry>,
    ) -> Result<(), LocalStoreError> {
        self.modify(|document| document.staging = entries)
    }

    /// Serialise the whole document as a dated backup.
    ///
    /// # Errors
    ///
    /// [`LocalStoreError::Encode`].
    pub fn export_snapshot(&self) -> Result<SnapshotExport, LocalStoreError> {
        let date = self.clock.local().format("%Y-%m-%d");
        Ok(SnapshotExport {
            file_name: format!("inventory-backup-{date}.json"),
            contents: encode(&self.read_all())?,
        })
    }

    /// Export and save the backup into `target`.
    ///
    /// # Errors
    ///
    /// As [`Self::export_snapshot`] and [`Self::write_all`].
    pub fn write_export(&self, target: &Dir) -> Result<SnapshotExport, LocalStoreError> {
        let export = self.export_snapshot()?;
        write_atomic(target, Utf8Path::new(&export.file_name), &export.contents)?;
        info!(file = %export.file_name, "inventory backup written");
        Ok(export)
    }

    /// Replace the document with a previously exported backup.
    ///
    /// # Errors
    ///
    /// [`LocalStoreError::Import`] when `backup` is not an inventory
    /// document; the current document is left untouched.
    pub fn import_snapshot(&self, backup: &str) -> Result<InventorySnapshot, LocalStoreError> {
        let document: InventorySnapshot =
            serde_json::from_str(backup).map_err(|err| LocalStoreError::Import {
                message: err.to_string(),
            })?;
        let _held = self.guard.lock().unwrap_or_else(PoisonError::into_inner);
        self.write_all(&document)?;
        Ok(document)
    }

    /// Wipe everything and restore the demonstration catalogue.
    ///
    /// Returns whether anything was cleared.
    ///
    /// # Errors
    ///
    /// As [`Self::write_all`].
    pub fn clear_all_data(&self, confirmation: ClearConfirmation) -> Result<bool, LocalStoreError> {
        if confirmation == ClearConfirmation::Declined {
            return Ok(false);
        }
        let _held = self.guard.lock().unwrap_or_else(PoisonError::into_inner);
        self.write_all(&demo_document())?;
        info!("inventory cleared and demonstration data restored");
        Ok(true)
    }
}

#[derive(Default)]
struct LoadedDocument {
    document: InventorySnapshot,
    skipped: usize,
}

/// Decode the array under `key` record by record, counting the records
/// that do not decode. A missing key is an empty collection.
fn decode_records<T: DeserializeOwned>(
    fields: &mut Map<String, Value>,
    key: &str,
    skipped: &mut usize,
) -> Result<Vec<T>, LocalStoreError> {
    let records = match fields.remove(key) {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(records)) => records,
        Some(_) => return Err(corrupt(format!("'{key}' is not a list"))),
    };
    let mut decoded = Vec::with_capacity(records.len());
    for (index, record) in records.into_iter().enumerate() {
        match serde_json::from_value(record) {
            Ok(value) => decoded.push(value),
            Err(err) => {
                warn!(collection = key, index, error = %err, "skipping undecodable record");
                *skipped += 1;
            }
        }
    }
    Ok(decoded)
}

fn corrupt(error: impl ToString) -> LocalStoreError {
    LocalStoreError::Corrupt {
        message: error.to_string(),
    }
}

/// Millisecond timestamp, bumped past `largest` so identifiers stay unique
/// when several are issued within one millisecond.
fn fresh_id(now_millis: i64, largest: Option<i64>) -> i64 {
    match largest {
        Some(largest) if largest >= now_millis => largest.saturating_add(1),
        _ => now_millis,
    }
}

fn encode(document: &InventorySnapshot) -> Result<String, LocalStoreError> {
    serde_json::to_string_pretty(document).map_err(|err| LocalStoreError::Encode {
        message: err.to_string(),
    })
}

#[async_trait]
impl InventoryStore for LocalInventoryStore {
    async fn list_products(&self) -> Result<Vec<Product>, InventoryStoreError> {
        Ok(self.read_all().products)
    }

    async fn list_transactions(&self) -> Result<Vec<Transaction>, InventoryStoreError> {
        Ok(self.read_all().transactions)
    }

    async fn list_staging(&self) -> Result<Vec<OutboundStagingEntry>, InventoryStoreError> {
        Ok(self.read_all().staging)
    }

    async fn insert_product(&self, draft: &ProductDraft) -> Result<Product, InventoryStoreError> {
        Ok(self.add_product(draft)?)
    }

    async fn update_stock(&self, id: ProductId, stock: u32) -> Result<(), InventoryStoreError> {
        self.update_stock_by_id(id, stock)?;
        Ok(())
    }

    async fn append_transaction(
        &self,
        draft: &TransactionDraft,
    ) -> Result<Transaction, InventoryStoreError> {
        Ok(Self::append_transaction(self, draft)?)
    }

    async fn find_staging_entry(
        &self,
        product_id: ProductId,
    ) -> Result<Option<OutboundStagingEntry>, InventoryStoreError> {
        Ok(self
            .read_all()
            .staging
            .into_iter()
            .find(|entry| entry.product_id == product_id))
    }

    async fn insert_staging_entry(
        &self,
        entry: &OutboundStagingEntry,
    ) -> Result<(), InventoryStoreError> {
        self.modify(|document| document.staging.push(entry.clone()))?;
        Ok(())
    }

    async fn set_staging_quantity(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), InventoryStoreError> {
        self.modify(|document| {
            if let Some(entry) = document
                .staging
                .iter_mut()
                .find(|entry| entry.product_id == product_id)
            {
                entry.quantity = quantity;
            }
        })?;
        Ok(())
    }

    async fn delete_staging_entry(
        &self,
        product_id: ProductId,
    ) -> Result<(), InventoryStoreError> {
        self.modify(|document| {
            document
                .staging
                .retain(|entry| entry.product_id != product_id);
        })?;
        Ok(())
    }

    async fn clear_staging(&self) -> Result<(), InventoryStoreError> {
        self.replace_staging_list(Vec::new())?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
