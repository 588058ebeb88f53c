//! Local JSON document adapter.

mod atomic_io;
mod error;
mod seed;
mod store;

pub use error::LocalStoreError;
pub use seed::demo_document;
pub use store::{ClearConfirmation, DOCUMENT_FILE, LocalInventoryStore, SnapshotExport};
