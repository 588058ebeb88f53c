//! Domain entities, error type, ports and the inventory service.
//!
//! Everything here is transport agnostic. Adapters in
//! [`crate::outbound`] implement [`ports::InventoryStore`]; the
//! [`InventoryService`] drives them.

pub mod commit_report;
pub mod error;
pub mod inventory_service;
pub(crate) mod lenient;
pub mod ports;
pub mod product;
pub mod snapshot;
pub mod staging;
pub mod transaction;

pub use self::commit_report::{CommitFailure, CommitStep, CommittedLine, OutboundCommitReport};
pub use self::error::{Error, ErrorCode};
pub use self::inventory_service::{InboundReceipt, InboundRequest, InventoryService};
pub use self::product::{
    DEFAULT_MIN_STOCK, DEFAULT_STOCK, Product, ProductDraft, ProductId, find_by_barcode,
    low_stock, search_products,
};
pub use self::snapshot::InventorySnapshot;
pub use self::staging::{OutboundStagingEntry, StagingAdjustment, apply_quantity_delta};
pub use self::transaction::{Direction, Transaction, TransactionDraft, TransactionId, date_and_time};
