//! Outbound staging entries ("today's outbound" list).

use serde::{Deserialize, Serialize};

use super::lenient;
use super::product::{Product, ProductId};

/// A pending outbound quantity for one product.
///
/// ## Invariants
/// - At most one entry exists per product.
/// - `quantity` is positive while the entry exists; reaching zero deletes it.
///
/// The product fields are captured when the entry is created and are not
/// refreshed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundStagingEntry {
    /// Product the quantity is staged for.
    pub product_id: ProductId,
    /// Product name at staging time.
    pub product_name: String,
    /// Product barcode at staging time.
    pub barcode: String,
    /// Product stock at staging time.
    #[serde(default, deserialize_with = "lenient::count")]
    pub stock: u32,
    /// Product minimum-stock threshold at staging time.
    #[serde(default, deserialize_with = "lenient::count")]
    pub min_stock: u32,
    /// Units staged for the next outbound commit.
    #[serde(deserialize_with = "lenient::count")]
    pub quantity: u32,
}

impl OutboundStagingEntry {
    /// First scan of `product`: stage a single unit.
    pub fn for_product(product: &Product) -> Self {
        Self {
            product_id: product.id,
            product_name: product.name.clone(),
            barcode: product.barcode.clone(),
            stock: product.stock,
            min_stock: product.min_stock,
            quantity: 1,
        }
    }

    /// Whether one more unit may be staged against `current_stock`.
    ///
    /// Front ends refuse increments past the product's stock; the store and
    /// service accept them.
    pub fn can_increment(&self, current_stock: u32) -> bool {
        self.quantity < current_stock
    }
}

/// Apply a signed delta to a staged quantity, clamping at zero.
///
/// ```
/// use inventory::domain::apply_quantity_delta;
///
/// assert_eq!(apply_quantity_delta(3, -1), 2);
/// assert_eq!(apply_quantity_delta(1, -5), 0);
/// ```
pub fn apply_quantity_delta(quantity: u32, delta: i64) -> u32 {
    let adjusted = i64::from(quantity).saturating_add(delta).max(0);
    u32::try_from(adjusted).unwrap_or(u32::MAX)
}

/// What an adjustment did to the staging list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagingAdjustment {
    /// The entry now holds this quantity.
    Updated(u32),
    /// The quantity reached zero and the entry was deleted.
    Removed,
    /// No entry exists for the product; nothing changed.
    Missing,
}
