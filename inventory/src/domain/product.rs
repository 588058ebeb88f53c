//! Product catalogue entries.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::lenient;

/// Minimum-stock threshold applied when none is supplied.
pub const DEFAULT_MIN_STOCK: u32 = 5;

/// Stock assigned to a newly registered product when none is supplied.
pub const DEFAULT_STOCK: u32 = 0;

fn default_min_stock() -> u32 {
    DEFAULT_MIN_STOCK
}

/// Opaque product identifier.
///
/// Remote rows carry a server-assigned key; the local document assigns a
/// millisecond timestamp. Callers must not rely on either scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(i64);

impl ProductId {
    /// Wrap a raw identifier.
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Raw identifier value.
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stocked product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Store-assigned identifier.
    pub id: ProductId,
    /// Scannable barcode. Uniqueness is checked client side only.
    pub barcode: String,
    /// Display name.
    pub name: String,
    /// Units on hand.
    #[serde(default, deserialize_with = "lenient::count")]
    pub stock: u32,
    /// Threshold at or below which the product counts as low on stock.
    #[serde(default = "default_min_stock", deserialize_with = "lenient::count")]
    pub min_stock: u32,
}

impl Product {
    /// Whether stock has fallen to or below the minimum threshold.
    ///
    /// ```
    /// use inventory::domain::{Product, ProductId};
    ///
    /// let product = Product {
    ///     id: ProductId::new(1),
    ///     barcode: "1234567890".to_owned(),
    ///     name: "Wireless Mouse".to_owned(),
    ///     stock: 10,
    ///     min_stock: 10,
    /// };
    /// assert!(product.is_low_stock());
    /// ```
    pub fn is_low_stock(&self) -> bool {
        self.stock <= self.min_stock
    }
}

/// Validated input for registering a new product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    /// Scannable barcode.
    pub barcode: String,
    /// Display name.
    pub name: String,
    /// Initial stock.
    pub stock: u32,
    /// Minimum-stock threshold.
    pub min_stock: u32,
}

impl ProductDraft {
    /// Build a draft with explicit counts.
    pub fn new(
        barcode: impl Into<String>,
        name: impl Into<String>,
        stock: u32,
        min_stock: u32,
    ) -> Self {
        Self {
            barcode: barcode.into(),
            name: name.into(),
            stock,
            min_stock,
        }
    }

    /// Build a draft from raw form text, coercing the numeric fields.
    ///
    /// Text that does not parse as a non-negative integer falls back to the
    /// default. A minimum-stock threshold of zero also falls back, matching
    /// how the entry form has always treated it.
    ///
    /// ```
    /// use inventory::domain::ProductDraft;
    ///
    /// let draft = ProductDraft::from_form("42", "Desk Lamp", "abc", "0");
    /// assert_eq!(draft.stock, 0);
    /// assert_eq!(draft.min_stock, 5);
    /// ```
    pub fn from_form(barcode: &str, name: &str, stock: &str, min_stock: &str) -> Self {
        let threshold = coerce_count(min_stock)
            .filter(|value| *value > 0)
            .unwrap_or(DEFAULT_MIN_STOCK);
        Self {
            barcode: barcode.to_owned(),
            name: name.to_owned(),
            stock: coerce_count(stock).unwrap_or(DEFAULT_STOCK),
            min_stock: threshold,
        }
    }

    /// Attach the identifier assigned by the store.
    pub fn into_product(self, id: ProductId) -> Product {
        Product {
            id,
            barcode: self.barcode,
            name: self.name,
            stock: self.stock,
            min_stock: self.min_stock,
        }
    }
}

fn coerce_count(raw: &str) -> Option<u32> {
    let trimmed = raw.trim();
    let digits_end = trimmed
        .char_indices()
        .find(|(_, ch)| !ch.is_ascii_digit())
        .map_or(trimmed.len(), |(index, _)| index);
    trimmed.get(..digits_end)?.parse().ok()
}

/// Exact barcode match over a product list; first hit wins.
pub fn find_by_barcode<'a>(products: &'a [Product], barcode: &str) -> Option<&'a Product> {
    products.iter().find(|product| product.barcode == barcode)
}

/// Products whose name contains `query` (case-insensitive) or whose barcode
/// contains it verbatim. An empty query matches nothing.
pub fn search_products<'a>(products: &'a [Product], query: &str) -> Vec<&'a Product> {
    if query.is_empty() {
        return Vec::new();
    }
    let needle = query.to_lowercase();
    products
        .iter()
        .filter(|product| {
            product.name.to_lowercase().contains(&needle) || product.barcode.contains(query)
        })
        .collect()
}

/// Products at or below their minimum-stock threshold.
pub fn low_stock(products: &[Product]) -> Vec<&Product> {
    products.iter().filter(|product| product.is_low_stock()).collect()
}
