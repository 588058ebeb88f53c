//! Demonstration catalogue written on first run and after a full clear.

use crate::domain::{InventorySnapshot, Product, ProductId};

const DEMO_PRODUCTS: [(i64, &str, &str, u32, u32); 3] = [
    (1, "1234567890", "Wireless Mouse", 50, 10),
    (2, "2345678901", "USB-C Cable", 30, 5),
    (3, "3456789012", "Laptop Stand", 8, 3),
];

/// Document holding only the demonstration products.
pub fn demo_document() -> InventorySnapshot {
    InventorySnapshot {
        products: DEMO_PRODUCTS
            .iter()
            .map(|&(id, barcode, name, stock, min_stock)| Product {
                id: ProductId::new(id),
                barcode: barcode.to_owned(),
                name: name.to_owned(),
                stock,
                min_stock,
            })
            .collect(),
        ..InventorySnapshot::default()
    }
}
