//! Row DTOs for the PostgREST tables.
//!
//! Rows use snake_case columns on the wire. The adapter decodes into these
//! DTOs first, then maps into domain records in one pass.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::domain::lenient;
use crate::domain::{
    DEFAULT_MIN_STOCK, Direction, OutboundStagingEntry, Product, ProductDraft, ProductId,
    Transaction, TransactionDraft, TransactionId,
};

pub(super) const PRODUCTS: &str = "products";
pub(super) const TRANSACTIONS: &str = "transactions";
pub(super) const DAILY_OUTBOUND: &str = "daily_outbound";

/// Decode fetched rows one at a time, skipping (and logging) any row that
/// cannot be read so the rest of the table stays visible.
pub(super) fn decode_each<T: DeserializeOwned>(table: &str, rows: Vec<Value>) -> Vec<T> {
    rows.into_iter()
        .filter_map(|row| match serde_json::from_value(row) {
            Ok(decoded) => Some(decoded),
            Err(err) => {
                warn!(table, error = %err, "skipping undecodable row");
                None
            }
        })
        .collect()
}

#[derive(Debug, Deserialize)]
pub(super) struct ProductRow {
    id: i64,
    barcode: String,
    name: String,
    #[serde(default, deserialize_with = "lenient::count")]
    stock: u32,
    #[serde(default)]
    min_stock: Option<i64>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            barcode: row.barcode,
            name: row.name,
            stock: row.stock,
            min_stock: row
                .min_stock
                .map_or(DEFAULT_MIN_STOCK, |raw| u32::try_from(raw.max(0)).unwrap_or(u32::MAX)),
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct NewProductRow<'a> {
    barcode: &'a str,
    name: &'a str,
    stock: u32,
    min_stock: u32,
}

impl<'a> From<&'a ProductDraft> for NewProductRow<'a> {
    fn from(draft: &'a ProductDraft) -> Self {
        Self {
            barcode: &draft.barcode,
            name: &draft.name,
            stock: draft.stock,
            min_stock: draft.min_stock,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct StockPatch {
    pub(super) stock: u32,
    pub(super) updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub(super) struct QuantityPatch {
    pub(super) quantity: u32,
}

#[derive(Debug, Deserialize)]
pub(super) struct TransactionRow {
    id: i64,
    product_id: i64,
    product_name: String,
    #[serde(rename = "type")]
    direction: Direction,
    #[serde(deserialize_with = "lenient::count")]
    quantity: u32,
    #[serde(deserialize_with = "lenient::calendar_date")]
    date: NaiveDate,
    #[serde(deserialize_with = "lenient::time_of_day")]
    time: NaiveTime,
}

impl From<TransactionRow> for Transaction {
    fn from(row: TransactionRow) -> Self {
        Self {
            id: TransactionId::new(row.id),
            product_id: ProductId::new(row.product_id),
            product_name: row.product_name,
            direction: row.direction,
            quantity: row.quantity,
            date: row.date,
            time: row.time,
        }
    }
}

/// Absent date/time columns are omitted so the table defaults apply.
#[derive(Debug, Serialize)]
pub(super) struct NewTransactionRow<'a> {
    product_id: i64,
    product_name: &'a str,
    #[serde(rename = "type")]
    direction: Direction,
    quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    time: Option<NaiveTime>,
}

impl<'a> From<&'a TransactionDraft> for NewTransactionRow<'a> {
    fn from(draft: &'a TransactionDraft) -> Self {
        Self {
            product_id: draft.product_id.get(),
            product_name: &draft.product_name,
            direction: draft.direction,
            quantity: draft.quantity,
            date: draft.date,
            time: draft.time,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct StagingRow {
    product_id: i64,
    product_name: String,
    barcode: String,
    #[serde(default, deserialize_with = "lenient::count")]
    stock: u32,
    #[serde(default, deserialize_with = "lenient::count")]
    min_stock: u32,
    #[serde(deserialize_with = "lenient::count")]
    quantity: u32,
}

impl From<StagingRow> for OutboundStagingEntry {
    fn from(row: StagingRow) -> Self {
        Self {
            product_id: ProductId::new(row.product_id),
            product_name: row.product_name,
            barcode: row.barcode,
            stock: row.stock,
            min_stock: row.min_stock,
            quantity: row.quantity,
        }
    }
}

impl From<&OutboundStagingEntry> for StagingRow {
    fn from(entry: &OutboundStagingEntry) -> Self {
        Self {
            product_id: entry.product_id.get(),
            product_name: entry.product_name.clone(),
            barcode: entry.barcode.clone(),
            stock: entry.stock,
            min_stock: entry.min_stock,
            quantity: entry.quantity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn product_rows_default_missing_threshold() {
        let row: ProductRow = serde_json::from_value(json!({
            "id": 3,
            "barcode": "3456789012",
            "name": "Laptop Stand",
            "stock": 8,
            "min_stock": null,
            "created_at": "2026-01-01T00:00:00Z"
        }))
        .expect("decode row");
        assert_eq!(Product::from(row).min_stock, DEFAULT_MIN_STOCK);
    }

    #[test]
    fn transaction_rows_drop_fractional_seconds() {
        let row: TransactionRow = serde_json::from_value(json!({
            "id": 11,
            "product_id": 1,
            "product_name": "Wireless Mouse",
            "type": "OUT",
            "quantity": 2,
            "date": "2026-05-04",
            "time": "13:45:10.250"
        }))
        .expect("decode row");
        let tx = Transaction::from(row);
        assert_eq!(tx.direction, Direction::Out);
        assert_eq!(tx.time.to_string(), "13:45:10");
    }

    #[test]
    fn locale_formatted_transaction_rows_decode() {
        let row: TransactionRow = serde_json::from_value(json!({
            "id": 12,
            "product_id": 2,
            "product_name": "USB-C Cable",
            "type": "IN",
            "quantity": 5,
            "date": "2026-05-04",
            "time": "3:45:12 PM"
        }))
        .expect("legacy row decodes");
        let tx = Transaction::from(row);
        assert_eq!(tx.time, NaiveTime::from_hms_opt(15, 45, 12).expect("valid time"));
    }

    #[test]
    fn undecodable_rows_are_skipped_not_fatal() {
        let rows = vec![
            json!({
                "id": 1, "product_id": 1, "product_name": "Wireless Mouse",
                "type": "OUT", "quantity": 2, "date": "2026-05-04", "time": "10:00:00"
            }),
            json!({
                "id": 2, "product_id": 1, "product_name": "Wireless Mouse",
                "type": "SIDEWAYS", "quantity": 2, "date": "2026-05-04", "time": "10:00:00"
            }),
            json!({
                "id": 3, "product_id": 2, "product_name": "USB-C Cable",
                "type": "IN", "quantity": 1, "date": "not a date", "time": "10:00:00"
            }),
        ];
        let decoded: Vec<TransactionRow> = decode_each(TRANSACTIONS, rows);
        let ids: Vec<_> = decoded
            .into_iter()
            .map(|row| Transaction::from(row).id.get())
            .collect();
        assert_eq!(ids, [1]);
    }

    #[test]
    fn new_transaction_rows_omit_absent_timestamps() {
        let draft = TransactionDraft {
            product_id: ProductId::new(1),
            product_name: "Wireless Mouse".to_owned(),
            direction: Direction::In,
            quantity: 4,
            date: None,
            time: None,
        };
        let value = serde_json::to_value(NewTransactionRow::from(&draft)).expect("encode row");
        assert_eq!(
            value,
            json!({
                "product_id": 1,
                "product_name": "Wireless Mouse",
                "type": "IN",
                "quantity": 4
            })
        );
    }
}
