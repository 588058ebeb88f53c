//! Append-only stock movement log.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Timelike};
use serde::{Deserialize, Serialize};

use super::lenient;
use super::product::ProductId;

/// Opaque transaction identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(i64);

impl TransactionId {
    /// Wrap a raw identifier.
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Raw identifier value.
    pub const fn get(self) -> i64 {
        self.0
    }
}

/// Movement direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Goods received.
    #[serde(rename = "IN")]
    In,
    /// Goods shipped.
    #[serde(rename = "OUT")]
    Out,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::In => "IN",
            Self::Out => "OUT",
        })
    }
}

/// An immutable log entry. Never mutated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Store-assigned identifier.
    pub id: TransactionId,
    /// Product moved.
    pub product_id: ProductId,
    /// Product name at the time of the movement.
    pub product_name: String,
    /// Movement direction.
    #[serde(rename = "type")]
    pub direction: Direction,
    /// Units moved; always positive.
    #[serde(deserialize_with = "lenient::count")]
    pub quantity: u32,
    /// Calendar date of the movement.
    #[serde(deserialize_with = "lenient::calendar_date")]
    pub date: NaiveDate,
    /// Time of day of the movement, whole seconds.
    #[serde(deserialize_with = "lenient::time_of_day")]
    pub time: NaiveTime,
}

/// A transaction awaiting an identifier.
///
/// Stores fill in `date` and `time` from their own clock when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDraft {
    /// Product moved.
    pub product_id: ProductId,
    /// Product name at the time of the movement.
    pub product_name: String,
    /// Movement direction.
    #[serde(rename = "type")]
    pub direction: Direction,
    /// Units moved.
    pub quantity: u32,
    /// Calendar date; store default when `None`.
    pub date: Option<NaiveDate>,
    /// Time of day; store default when `None`.
    pub time: Option<NaiveTime>,
}

impl TransactionDraft {
    /// Resolve missing date/time from `now` and attach the identifier.
    pub fn into_transaction<Tz: TimeZone>(
        self,
        id: TransactionId,
        now: &DateTime<Tz>,
    ) -> Transaction {
        let (date, time) = date_and_time(now);
        Transaction {
            id,
            product_id: self.product_id,
            product_name: self.product_name,
            direction: self.direction,
            quantity: self.quantity,
            date: self.date.unwrap_or(date),
            time: self.time.unwrap_or(time),
        }
    }
}

/// Split a timestamp into the calendar date and whole-second time of day
/// recorded on transactions.
pub fn date_and_time<Tz: TimeZone>(now: &DateTime<Tz>) -> (NaiveDate, NaiveTime) {
    let local = now.naive_local();
    let time = local.time();
    let whole_seconds = time.with_nanosecond(0).unwrap_or(time);
    (local.date(), whole_seconds)
}
