//! Tolerant decoders for stored record fields.
//!
//! The storage media accept any value and more than one client writes to
//! them. Counts are clamped into range and the date and time spellings other
//! clients have written are accepted, so one odd field does not make a whole
//! record unreadable.

use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::Deserialize;
use serde::de::{Deserializer, Error as _};
use serde_json::Value;
use tracing::warn;

const TIME_FORMATS: [&str; 5] = ["%H:%M:%S", "%H:%M:%S%.f", "%H:%M", "%I:%M:%S %p", "%I:%M %p"];
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];

/// Non-negative count. Negative values clamp to zero, oversized values to
/// `u32::MAX`, fractions truncate and numeric strings are accepted.
pub(crate) fn count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(0),
        Value::Number(number) => Ok(count_from_text(&number.to_string()).unwrap_or(0)),
        Value::String(text) => count_from_text(&text)
            .ok_or_else(|| D::Error::custom(format!("'{text}' is not a count"))),
        other => Err(D::Error::custom(format!("expected a count, found {other}"))),
    }
}

/// Time of day in 24-hour or 12-hour clock form. Unrecognised text reads as
/// midnight and is logged.
pub(crate) fn time_of_day<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(text) => Ok(parse_time(&text).unwrap_or_else(|| {
            warn!(value = %text, "unrecognised time of day; reading as midnight");
            NaiveTime::MIN
        })),
        Value::Null => Ok(NaiveTime::MIN),
        other => Err(D::Error::custom(format!("expected a time, found {other}"))),
    }
}

/// Calendar date as `YYYY-MM-DD` (optionally followed by a time) or
/// `MM/DD/YYYY`.
pub(crate) fn calendar_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    parse_date(&text).ok_or_else(|| D::Error::custom(format!("'{text}' is not a date")))
}

fn count_from_text(raw: &str) -> Option<u32> {
    let trimmed = raw.trim();
    if let Some(rest) = trimmed.strip_prefix('-') {
        return rest.starts_with(|ch: char| ch.is_ascii_digit()).then_some(0);
    }
    let digits_end = trimmed
        .find(|ch: char| !ch.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let digits = trimmed.get(..digits_end).filter(|digits| !digits.is_empty())?;
    Some(
        digits
            .parse::<u64>()
            .map_or(u32::MAX, |value| u32::try_from(value).unwrap_or(u32::MAX)),
    )
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    // Some locales separate the meridiem with a narrow no-break space.
    let normalised = raw.trim().replace(['\u{202f}', '\u{a0}'], " ");
    let upper = normalised.to_ascii_uppercase();
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(&upper, format).ok())
        .map(|time| time.with_nanosecond(0).unwrap_or(time))
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    let candidates = [Some(trimmed), trimmed.get(..10)];
    candidates.into_iter().flatten().find_map(|candidate| {
        DATE_FORMATS
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(candidate, format).ok())
    })
}
