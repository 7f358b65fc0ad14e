//! Row records, query-string filters and write inputs per entity.
//!
//! Rows map by column name with `sqlx::FromRow`; nullable columns are
//! `Option<_>` so SQL NULL stays distinguishable from real values.

pub mod category;
pub mod customer;
pub mod employee;
pub mod order;
pub mod product;

pub use category::*;
pub use customer::*;
pub use employee::*;
pub use order::*;
pub use product::*;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use validator::ValidationError;

/// Accepts `2024-03-15` (midnight) as well as full ISO timestamps
/// (`2024-03-15T14:30:00`, optional fraction).
pub(crate) fn deserialize_opt_datetime<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => parse_datetime(s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date or timestamp: {}", s))),
    }
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    if let Ok(ts) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(ts);
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(ts);
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

pub(crate) fn non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::new("non_negative"));
    }
    Ok(())
}
