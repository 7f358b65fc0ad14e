use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

/// Predicate kinds the entity filters emit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    /// `col = $n`
    Eq,
    /// `col ILIKE $n` with the value wrapped as `%value%`
    ILike,
    /// Day-granular when the value has no time-of-day, exact otherwise
    OnDate,
}

/// A bound parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Int(i32),
    BigInt(i64),
    Text(String),
    Bool(bool),
    Decimal(Decimal),
    Timestamp(NaiveDateTime),
    Date(NaiveDate),
}

impl From<i32> for FilterValue {
    fn from(v: i32) -> Self {
        FilterValue::Int(v)
    }
}

impl From<i64> for FilterValue {
    fn from(v: i64) -> Self {
        FilterValue::BigInt(v)
    }
}

impl From<bool> for FilterValue {
    fn from(v: bool) -> Self {
        FilterValue::Bool(v)
    }
}

impl From<String> for FilterValue {
    fn from(v: String) -> Self {
        FilterValue::Text(v)
    }
}

impl From<&str> for FilterValue {
    fn from(v: &str) -> Self {
        FilterValue::Text(v.to_string())
    }
}

impl From<Decimal> for FilterValue {
    fn from(v: Decimal) -> Self {
        FilterValue::Decimal(v)
    }
}

impl From<NaiveDateTime> for FilterValue {
    fn from(v: NaiveDateTime) -> Self {
        FilterValue::Timestamp(v)
    }
}

impl From<NaiveDate> for FilterValue {
    fn from(v: NaiveDate) -> Self {
        FilterValue::Date(v)
    }
}

#[derive(Debug, Clone)]
pub struct FilterWhereInfo {
    pub column: String,
    pub operator: FilterOp,
    pub data: FilterValue,
}

#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<FilterValue>,
}

/// A LEFT JOINed child table for one-to-many page and lookup queries.
///
/// `columns` are `(child column, output alias)` pairs; the aliases must be
/// distinct from the parent's column names.
#[derive(Debug, Clone)]
pub struct Join {
    pub table: &'static str,
    pub alias: &'static str,
    pub foreign_key: &'static str,
    pub primary_key: &'static str,
    pub columns: &'static [(&'static str, &'static str)],
}
