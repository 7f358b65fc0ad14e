use chrono::{NaiveDateTime, NaiveTime};

use super::error::FilterError;
use super::types::{FilterOp, FilterValue, FilterWhereInfo};

/// Accumulates optional predicates against a single table alias.
///
/// Absent values never produce a predicate, so a filter with nothing set
/// renders to an empty clause and the caller omits `WHERE` entirely.
#[derive(Debug, Clone)]
pub struct FilterWhere {
    alias: String,
    conditions: Vec<FilterWhereInfo>,
}

impl FilterWhere {
    pub fn new(alias: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            conditions: vec![],
        }
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn conditions(&self) -> &[FilterWhereInfo] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Exact match for ids, enums and flags.
    pub fn eq<V: Into<FilterValue>>(&mut self, column: &str, value: Option<V>) -> Result<&mut Self, FilterError> {
        Self::validate_column(column)?;
        if let Some(v) = value {
            self.push(column, FilterOp::Eq, v.into());
        }
        Ok(self)
    }

    /// Case-insensitive substring match. Blank strings count as absent.
    pub fn ilike(&mut self, column: &str, value: Option<&str>) -> Result<&mut Self, FilterError> {
        Self::validate_column(column)?;
        if let Some(v) = value.map(str::trim).filter(|v| !v.is_empty()) {
            let pattern = format!("%{}%", Self::escape_like(v));
            self.push(column, FilterOp::ILike, FilterValue::Text(pattern));
        }
        Ok(self)
    }

    /// Midnight values compare by calendar day, anything else by exact timestamp.
    pub fn on_date(&mut self, column: &str, value: Option<NaiveDateTime>) -> Result<&mut Self, FilterError> {
        Self::validate_column(column)?;
        if let Some(v) = value {
            let operator = if v.time() == NaiveTime::MIN { FilterOp::OnDate } else { FilterOp::Eq };
            self.push(column, operator, FilterValue::Timestamp(v));
        }
        Ok(self)
    }

    /// Render the predicates joined with AND, numbering parameters from
    /// `starting_param_index + 1`.
    pub fn generate(&self, starting_param_index: usize) -> (String, Vec<FilterValue>) {
        let mut params = Vec::with_capacity(self.conditions.len());
        let sql_conditions: Vec<String> = self
            .conditions
            .iter()
            .map(|condition| self.build_sql_condition(condition, starting_param_index, &mut params))
            .collect();
        (sql_conditions.join(" AND "), params)
    }

    fn push(&mut self, column: &str, operator: FilterOp, data: FilterValue) {
        self.conditions.push(FilterWhereInfo { column: column.to_string(), operator, data });
    }

    fn build_sql_condition(&self, condition: &FilterWhereInfo, offset: usize, params: &mut Vec<FilterValue>) -> String {
        let quoted_column = format!("{}.\"{}\"", self.alias, condition.column);
        params.push(condition.data.clone());
        let placeholder = format!("${}", offset + params.len());
        match condition.operator {
            FilterOp::Eq => format!("{} = {}", quoted_column, placeholder),
            FilterOp::ILike => format!("{} ILIKE {}", quoted_column, placeholder),
            FilterOp::OnDate => format!("CAST({} AS DATE) = CAST({} AS DATE)", quoted_column, placeholder),
        }
    }

    fn escape_like(value: &str) -> String {
        let mut out = String::with_capacity(value.len());
        for c in value.chars() {
            if matches!(c, '\\' | '%' | '_') {
                out.push('\\');
            }
            out.push(c);
        }
        out
    }

    fn validate_column(column: &str) -> Result<(), FilterError> {
        if is_identifier(column) {
            Ok(())
        } else {
            Err(FilterError::InvalidColumn(format!("Invalid column name format: {}", column)))
        }
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap().and_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn absent_values_emit_nothing() {
        let mut w = FilterWhere::new("p");
        w.eq::<i32>("category_id", None).unwrap();
        w.ilike("name", None).unwrap();
        w.on_date("created_at", None).unwrap();
        let (sql, params) = w.generate(0);
        assert!(w.is_empty());
        assert_eq!(sql, "");
        assert!(params.is_empty());
    }

    #[test]
    fn predicates_are_joined_with_and_in_order() {
        let mut w = FilterWhere::new("p");
        w.ilike("name", Some("chair")).unwrap();
        w.eq("category_id", Some(3)).unwrap();
        w.eq("is_active", Some(true)).unwrap();
        let (sql, params) = w.generate(0);
        assert_eq!(sql, "p.\"name\" ILIKE $1 AND p.\"category_id\" = $2 AND p.\"is_active\" = $3");
        assert_eq!(
            params,
            vec![FilterValue::Text("%chair%".into()), FilterValue::Int(3), FilterValue::Bool(true)]
        );
    }

    #[test]
    fn ilike_escapes_pattern_characters_and_ignores_blank() {
        let mut w = FilterWhere::new("c");
        w.ilike("email", Some("50%_off\\")).unwrap();
        w.ilike("phone", Some("   ")).unwrap();
        let (_, params) = w.generate(0);
        assert_eq!(params, vec![FilterValue::Text("%50\\%\\_off\\\\%".into())]);
    }

    #[test]
    fn midnight_dates_compare_by_day() {
        let mut w = FilterWhere::new("o");
        w.on_date("order_date", Some(at(0, 0))).unwrap();
        let (sql, params) = w.generate(0);
        assert_eq!(sql, "CAST(o.\"order_date\" AS DATE) = CAST($1 AS DATE)");
        assert_eq!(params, vec![FilterValue::Timestamp(at(0, 0))]);
    }

    #[test]
    fn timestamps_with_time_compare_exactly() {
        let mut w = FilterWhere::new("o");
        w.on_date("order_date", Some(at(14, 30))).unwrap();
        let (sql, _) = w.generate(0);
        assert_eq!(sql, "o.\"order_date\" = $1");
    }

    #[test]
    fn parameter_numbering_honours_offset() {
        let mut w = FilterWhere::new("o");
        w.eq("customer_id", Some(7)).unwrap();
        let (sql, _) = w.generate(2);
        assert_eq!(sql, "o.\"customer_id\" = $3");
    }

    #[test]
    fn rejects_unsafe_column_names() {
        let mut w = FilterWhere::new("p");
        assert!(w.eq("name\"; DROP TABLE products; --", Some(1)).is_err());
        assert!(w.ilike("1name", Some("x")).is_err());
        assert!(is_identifier("stock_quantity"));
        assert!(!is_identifier(""));
    }
}
