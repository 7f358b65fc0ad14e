use chrono::NaiveDateTime;

use super::error::FilterError;
use super::filter_where::{is_identifier, FilterWhere};
use super::pagination::PageRequest;
use super::types::{FilterValue, Join, SqlResult};

/// Count and page SQL for one aliased table.
///
/// The count query and the page query render from the same predicate list,
/// so their parameter bags are identical and `TotalCount` always describes
/// the rows the page was cut from.
#[derive(Debug, Clone)]
pub struct Filter {
    table_name: String,
    primary_key: String,
    columns: Vec<String>,
    where_data: FilterWhere,
}

impl Filter {
    pub fn new(table_name: impl Into<String>, alias: impl Into<String>) -> Result<Self, FilterError> {
        let table_name = table_name.into();
        let alias = alias.into();
        Self::validate_table_name(&table_name)?;
        Self::validate_table_name(&alias)?;
        Ok(Self {
            table_name,
            primary_key: "id".to_string(),
            columns: Vec::new(),
            where_data: FilterWhere::new(alias),
        })
    }

    pub fn primary_key(mut self, column: &str) -> Result<Self, FilterError> {
        if !is_identifier(column) {
            return Err(FilterError::InvalidColumn(format!("Invalid column name format: {}", column)));
        }
        self.primary_key = column.to_string();
        Ok(self)
    }

    /// Restrict the projection; without it every column is selected.
    pub fn columns(mut self, columns: &[&str]) -> Result<Self, FilterError> {
        if let Some(bad) = columns.iter().find(|c| !is_identifier(c)) {
            return Err(FilterError::InvalidColumn(format!("Invalid column name format: {}", bad)));
        }
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        Ok(self)
    }

    pub fn alias(&self) -> &str {
        self.where_data.alias()
    }

    pub fn eq<V: Into<FilterValue>>(&mut self, column: &str, value: Option<V>) -> Result<&mut Self, FilterError> {
        self.where_data.eq(column, value)?;
        Ok(self)
    }

    pub fn ilike(&mut self, column: &str, value: Option<&str>) -> Result<&mut Self, FilterError> {
        self.where_data.ilike(column, value)?;
        Ok(self)
    }

    pub fn on_date(&mut self, column: &str, value: Option<NaiveDateTime>) -> Result<&mut Self, FilterError> {
        self.where_data.on_date(column, value)?;
        Ok(self)
    }

    pub fn to_where_sql(&self) -> SqlResult {
        let (query, params) = self.where_data.generate(0);
        SqlResult { query, params }
    }

    pub fn to_count_sql(&self) -> SqlResult {
        let where_result = self.to_where_sql();
        let query = [
            format!("SELECT COUNT(*) AS count FROM {}", self.from_clause()),
            Self::where_keyword(&where_result.query),
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
        SqlResult { query, params: where_result.params }
    }

    pub fn to_page_sql(&self, page: &PageRequest) -> SqlResult {
        let where_result = self.to_where_sql();
        let alias = self.alias();
        let query = [
            format!("SELECT {} FROM {}", self.select_list(), self.from_clause()),
            Self::where_keyword(&where_result.query),
            format!("ORDER BY {}.\"{}\" ASC", alias, self.primary_key),
            Self::limit_clause(page),
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
        SqlResult { query, params: where_result.params }
    }

    /// Parents filtered (and paged when `page` is given) in a sub-select,
    /// then LEFT JOINed to their children. LIMIT therefore counts parents,
    /// not joined rows.
    pub fn to_join_sql(&self, page: Option<&PageRequest>, join: &Join) -> SqlResult {
        let where_result = self.to_where_sql();
        let alias = self.alias();
        let inner = [
            format!("SELECT {} FROM {}", self.select_list(), self.from_clause()),
            Self::where_keyword(&where_result.query),
            format!("ORDER BY {}.\"{}\" ASC", alias, self.primary_key),
            page.map(Self::limit_clause).unwrap_or_default(),
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        let child_columns = join
            .columns
            .iter()
            .map(|(column, output)| format!("{}.\"{}\" AS \"{}\"", join.alias, column, output))
            .collect::<Vec<_>>();
        let select_list = std::iter::once(format!("{}.*", alias))
            .chain(child_columns)
            .collect::<Vec<_>>()
            .join(", ");

        let query = format!(
            "SELECT {select} FROM ({inner}) {alias} LEFT JOIN \"{child}\" {child_alias} ON {child_alias}.\"{fk}\" = {alias}.\"{pk}\" ORDER BY {alias}.\"{pk}\" ASC, {child_alias}.\"{child_pk}\" ASC",
            select = select_list,
            inner = inner,
            alias = alias,
            child = join.table,
            child_alias = join.alias,
            fk = join.foreign_key,
            pk = self.primary_key,
            child_pk = join.primary_key,
        );
        SqlResult { query, params: where_result.params }
    }

    fn select_list(&self) -> String {
        let alias = self.alias();
        if self.columns.is_empty() {
            return format!("{}.*", alias);
        }
        self.columns
            .iter()
            .map(|c| format!("{}.\"{}\"", alias, c))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn from_clause(&self) -> String {
        format!("\"{}\" {}", self.table_name, self.alias())
    }

    fn where_keyword(where_clause: &str) -> String {
        if where_clause.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", where_clause)
        }
    }

    fn limit_clause(page: &PageRequest) -> String {
        format!("LIMIT {} OFFSET {}", page.page_size(), page.offset())
    }

    fn validate_table_name(name: &str) -> Result<(), FilterError> {
        if name.is_empty() {
            return Err(FilterError::InvalidTableName("Table name cannot be empty".to_string()));
        }
        if !is_identifier(name) {
            return Err(FilterError::InvalidTableName(format!("Invalid table name format: {}", name)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IMAGES: Join = Join {
        table: "product_images",
        alias: "i",
        foreign_key: "product_id",
        primary_key: "image_id",
        columns: &[("image_id", "image_id"), ("url", "image_url")],
    };

    fn products() -> Filter {
        Filter::new("products", "p").unwrap().primary_key("product_id").unwrap()
    }

    #[test]
    fn unfiltered_queries_have_no_where_clause() {
        let filter = products();
        let page = PageRequest::with_max(1, 10, 100).unwrap();
        assert_eq!(filter.to_count_sql().query, "SELECT COUNT(*) AS count FROM \"products\" p");
        assert_eq!(
            filter.to_page_sql(&page).query,
            "SELECT p.* FROM \"products\" p ORDER BY p.\"product_id\" ASC LIMIT 10 OFFSET 0"
        );
    }

    #[test]
    fn count_and_page_share_predicates_and_params() {
        let mut filter = products();
        filter.eq("category_id", Some(3)).unwrap();
        filter.eq("is_active", Some(true)).unwrap();
        let page = PageRequest::with_max(2, 5, 100).unwrap();

        let count = filter.to_count_sql();
        let rows = filter.to_page_sql(&page);
        assert_eq!(
            count.query,
            "SELECT COUNT(*) AS count FROM \"products\" p WHERE p.\"category_id\" = $1 AND p.\"is_active\" = $2"
        );
        assert_eq!(
            rows.query,
            "SELECT p.* FROM \"products\" p WHERE p.\"category_id\" = $1 AND p.\"is_active\" = $2 \
             ORDER BY p.\"product_id\" ASC LIMIT 5 OFFSET 5"
        );
        assert_eq!(count.params, rows.params);
    }

    #[test]
    fn join_query_pages_parents_before_joining() {
        let mut filter = products();
        filter.ilike("name", Some("lamp")).unwrap();
        let page = PageRequest::with_max(1, 20, 100).unwrap();
        let sql = filter.to_join_sql(Some(&page), &IMAGES);
        assert_eq!(
            sql.query,
            "SELECT p.*, i.\"image_id\" AS \"image_id\", i.\"url\" AS \"image_url\" FROM \
             (SELECT p.* FROM \"products\" p WHERE p.\"name\" ILIKE $1 ORDER BY p.\"product_id\" ASC LIMIT 20 OFFSET 0) p \
             LEFT JOIN \"product_images\" i ON i.\"product_id\" = p.\"product_id\" \
             ORDER BY p.\"product_id\" ASC, i.\"image_id\" ASC"
        );
        assert_eq!(sql.params, vec![FilterValue::Text("%lamp%".into())]);
    }

    #[test]
    fn join_lookup_without_page_has_no_limit() {
        let mut filter = products();
        filter.eq("product_id", Some(12)).unwrap();
        let sql = filter.to_join_sql(None, &IMAGES);
        assert!(!sql.query.contains("LIMIT"));
        assert!(sql.query.contains("WHERE p.\"product_id\" = $1"));
    }

    #[test]
    fn explicit_columns_replace_the_star() {
        let filter = products().columns(&["product_id", "name"]).unwrap();
        let page = PageRequest::with_max(1, 10, 100).unwrap();
        assert!(filter
            .to_page_sql(&page)
            .query
            .starts_with("SELECT p.\"product_id\", p.\"name\" FROM \"products\" p"));
        assert!(products().columns(&["name; drop"]).is_err());
    }

    #[test]
    fn validates_table_and_key_names() {
        assert!(Filter::new("", "p").is_err());
        assert!(Filter::new("products; --", "p").is_err());
        assert!(Filter::new("products", "p q").is_err());
        assert!(products().primary_key("id)").is_err());
    }
}
