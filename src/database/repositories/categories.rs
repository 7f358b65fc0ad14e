use sqlx::PgPool;

use super::not_found;
use crate::database::manager::DatabaseError;
use crate::database::models::{Category, CategoryFilter, NewCategory, UpdateCategory};
use crate::database::query_builder;
use crate::filter::{Filter, FilterError, Page, PageRequest};

pub struct CategoryRepository {
    pool: PgPool,
}

impl CategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub(crate) fn filter(criteria: &CategoryFilter) -> Result<Filter, FilterError> {
        let mut filter = Filter::new("categories", "c")?.primary_key("category_id")?;
        filter
            .ilike("name", criteria.name.as_deref())?
            .eq("is_active", criteria.is_active)?;
        Ok(filter)
    }

    pub async fn list(&self, criteria: &CategoryFilter, page: &PageRequest) -> Result<Page<Category>, DatabaseError> {
        let filter = Self::filter(criteria)?;
        query_builder::fetch_page(&self.pool, &filter, page).await
    }

    pub async fn find(&self, id: i32) -> Result<Category, DatabaseError> {
        sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE category_id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found("Category", id))
    }

    pub async fn create(&self, input: &NewCategory) -> Result<Category, DatabaseError> {
        let category = sqlx::query_as::<_, Category>(
            "INSERT INTO categories (name, description) VALUES ($1, $2) RETURNING *",
        )
        .bind(&input.name)
        .bind(&input.description)
        .fetch_one(&self.pool)
        .await?;
        Ok(category)
    }

    pub async fn update(&self, id: i32, input: &UpdateCategory) -> Result<Category, DatabaseError> {
        sqlx::query_as::<_, Category>(
            "UPDATE categories SET \
                name = COALESCE($2, name), \
                description = COALESCE($3, description), \
                is_active = COALESCE($4, is_active) \
             WHERE category_id = $1 RETURNING *",
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.is_active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found("Category", id))
    }

    pub async fn deactivate(&self, id: i32) -> Result<(), DatabaseError> {
        super::deactivate(&self.pool, "categories", "category_id", id, "Category").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_criteria_produce_no_where_clause() {
        let filter = CategoryRepository::filter(&CategoryFilter::default()).unwrap();
        assert_eq!(filter.to_count_sql().query, "SELECT COUNT(*) AS count FROM \"categories\" c");
    }

    #[test]
    fn name_and_active_flag_become_predicates() {
        let criteria = CategoryFilter { name: Some("garden".into()), is_active: Some(true) };
        let sql = CategoryRepository::filter(&criteria).unwrap().to_count_sql();
        assert!(sql.query.ends_with("WHERE c.\"name\" ILIKE $1 AND c.\"is_active\" = $2"));
        assert_eq!(sql.params.len(), 2);
    }
}
