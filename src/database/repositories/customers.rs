use sqlx::PgPool;

use super::not_found;
use crate::database::manager::DatabaseError;
use crate::database::models::{
    Customer, CustomerCredentials, CustomerFilter, NewCustomer, UpdateCustomer, CUSTOMER_COLUMNS,
};
use crate::database::query_builder;
use crate::filter::{Filter, FilterError, Page, PageRequest};

pub struct CustomerRepository {
    pool: PgPool,
}

impl CustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub(crate) fn filter(criteria: &CustomerFilter) -> Result<Filter, FilterError> {
        let columns: Vec<&str> = CUSTOMER_COLUMNS.split(", ").collect();
        let mut filter = Filter::new("customers", "cu")?
            .primary_key("customer_id")?
            .columns(&columns)?;
        filter
            .ilike("first_name", criteria.name.as_deref())?
            .ilike("last_name", criteria.last_name.as_deref())?
            .ilike("email", criteria.email.as_deref())?
            .ilike("phone", criteria.phone.as_deref())?
            .eq("is_active", criteria.is_active)?
            .on_date("created_at", criteria.created_at)?;
        Ok(filter)
    }

    pub async fn list(&self, criteria: &CustomerFilter, page: &PageRequest) -> Result<Page<Customer>, DatabaseError> {
        let filter = Self::filter(criteria)?;
        query_builder::fetch_page(&self.pool, &filter, page).await
    }

    pub async fn find(&self, id: i32) -> Result<Customer, DatabaseError> {
        let sql = format!("SELECT {} FROM customers WHERE customer_id = $1", CUSTOMER_COLUMNS);
        sqlx::query_as::<_, Customer>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found("Customer", id))
    }

    /// `password_hash` is an argon2 PHC string, never the plain password
    pub async fn create(&self, input: &NewCustomer, password_hash: &str) -> Result<Customer, DatabaseError> {
        let sql = format!(
            "INSERT INTO customers (first_name, last_name, email, phone, address, password_hash) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            CUSTOMER_COLUMNS
        );
        let customer = sqlx::query_as::<_, Customer>(&sql)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(&input.email)
            .bind(&input.phone)
            .bind(&input.address)
            .bind(password_hash)
            .fetch_one(&self.pool)
            .await?;
        Ok(customer)
    }

    pub async fn update(&self, id: i32, input: &UpdateCustomer) -> Result<Customer, DatabaseError> {
        let sql = format!(
            "UPDATE customers SET \
                first_name = COALESCE($2, first_name), \
                last_name = COALESCE($3, last_name), \
                email = COALESCE($4, email), \
                phone = COALESCE($5, phone), \
                address = COALESCE($6, address), \
                is_active = COALESCE($7, is_active) \
             WHERE customer_id = $1 RETURNING {}",
            CUSTOMER_COLUMNS
        );
        sqlx::query_as::<_, Customer>(&sql)
            .bind(id)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(&input.email)
            .bind(&input.phone)
            .bind(&input.address)
            .bind(input.is_active)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found("Customer", id))
    }

    pub async fn deactivate(&self, id: i32) -> Result<(), DatabaseError> {
        super::deactivate(&self.pool, "customers", "customer_id", id, "Customer").await
    }

    /// `login` may be the email (case-insensitive) or the phone number
    pub async fn find_credentials_by_login(&self, login: &str) -> Result<Option<CustomerCredentials>, DatabaseError> {
        let credentials = sqlx::query_as::<_, CustomerCredentials>(
            "SELECT customer_id, email, phone, password_hash, is_active FROM customers \
             WHERE LOWER(email) = LOWER($1) OR phone = $1 \
             ORDER BY customer_id ASC LIMIT 1",
        )
        .bind(login)
        .fetch_optional(&self.pool)
        .await?;
        Ok(credentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterValue;
    use chrono::NaiveDate;

    #[test]
    fn name_filters_first_name_and_date_filters_by_day() {
        let criteria = CustomerFilter {
            name: Some("ada".into()),
            created_at: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap().and_hms_opt(0, 0, 0),
            ..Default::default()
        };
        let sql = CustomerRepository::filter(&criteria).unwrap().to_count_sql();
        assert!(sql.query.contains("cu.\"first_name\" ILIKE $1"));
        assert!(sql.query.contains("CAST(cu.\"created_at\" AS DATE) = CAST($2 AS DATE)"));
        assert_eq!(sql.params[0], FilterValue::Text("%ada%".into()));
    }

    #[test]
    fn page_query_never_selects_the_password_hash() {
        let page = PageRequest::with_max(1, 10, 100).unwrap();
        let sql = CustomerRepository::filter(&CustomerFilter::default()).unwrap().to_page_sql(&page);
        assert!(sql.query.starts_with("SELECT cu.\"customer_id\", cu.\"first_name\""));
        assert!(!sql.query.contains("password_hash"));
        assert!(!sql.query.contains("cu.*"));
    }
}
