use sqlx::PgPool;

use super::not_found;
use crate::database::manager::DatabaseError;
use crate::database::models::{
    Employee, EmployeeCredentials, EmployeeFilter, NewEmployee, UpdateEmployee, EMPLOYEE_COLUMNS,
};
use crate::database::query_builder;
use crate::filter::{Filter, FilterError, Page, PageRequest};

pub struct EmployeeRepository {
    pool: PgPool,
}

impl EmployeeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub(crate) fn filter(criteria: &EmployeeFilter) -> Result<Filter, FilterError> {
        let columns: Vec<&str> = EMPLOYEE_COLUMNS.split(", ").collect();
        let mut filter = Filter::new("employees", "e")?
            .primary_key("employee_id")?
            .columns(&columns)?;
        filter
            .ilike("first_name", criteria.first_name.as_deref())?
            .ilike("last_name", criteria.last_name.as_deref())?
            .ilike("email", criteria.email.as_deref())?
            .eq("role", criteria.role.map(|r| r.as_str()))?
            .eq("is_active", criteria.is_active)?
            .on_date("hire_date", criteria.hire_date)?;
        Ok(filter)
    }

    pub async fn list(&self, criteria: &EmployeeFilter, page: &PageRequest) -> Result<Page<Employee>, DatabaseError> {
        let filter = Self::filter(criteria)?;
        query_builder::fetch_page(&self.pool, &filter, page).await
    }

    pub async fn find(&self, id: i32) -> Result<Employee, DatabaseError> {
        let sql = format!("SELECT {} FROM employees WHERE employee_id = $1", EMPLOYEE_COLUMNS);
        sqlx::query_as::<_, Employee>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found("Employee", id))
    }

    /// Hire date defaults to the current time when not given
    pub async fn create(&self, input: &NewEmployee, password_hash: &str) -> Result<Employee, DatabaseError> {
        let sql = format!(
            "INSERT INTO employees (first_name, last_name, email, phone, role, hire_date, password_hash) \
             VALUES ($1, $2, $3, $4, $5, COALESCE($6, LOCALTIMESTAMP), $7) RETURNING {}",
            EMPLOYEE_COLUMNS
        );
        let employee = sqlx::query_as::<_, Employee>(&sql)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(&input.email)
            .bind(&input.phone)
            .bind(input.role.as_str())
            .bind(input.hire_date)
            .bind(password_hash)
            .fetch_one(&self.pool)
            .await?;
        Ok(employee)
    }

    pub async fn update(&self, id: i32, input: &UpdateEmployee) -> Result<Employee, DatabaseError> {
        let sql = format!(
            "UPDATE employees SET \
                first_name = COALESCE($2, first_name), \
                last_name = COALESCE($3, last_name), \
                email = COALESCE($4, email), \
                phone = COALESCE($5, phone), \
                role = COALESCE($6, role), \
                is_active = COALESCE($7, is_active) \
             WHERE employee_id = $1 RETURNING {}",
            EMPLOYEE_COLUMNS
        );
        sqlx::query_as::<_, Employee>(&sql)
            .bind(id)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(&input.email)
            .bind(&input.phone)
            .bind(input.role.map(|r| r.as_str()))
            .bind(input.is_active)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found("Employee", id))
    }

    pub async fn deactivate(&self, id: i32) -> Result<(), DatabaseError> {
        super::deactivate(&self.pool, "employees", "employee_id", id, "Employee").await
    }

    pub async fn find_credentials_by_login(&self, login: &str) -> Result<Option<EmployeeCredentials>, DatabaseError> {
        let credentials = sqlx::query_as::<_, EmployeeCredentials>(
            "SELECT employee_id, email, phone, role, password_hash, is_active FROM employees \
             WHERE LOWER(email) = LOWER($1) OR phone = $1 \
             ORDER BY employee_id ASC LIMIT 1",
        )
        .bind(login)
        .fetch_optional(&self.pool)
        .await?;
        Ok(credentials)
    }

    pub async fn any_admin(&self) -> Result<bool, DatabaseError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM employees WHERE role = 'Admin' AND is_active)")
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }
}
