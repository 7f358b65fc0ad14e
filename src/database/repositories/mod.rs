//! One repository per entity. Each owns a pool handle, builds its `Filter`
//! from the entity's query-string filter and returns typed rows.

pub mod categories;
pub mod customers;
pub mod employees;
pub mod orders;
pub mod products;

pub use categories::CategoryRepository;
pub use customers::CustomerRepository;
pub use employees::EmployeeRepository;
pub use orders::OrderRepository;
pub use products::ProductRepository;

use sqlx::PgPool;

use crate::database::manager::DatabaseError;

/// Soft delete: flips `is_active` off and reports a missing row as NotFound.
pub(crate) async fn deactivate(
    pool: &PgPool,
    table: &'static str,
    primary_key: &'static str,
    id: i32,
    entity: &str,
) -> Result<(), DatabaseError> {
    let sql = format!("UPDATE {} SET is_active = FALSE WHERE {} = $1", table, primary_key);
    let result = sqlx::query(&sql).bind(id).execute(pool).await?;
    if result.rows_affected() == 0 {
        return Err(not_found(entity, id));
    }
    Ok(())
}

pub(crate) fn not_found(entity: &str, id: i32) -> DatabaseError {
    DatabaseError::NotFound(format!("{} {} not found", entity, id))
}
