use sqlx::PgPool;
use validator::Validate;

use super::{positive_id, ServiceResult};
use crate::auth::password;
use crate::database::models::{Customer, CustomerFilter, NewCustomer, UpdateCustomer};
use crate::database::CustomerRepository;
use crate::filter::{PageQuery, PagedResponse};

pub struct CustomerService {
    repo: CustomerRepository,
}

impl CustomerService {
    pub fn new(pool: PgPool) -> Self {
        Self { repo: CustomerRepository::new(pool) }
    }

    pub async fn list(&self, criteria: &CustomerFilter, paging: PageQuery) -> ServiceResult<PagedResponse<Customer>> {
        let page = paging.to_request()?;
        let rows = self.repo.list(criteria, &page).await?;
        Ok(rows.into_response(&page, "Customers"))
    }

    pub async fn get(&self, id: i32) -> ServiceResult<Customer> {
        Ok(self.repo.find(positive_id("id", id)?).await?)
    }

    /// Registration: the password is hashed before it reaches the database
    pub async fn register(&self, input: &NewCustomer) -> ServiceResult<Customer> {
        input.validate()?;
        let hash = password::hash_password_blocking(input.password.clone()).await?;
        let customer = self.repo.create(input, &hash).await?;
        tracing::info!("Registered customer {}", customer.customer_id);
        Ok(customer)
    }

    pub async fn update(&self, id: i32, input: &UpdateCustomer) -> ServiceResult<Customer> {
        let id = positive_id("id", id)?;
        input.validate()?;
        Ok(self.repo.update(id, input).await?)
    }

    pub async fn deactivate(&self, id: i32) -> ServiceResult<()> {
        Ok(self.repo.deactivate(positive_id("id", id)?).await?)
    }
}
