use sqlx::PgPool;
use validator::Validate;

use super::{positive_filter_id, positive_id, ServiceResult};
use crate::database::models::{NewOrder, OrderFilter, OrderWithItems, UpdateOrderStatus};
use crate::database::OrderRepository;
use crate::filter::{PageQuery, PagedResponse};

pub struct OrderService {
    repo: OrderRepository,
}

impl OrderService {
    pub fn new(pool: PgPool) -> Self {
        Self { repo: OrderRepository::new(pool) }
    }

    pub async fn list(&self, criteria: &OrderFilter, paging: PageQuery) -> ServiceResult<PagedResponse<OrderWithItems>> {
        positive_filter_id("customerId", criteria.customer_id)?;
        positive_filter_id("employeeId", criteria.employee_id)?;
        let page = paging.to_request()?;
        let rows = self.repo.list(criteria, &page).await?;
        Ok(rows.into_response(&page, "Orders"))
    }

    pub async fn get(&self, id: i32) -> ServiceResult<OrderWithItems> {
        Ok(self.repo.find(positive_id("id", id)?).await?)
    }

    /// `customer_id` is resolved by the caller: the token's own id for
    /// customers, the body's `CustomerId` for staff.
    pub async fn create(&self, customer_id: i32, input: &NewOrder) -> ServiceResult<OrderWithItems> {
        let customer_id = positive_id("CustomerId", customer_id)?;
        input.validate()?;
        for item in &input.items {
            item.validate()?;
        }
        Ok(self.repo.create(customer_id, input).await?)
    }

    pub async fn update_status(&self, id: i32, input: &UpdateOrderStatus) -> ServiceResult<OrderWithItems> {
        let id = positive_id("id", id)?;
        input.validate()?;
        Ok(self.repo.update_status(id, input).await?)
    }

    pub async fn cancel(&self, id: i32) -> ServiceResult<OrderWithItems> {
        Ok(self.repo.cancel(positive_id("id", id)?).await?)
    }
}
