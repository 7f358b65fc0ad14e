use sqlx::PgPool;
use validator::Validate;

use super::{positive_filter_id, positive_id, ServiceResult};
use crate::database::models::{NewProduct, ProductFilter, ProductWithImages, UpdateProduct};
use crate::database::ProductRepository;
use crate::filter::{PageQuery, PagedResponse};

pub struct ProductService {
    repo: ProductRepository,
}

impl ProductService {
    pub fn new(pool: PgPool) -> Self {
        Self { repo: ProductRepository::new(pool) }
    }

    pub async fn list(
        &self,
        criteria: &ProductFilter,
        paging: PageQuery,
    ) -> ServiceResult<PagedResponse<ProductWithImages>> {
        positive_filter_id("categoryId", criteria.category_id)?;
        let page = paging.to_request()?;
        let rows = self.repo.list(criteria, &page).await?;
        Ok(rows.into_response(&page, "Products"))
    }

    pub async fn get(&self, id: i32) -> ServiceResult<ProductWithImages> {
        Ok(self.repo.find(positive_id("id", id)?).await?)
    }

    pub async fn create(&self, input: &NewProduct) -> ServiceResult<ProductWithImages> {
        input.validate()?;
        Ok(self.repo.create(input).await?)
    }

    pub async fn update(&self, id: i32, input: &UpdateProduct) -> ServiceResult<ProductWithImages> {
        let id = positive_id("id", id)?;
        input.validate()?;
        Ok(self.repo.update(id, input).await?)
    }

    pub async fn deactivate(&self, id: i32) -> ServiceResult<()> {
        Ok(self.repo.deactivate(positive_id("id", id)?).await?)
    }
}
