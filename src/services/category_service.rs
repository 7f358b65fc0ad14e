use sqlx::PgPool;
use validator::Validate;

use super::{positive_id, ServiceResult};
use crate::database::models::{Category, CategoryFilter, NewCategory, UpdateCategory};
use crate::database::CategoryRepository;
use crate::filter::{PageQuery, PagedResponse};

pub struct CategoryService {
    repo: CategoryRepository,
}

impl CategoryService {
    pub fn new(pool: PgPool) -> Self {
        Self { repo: CategoryRepository::new(pool) }
    }

    pub async fn list(&self, criteria: &CategoryFilter, paging: PageQuery) -> ServiceResult<PagedResponse<Category>> {
        let page = paging.to_request()?;
        let rows = self.repo.list(criteria, &page).await?;
        Ok(rows.into_response(&page, "Categories"))
    }

    pub async fn get(&self, id: i32) -> ServiceResult<Category> {
        Ok(self.repo.find(positive_id("id", id)?).await?)
    }

    pub async fn create(&self, input: &NewCategory) -> ServiceResult<Category> {
        input.validate()?;
        Ok(self.repo.create(input).await?)
    }

    pub async fn update(&self, id: i32, input: &UpdateCategory) -> ServiceResult<Category> {
        let id = positive_id("id", id)?;
        input.validate()?;
        Ok(self.repo.update(id, input).await?)
    }

    pub async fn deactivate(&self, id: i32) -> ServiceResult<()> {
        Ok(self.repo.deactivate(positive_id("id", id)?).await?)
    }
}
