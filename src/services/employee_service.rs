use sqlx::PgPool;
use validator::Validate;

use super::{positive_id, ServiceResult};
use crate::auth::password;
use crate::database::models::{Employee, EmployeeFilter, NewEmployee, UpdateEmployee};
use crate::database::EmployeeRepository;
use crate::filter::{PageQuery, PagedResponse};

pub struct EmployeeService {
    repo: EmployeeRepository,
}

impl EmployeeService {
    pub fn new(pool: PgPool) -> Self {
        Self { repo: EmployeeRepository::new(pool) }
    }

    pub async fn list(&self, criteria: &EmployeeFilter, paging: PageQuery) -> ServiceResult<PagedResponse<Employee>> {
        let page = paging.to_request()?;
        let rows = self.repo.list(criteria, &page).await?;
        Ok(rows.into_response(&page, "Employees"))
    }

    pub async fn get(&self, id: i32) -> ServiceResult<Employee> {
        Ok(self.repo.find(positive_id("id", id)?).await?)
    }

    pub async fn create(&self, input: &NewEmployee) -> ServiceResult<Employee> {
        input.validate()?;
        let hash = password::hash_password_blocking(input.password.clone()).await?;
        let employee = self.repo.create(input, &hash).await?;
        tracing::info!("Created employee {} with role {}", employee.employee_id, employee.role);
        Ok(employee)
    }

    pub async fn update(&self, id: i32, input: &UpdateEmployee) -> ServiceResult<Employee> {
        let id = positive_id("id", id)?;
        input.validate()?;
        Ok(self.repo.update(id, input).await?)
    }

    pub async fn deactivate(&self, id: i32) -> ServiceResult<()> {
        Ok(self.repo.deactivate(positive_id("id", id)?).await?)
    }

    pub async fn has_admin(&self) -> ServiceResult<bool> {
        Ok(self.repo.any_admin().await?)
    }
}
