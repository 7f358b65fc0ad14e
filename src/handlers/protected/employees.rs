use axum::{extract::State, Extension};

use crate::app::AppState;
use crate::database::models::{Employee, EmployeeFilter, NewEmployee, UpdateEmployee};
use crate::filter::{PageQuery, PagedResponse};
use crate::middleware::{ApiResponse, ApiResult, AuthUser, JsonBody, PathParams, QueryParams};
use crate::services::EmployeeService;

/// GET /api/employees - Query: `pageNumber`, `pageSize`, `firstName`,
/// `lastName`, `email`, `role`, `isActive`, `hireDate`
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    QueryParams(paging): QueryParams<PageQuery>,
    QueryParams(criteria): QueryParams<EmployeeFilter>,
) -> ApiResult<PagedResponse<Employee>> {
    user.require_staff()?;
    let page = EmployeeService::new(state.pool).list(&criteria, paging).await?;
    Ok(ApiResponse::success(page))
}

/// GET /api/employees/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    PathParams(id): PathParams<i32>,
) -> ApiResult<Employee> {
    user.require_staff()?;
    let employee = EmployeeService::new(state.pool).get(id).await?;
    Ok(ApiResponse::success(employee))
}

/// POST /api/employees - Admin only
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    JsonBody(input): JsonBody<NewEmployee>,
) -> ApiResult<Employee> {
    user.require_admin()?;
    let employee = EmployeeService::new(state.pool).create(&input).await?;
    Ok(ApiResponse::created(employee))
}

/// PUT /api/employees/:id - Admin only
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    PathParams(id): PathParams<i32>,
    JsonBody(input): JsonBody<UpdateEmployee>,
) -> ApiResult<Employee> {
    user.require_admin()?;
    let employee = EmployeeService::new(state.pool).update(id, &input).await?;
    Ok(ApiResponse::success(employee))
}

/// DELETE /api/employees/:id - Admin only, soft delete
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    PathParams(id): PathParams<i32>,
) -> ApiResult<()> {
    user.require_admin()?;
    EmployeeService::new(state.pool).deactivate(id).await?;
    Ok(ApiResponse::<()>::no_content())
}
