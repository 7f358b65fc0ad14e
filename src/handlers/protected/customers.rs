use axum::{extract::State, Extension};

use crate::app::AppState;
use crate::database::models::{Customer, CustomerFilter, UpdateCustomer};
use crate::error::ApiError;
use crate::filter::{PageQuery, PagedResponse};
use crate::middleware::{ApiResponse, ApiResult, AuthUser, JsonBody, PathParams, QueryParams};
use crate::services::CustomerService;

/// GET /api/customers - Staff only
///
/// Query: `pageNumber`, `pageSize`, `name` (first name), `lastName`,
/// `email`, `phone`, `isActive`, `createdAt` (a bare date matches the whole
/// day).
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    QueryParams(paging): QueryParams<PageQuery>,
    QueryParams(criteria): QueryParams<CustomerFilter>,
) -> ApiResult<PagedResponse<Customer>> {
    user.require_staff()?;
    let page = CustomerService::new(state.pool).list(&criteria, paging).await?;
    Ok(ApiResponse::success(page))
}

/// GET /api/customers/:id - The customer themself or staff
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    PathParams(id): PathParams<i32>,
) -> ApiResult<Customer> {
    user.ensure_can_access_customer(id)?;
    let customer = CustomerService::new(state.pool).get(id).await?;
    Ok(ApiResponse::success(customer))
}

/// PUT /api/customers/:id - The customer themself or staff
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    PathParams(id): PathParams<i32>,
    JsonBody(input): JsonBody<UpdateCustomer>,
) -> ApiResult<Customer> {
    user.ensure_can_access_customer(id)?;
    if input.is_active.is_some() && !user.is_staff() {
        return Err(ApiError::forbidden("Only staff can change account status"));
    }
    let customer = CustomerService::new(state.pool).update(id, &input).await?;
    Ok(ApiResponse::success(customer))
}

/// DELETE /api/customers/:id - Admin only, soft delete
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    PathParams(id): PathParams<i32>,
) -> ApiResult<()> {
    user.require_admin()?;
    CustomerService::new(state.pool).deactivate(id).await?;
    Ok(ApiResponse::<()>::no_content())
}
