use axum::{extract::State, Extension};

use crate::app::AppState;
use crate::database::models::{NewOrder, OrderFilter, OrderWithItems, UpdateOrderStatus};
use crate::error::ApiError;
use crate::filter::{PageQuery, PagedResponse};
use crate::middleware::{ApiResponse, ApiResult, AuthUser, JsonBody, PathParams, QueryParams};
use crate::services::OrderService;

/// GET /api/orders - Orders with their line items
///
/// Query: `pageNumber`, `pageSize`, `customerId`, `employeeId`, `status`,
/// `isActive`, `orderDate`, `shippedDate`. Customers only ever see their own
/// orders; a `customerId` they pass is overridden.
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    QueryParams(paging): QueryParams<PageQuery>,
    QueryParams(mut criteria): QueryParams<OrderFilter>,
) -> ApiResult<PagedResponse<OrderWithItems>> {
    if !user.is_staff() {
        criteria.customer_id = Some(user.id);
    }
    let page = OrderService::new(state.pool).list(&criteria, paging).await?;
    Ok(ApiResponse::success(page))
}

/// GET /api/orders/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    PathParams(id): PathParams<i32>,
) -> ApiResult<OrderWithItems> {
    let order = OrderService::new(state.pool).get(id).await?;
    user.ensure_can_access_customer(order.order.customer_id)?;
    Ok(ApiResponse::success(order))
}

/// POST /api/orders - Place an order
///
/// Customers order for themselves. Staff must name the customer in
/// `CustomerId`.
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    JsonBody(input): JsonBody<NewOrder>,
) -> ApiResult<OrderWithItems> {
    let customer_id = if user.is_staff() {
        input
            .customer_id
            .ok_or_else(|| ApiError::field_error("CustomerId", "CustomerId is required when staff place an order"))?
    } else {
        user.id
    };
    let order = OrderService::new(state.pool).create(customer_id, &input).await?;
    Ok(ApiResponse::created(order))
}

/// PUT /api/orders/:id/status - Staff only
pub async fn update_status(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    PathParams(id): PathParams<i32>,
    JsonBody(input): JsonBody<UpdateOrderStatus>,
) -> ApiResult<OrderWithItems> {
    user.require_staff()?;
    let order = OrderService::new(state.pool).update_status(id, &input).await?;
    Ok(ApiResponse::success(order))
}

/// DELETE /api/orders/:id - Cancel a pending or processing order and
/// return its stock
pub async fn cancel(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    PathParams(id): PathParams<i32>,
) -> ApiResult<OrderWithItems> {
    let service = OrderService::new(state.pool);
    if !user.is_staff() {
        let order = service.get(id).await?;
        user.ensure_can_access_customer(order.order.customer_id)?;
    }
    let order = service.cancel(id).await?;
    Ok(ApiResponse::success(order))
}
