use axum::extract::State;

use crate::app::AppState;
use crate::database::models::{Category, CategoryFilter, ProductFilter, ProductWithImages};
use crate::filter::{PageQuery, PagedResponse};
use crate::middleware::{ApiResponse, ApiResult, PathParams, QueryParams};
use crate::services::{CategoryService, ProductService};

/// GET /api/products - Paged product list with images
///
/// Query: `pageNumber`, `pageSize`, `name`, `categoryId`, `isActive`.
///
/// Expected Output:
/// ```json
/// {
///   "TotalCount": 42,
///   "PageNumber": 1,
///   "PageSize": 20,
///   "Products": [{ "ProductId": 1, "Name": "Desk Lamp", "Images": [] }]
/// }
/// ```
pub async fn product_list(
    State(state): State<AppState>,
    QueryParams(paging): QueryParams<PageQuery>,
    QueryParams(criteria): QueryParams<ProductFilter>,
) -> ApiResult<PagedResponse<ProductWithImages>> {
    let page = ProductService::new(state.pool).list(&criteria, paging).await?;
    Ok(ApiResponse::success(page))
}

/// GET /api/products/:id
pub async fn product_get(State(state): State<AppState>, PathParams(id): PathParams<i32>) -> ApiResult<ProductWithImages> {
    let product = ProductService::new(state.pool).get(id).await?;
    Ok(ApiResponse::success(product))
}

/// GET /api/categories - Query: `pageNumber`, `pageSize`, `name`, `isActive`
pub async fn category_list(
    State(state): State<AppState>,
    QueryParams(paging): QueryParams<PageQuery>,
    QueryParams(criteria): QueryParams<CategoryFilter>,
) -> ApiResult<PagedResponse<Category>> {
    let page = CategoryService::new(state.pool).list(&criteria, paging).await?;
    Ok(ApiResponse::success(page))
}

/// GET /api/categories/:id
pub async fn category_get(State(state): State<AppState>, PathParams(id): PathParams<i32>) -> ApiResult<Category> {
    let category = CategoryService::new(state.pool).get(id).await?;
    Ok(ApiResponse::success(category))
}
