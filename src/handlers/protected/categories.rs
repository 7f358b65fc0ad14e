use axum::{extract::State, Extension};

use crate::app::AppState;
use crate::database::models::{Category, NewCategory, UpdateCategory};
use crate::middleware::{ApiResponse, ApiResult, AuthUser, JsonBody, PathParams};
use crate::services::CategoryService;

/// POST /api/categories
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    JsonBody(input): JsonBody<NewCategory>,
) -> ApiResult<Category> {
    user.require_staff()?;
    let category = CategoryService::new(state.pool).create(&input).await?;
    Ok(ApiResponse::created(category))
}

/// PUT /api/categories/:id - Partial update; absent fields are kept
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    PathParams(id): PathParams<i32>,
    JsonBody(input): JsonBody<UpdateCategory>,
) -> ApiResult<Category> {
    user.require_staff()?;
    let category = CategoryService::new(state.pool).update(id, &input).await?;
    Ok(ApiResponse::success(category))
}

/// DELETE /api/categories/:id - Soft delete
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    PathParams(id): PathParams<i32>,
) -> ApiResult<()> {
    user.require_staff()?;
    CategoryService::new(state.pool).deactivate(id).await?;
    Ok(ApiResponse::<()>::no_content())
}
