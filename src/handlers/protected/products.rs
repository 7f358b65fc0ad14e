use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    Extension,
};

use crate::app::AppState;
use crate::database::models::{NewProduct, ProductImage, ProductWithImages, UpdateProduct};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, JsonBody, PathParams};
use crate::services::{ImageService, ProductService};

/// POST /api/products
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    JsonBody(input): JsonBody<NewProduct>,
) -> ApiResult<ProductWithImages> {
    user.require_staff()?;
    let product = ProductService::new(state.pool).create(&input).await?;
    Ok(ApiResponse::created(product))
}

/// PUT /api/products/:id - Partial update; absent fields are kept
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    PathParams(id): PathParams<i32>,
    JsonBody(input): JsonBody<UpdateProduct>,
) -> ApiResult<ProductWithImages> {
    user.require_staff()?;
    let product = ProductService::new(state.pool).update(id, &input).await?;
    Ok(ApiResponse::success(product))
}

/// DELETE /api/products/:id - Soft delete; images stay attached
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    PathParams(id): PathParams<i32>,
) -> ApiResult<()> {
    user.require_staff()?;
    ProductService::new(state.pool).deactivate(id).await?;
    Ok(ApiResponse::<()>::no_content())
}

/// POST /api/products/:id/images - Upload one image
///
/// Content-Type: multipart/form-data with a single `file` field
/// (jpeg, png, webp or gif).
pub async fn upload_image(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    PathParams(id): PathParams<i32>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<ProductImage> {
    user.require_staff()?;
    let mut multipart = multipart.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field.content_type().unwrap_or("application/octet-stream").to_string();
        let bytes = field.bytes().await.map_err(multipart_error)?;
        upload = Some((file_name, content_type, bytes.to_vec()));
        break;
    }

    let Some((file_name, content_type, bytes)) = upload else {
        return Err(ApiError::field_error("file", "Multipart field 'file' is required"));
    };

    let image = ImageService::new(state.pool, state.images)
        .upload(id, bytes, &file_name, &content_type)
        .await?;
    Ok(ApiResponse::created(image))
}

/// DELETE /api/products/:id/images/:image_id
pub async fn delete_image(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    PathParams((id, image_id)): PathParams<(i32, i32)>,
) -> ApiResult<()> {
    user.require_staff()?;
    ImageService::new(state.pool, state.images).remove(id, image_id).await?;
    Ok(ApiResponse::<()>::no_content())
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge("Image exceeds the upload size limit".to_string())
    } else {
        ApiError::bad_request(err.body_text())
    }
}
