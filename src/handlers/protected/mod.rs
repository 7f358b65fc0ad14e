//! Routes behind `jwt_auth_middleware`. Every handler receives the caller
//! as `Extension<AuthUser>` and applies its role gate first.

pub mod categories;
pub mod customers;
pub mod employees;
pub mod orders;
pub mod products;

use axum::Extension;

use crate::middleware::{ApiResponse, ApiResult, AuthUser};

/// GET /api/auth/whoami - The caller as read from the token
pub async fn whoami(Extension(user): Extension<AuthUser>) -> ApiResult<AuthUser> {
    Ok(ApiResponse::success(user))
}
