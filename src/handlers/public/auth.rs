use axum::extract::State;

use crate::app::AppState;
use crate::database::models::NewCustomer;
use crate::middleware::{ApiResponse, ApiResult, JsonBody};
use crate::services::{AuthService, LoginRequest, LoginResponse};

/// POST /auth/login/customer - Exchange customer credentials for a JWT
///
/// Expected Input:
/// ```json
/// { "login": "ada@example.com", "password": "..." }
/// ```
///
/// Expected Output:
/// ```json
/// {
///   "token": "eyJhbGciOiJIUzI1NiI...",
///   "token_type": "Bearer",
///   "expires_in": 86400,
///   "user": { "id": 7, "email": "ada@example.com", "phone": null, "role": "Customer" }
/// }
/// ```
pub async fn login_customer(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let response = AuthService::new(state.pool).login_customer(&request).await?;
    Ok(ApiResponse::success(response))
}

/// POST /auth/login/employee - Same exchange for staff accounts; the token
/// carries the employee's role.
pub async fn login_employee(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let response = AuthService::new(state.pool).login_employee(&request).await?;
    Ok(ApiResponse::success(response))
}

/// POST /auth/register - Create a customer account and sign it in
pub async fn register(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<NewCustomer>,
) -> ApiResult<LoginResponse> {
    let response = AuthService::new(state.pool).register(&input).await?;
    Ok(ApiResponse::created(response))
}
