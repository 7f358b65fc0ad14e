use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;

/// Successful response: the serialized body plus a status code.
///
/// Bodies go out as-is (no wrapper) so list responses are exactly the
/// paging envelope.
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub status_code: Option<StatusCode>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a successful API response with default 200 status
    pub fn success(data: T) -> Self {
        Self { data, status_code: None }
    }

    pub fn with_status(data: T, status_code: StatusCode) -> Self {
        Self { data, status_code: Some(status_code) }
    }

    pub fn created(data: T) -> Self {
        Self::with_status(data, StatusCode::CREATED)
    }

    /// Create a 204 No Content response (data will be ignored)
    pub fn no_content() -> ApiResponse<()> {
        ApiResponse::with_status((), StatusCode::NO_CONTENT)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status_code.unwrap_or(StatusCode::OK);

        // For 204 No Content, return empty response
        if status == StatusCode::NO_CONTENT {
            return status.into_response();
        }

        (status, Json(self.data)).into_response()
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, crate::error::ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses() {
        assert_eq!(ApiResponse::success(1).into_response().status(), StatusCode::OK);
        assert_eq!(ApiResponse::created(1).into_response().status(), StatusCode::CREATED);
        assert_eq!(ApiResponse::<()>::no_content().into_response().status(), StatusCode::NO_CONTENT);
    }
}
