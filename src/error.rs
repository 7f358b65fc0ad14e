// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::auth::AuthError;
use crate::database::DatabaseError;
use crate::filter::FilterError;
use crate::images::ImageError;
use crate::services::ServiceError;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    ValidationError {
        message: String,
        field_errors: Option<HashMap<String, String>>,
    },
    InvalidJson(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 413 Payload Too Large
    PayloadTooLarge(String),

    // 415 Unsupported Media Type
    UnsupportedMediaType(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 502 Bad Gateway (image host issues)
    BadGateway(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::ValidationError { .. } => StatusCode::BAD_REQUEST,
            ApiError::InvalidJson(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::ValidationError { message, .. } => message,
            ApiError::InvalidJson(msg) => msg,
            ApiError::Unauthorized(msg) => msg,
            ApiError::Forbidden(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::Conflict(msg) => msg,
            ApiError::PayloadTooLarge(msg) => msg,
            ApiError::UnsupportedMediaType(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
            ApiError::BadGateway(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::ValidationError { .. } => "VALIDATION_ERROR",
            ApiError::InvalidJson(_) => "INVALID_JSON",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            ApiError::UnsupportedMediaType(_) => "UNSUPPORTED_MEDIA_TYPE",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::BadGateway(_) => "BAD_GATEWAY",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        let mut response = json!({
            "error": true,
            "message": self.message(),
            "code": self.error_code()
        });
        if let ApiError::ValidationError { field_errors: Some(field_errors), .. } = self {
            response["field_errors"] = json!(field_errors);
        }
        response
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation_error(message: impl Into<String>, field_errors: Option<HashMap<String, String>>) -> Self {
        ApiError::ValidationError { message: message.into(), field_errors }
    }

    /// Validation failure on a single named field
    pub fn field_error(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        let field_errors = HashMap::from([(field.to_string(), message.clone())]);
        ApiError::validation_error(message, Some(field_errors))
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        ApiError::InvalidJson(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        ApiError::BadGateway(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

impl From<FilterError> for ApiError {
    fn from(err: FilterError) -> Self {
        match err {
            FilterError::InvalidPageNumber(msg) => ApiError::field_error("pageNumber", msg),
            FilterError::InvalidPageSize(msg) => ApiError::field_error("pageSize", msg),
            FilterError::OffsetOverflow { .. } => ApiError::field_error("pageNumber", err.to_string()),
            FilterError::InvalidTableName(_) | FilterError::InvalidColumn(_) => {
                // Table and column names are fixed in code, so this is a bug
                tracing::error!("Filter construction error: {}", err);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(msg) => ApiError::not_found(msg),
            DatabaseError::Conflict(msg) => ApiError::conflict(msg),
            DatabaseError::InvalidReference(msg) => ApiError::bad_request(msg),
            DatabaseError::Filter(err) => err.into(),
            DatabaseError::ConfigMissing(name) => {
                tracing::error!("Database not configured: {} is missing", name);
                ApiError::service_unavailable("Database temporarily unavailable")
            }
            DatabaseError::Sqlx(sqlx::Error::PoolTimedOut) => {
                tracing::error!("Database pool timed out");
                ApiError::service_unavailable("Database temporarily unavailable")
            }
            DatabaseError::Sqlx(sqlx_err) => {
                // Log the real error but return generic message
                tracing::error!("SQLx error: {}", sqlx_err);
                ApiError::internal_server_error("Database error occurred")
            }
            DatabaseError::Migration(err) => {
                tracing::error!("Migration error: {}", err);
                ApiError::service_unavailable("Service is being updated, please try again later")
            }
        }
    }
}

impl From<ImageError> for ApiError {
    fn from(err: ImageError) -> Self {
        match err {
            ImageError::NotConfigured => ApiError::service_unavailable(err.to_string()),
            ImageError::UnsupportedMediaType(_) => ApiError::UnsupportedMediaType(err.to_string()),
            ImageError::Empty => ApiError::bad_request(err.to_string()),
            ImageError::Config(msg) => {
                tracing::error!("Image host configuration error: {}", msg);
                ApiError::internal_server_error("Image hosting is misconfigured")
            }
            ImageError::Upstream { .. } | ImageError::Http(_) => {
                tracing::error!("Image host error: {}", err);
                ApiError::bad_gateway("Image host request failed")
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidToken(_) | AuthError::InvalidCredentials => ApiError::unauthorized(err.to_string()),
            AuthError::InvalidSecret | AuthError::TokenGeneration(_) | AuthError::Hashing(_) => {
                tracing::error!("Authentication error: {}", err);
                ApiError::internal_server_error("Authentication is unavailable")
            }
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let field_errors = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let message = errs
                    .first()
                    .map(|e| match &e.message {
                        Some(msg) => msg.to_string(),
                        None => format!("Validation failed: {}", e.code),
                    })
                    .unwrap_or_else(|| "Invalid value".to_string());
                (to_pascal_case(field), message)
            })
            .collect::<HashMap<_, _>>();
        ApiError::validation_error("Request validation failed", Some(field_errors))
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidArgument { field, message } => ApiError::field_error(field, message),
            ServiceError::Validation(errors) => errors.into(),
            ServiceError::Filter(err) => err.into(),
            ServiceError::Database(err) => err.into(),
            ServiceError::Image(err) => err.into(),
            ServiceError::Auth(err) => err.into(),
        }
    }
}

/// Request bodies use PascalCase names; report field errors the same way.
fn to_pascal_case(snake: &str) -> String {
    snake
        .split('_')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn missing_rows_are_404_and_conflicts_409() {
        let err: ApiError = DatabaseError::NotFound("Product 9 not found".into()).into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        let err: ApiError = DatabaseError::Conflict("duplicate email".into()).into();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn sqlx_errors_do_not_leak_details() {
        let err: ApiError = DatabaseError::Sqlx(sqlx::Error::Protocol("relation \"x\" broke".into())).into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.message().contains("relation"));
    }

    #[test]
    fn paging_errors_name_the_query_parameter() {
        let err: ApiError = FilterError::InvalidPageSize("pageSize must be at least 1, got 0".into()).into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.to_json()["field_errors"]["pageSize"].is_string());
    }

    #[derive(Validate)]
    struct Input {
        #[validate(length(min = 1))]
        first_name: String,
    }

    #[test]
    fn validation_errors_use_body_field_names() {
        let errors = Input { first_name: String::new() }.validate().unwrap_err();
        let body = ApiError::from(errors).to_json();
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert!(body["field_errors"]["FirstName"].is_string());
    }

    #[test]
    fn upstream_image_failures_are_bad_gateway() {
        let err: ApiError = ImageError::Upstream { status: 500, message: "boom".into() }.into();
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        let err: ApiError = ImageError::UnsupportedMediaType("text/plain".into()).into();
        assert_eq!(err.status_code(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }
}
