//! Business layer: argument checks in front of the repositories.
//!
//! Every service rejects non-positive ids and bad paging values before any
//! database round trip, runs `validator` on write inputs and otherwise
//! passes through.

pub mod auth_service;
pub mod category_service;
pub mod customer_service;
pub mod employee_service;
pub mod image_service;
pub mod order_service;
pub mod product_service;

pub use auth_service::{AuthService, AuthenticatedUser, LoginRequest, LoginResponse};
pub use category_service::CategoryService;
pub use customer_service::CustomerService;
pub use employee_service::EmployeeService;
pub use image_service::ImageService;
pub use order_service::OrderService;
pub use product_service::ProductService;

use thiserror::Error;
use validator::ValidationErrors;

use crate::auth::AuthError;
use crate::database::DatabaseError;
use crate::filter::FilterError;
use crate::images::ImageError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{field}: {message}")]
    InvalidArgument { field: &'static str, message: String },

    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Image(#[from] ImageError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

pub(crate) fn positive_id(field: &'static str, id: i32) -> ServiceResult<i32> {
    if id <= 0 {
        return Err(ServiceError::InvalidArgument {
            field,
            message: format!("{} must be a positive integer, got {}", field, id),
        });
    }
    Ok(id)
}

/// Same check for an id that arrives as an optional filter value
pub(crate) fn positive_filter_id(field: &'static str, id: Option<i32>) -> ServiceResult<()> {
    if let Some(id) = id {
        positive_id(field, id)?;
    }
    Ok(())
}
