pub mod auth;
pub mod response;
pub mod extract;

pub use auth::{jwt_auth_middleware, AuthUser};
pub use response::{ApiResponse, ApiResult};
pub use extract::{JsonBody, PathParams, QueryParams};
