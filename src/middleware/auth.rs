use axum::{
    extract::Request,
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use serde::Serialize;

use crate::auth::{validate_jwt, Claims, Role};
use crate::error::ApiError;

/// Authenticated caller extracted from the bearer token
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AuthUser {
    pub id: i32,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Role,
}

impl TryFrom<Claims> for AuthUser {
    type Error = ApiError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        Ok(Self {
            id: claims.subject_id()?,
            email: claims.email,
            phone: claims.phone,
            role: claims.role,
        })
    }
}

impl AuthUser {
    pub fn is_staff(&self) -> bool {
        self.role.is_staff()
    }

    pub fn require_role(&self, allowed: &[Role]) -> Result<(), ApiError> {
        if allowed.contains(&self.role) {
            return Ok(());
        }
        tracing::warn!("{} {} denied: requires one of {:?}", self.role, self.id, allowed);
        Err(ApiError::forbidden("Insufficient permissions"))
    }

    pub fn require_staff(&self) -> Result<(), ApiError> {
        self.require_role(&[Role::Employee, Role::Admin])
    }

    pub fn require_admin(&self) -> Result<(), ApiError> {
        self.require_role(&[Role::Admin])
    }

    /// Staff see every customer; a customer only sees themself
    pub fn can_access_customer(&self, customer_id: i32) -> bool {
        self.is_staff() || (self.role == Role::Customer && self.id == customer_id)
    }

    pub fn ensure_can_access_customer(&self, customer_id: i32) -> Result<(), ApiError> {
        if self.can_access_customer(customer_id) {
            Ok(())
        } else {
            Err(ApiError::forbidden("Insufficient permissions"))
        }
    }
}

/// JWT authentication middleware that validates tokens and extracts user context
pub async fn jwt_auth_middleware(headers: HeaderMap, mut request: Request, next: Next) -> Result<Response, ApiError> {
    let token = extract_jwt_from_headers(&headers).map_err(ApiError::unauthorized)?;
    let claims = validate_jwt(token)?;

    let auth_user = AuthUser::try_from(claims)?;
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<&str, String> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        let token = token.trim();
        if token.is_empty() {
            return Err("Empty JWT token".to_string());
        }
        Ok(token)
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn user(id: i32, role: Role) -> AuthUser {
        AuthUser { id, email: None, phone: None, role }
    }

    #[test]
    fn customers_only_reach_their_own_records() {
        assert!(user(7, Role::Customer).can_access_customer(7));
        assert!(!user(7, Role::Customer).can_access_customer(8));
        assert!(user(1, Role::Employee).can_access_customer(8));
        assert!(user(1, Role::Admin).can_access_customer(8));
    }

    #[test]
    fn role_gates() {
        assert!(user(1, Role::Customer).require_staff().is_err());
        assert!(user(1, Role::Employee).require_staff().is_ok());
        assert!(user(1, Role::Employee).require_admin().is_err());
        assert!(user(1, Role::Admin).require_admin().is_ok());
    }

    #[test]
    fn bearer_header_parsing() {
        let mut headers = HeaderMap::new();
        assert!(extract_jwt_from_headers(&headers).is_err());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(extract_jwt_from_headers(&headers).is_err());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer   "));
        assert!(extract_jwt_from_headers(&headers).is_err());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(extract_jwt_from_headers(&headers).unwrap(), "abc.def.ghi");
    }
}
