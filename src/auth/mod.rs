pub mod password;

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config;

/// Role claim consumed by role-gated endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Customer,
    Employee,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "Customer",
            Role::Employee => "Employee",
            Role::Admin => "Admin",
        }
    }

    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Employee | Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("Unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Customer" => Ok(Role::Customer),
            "Employee" => Ok(Role::Employee),
            "Admin" => Ok(Role::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = UnknownRole;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Customer or employee id, depending on `role`
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub role: Role,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(subject_id: i32, email: Option<String>, phone: Option<String>, role: Role) -> Self {
        let now = Utc::now();
        let security = &config::config().security;
        let exp = (now + Duration::hours(security.jwt_expiry_hours as i64)).timestamp();

        Self {
            sub: subject_id.to_string(),
            email,
            phone,
            role,
            iss: security.jwt_issuer.clone(),
            iat: now.timestamp(),
            exp,
        }
    }

    pub fn subject_id(&self) -> Result<i32, AuthError> {
        self.sub
            .parse::<i32>()
            .ok()
            .filter(|id| *id > 0)
            .ok_or_else(|| AuthError::InvalidToken(format!("invalid subject '{}'", self.sub)))
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("JWT secret not configured")]
    InvalidSecret,

    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Password hashing error: {0}")]
    Hashing(String),
}

pub fn generate_jwt(claims: &Claims) -> Result<String, AuthError> {
    let secret = &config::config().security.jwt_secret;
    encode_with_secret(claims, secret)
}

pub fn validate_jwt(token: &str) -> Result<Claims, AuthError> {
    let security = &config::config().security;
    decode_with_secret(token, &security.jwt_secret, &security.jwt_issuer)
}

fn encode_with_secret(claims: &Claims, secret: &str) -> Result<String, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::new(Algorithm::HS256), claims, &encoding_key)
        .map_err(|e| AuthError::TokenGeneration(e.to_string()))
}

fn decode_with_secret(token: &str, secret: &str, issuer: &str) -> Result<Claims, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::InvalidSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[issuer]);

    let token_data = decode::<Claims>(token, &decoding_key, &validation)
        .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(exp_offset_secs: i64) -> Claims {
        let now = Utc::now().timestamp();
        Claims {
            sub: "42".to_string(),
            email: Some("ada@example.com".to_string()),
            phone: None,
            role: Role::Customer,
            iss: "storefront-api".to_string(),
            iat: now,
            exp: now + exp_offset_secs,
        }
    }

    #[test]
    fn round_trips_claims() {
        let token = encode_with_secret(&claims(3600), "s3cret").unwrap();
        let decoded = decode_with_secret(&token, "s3cret", "storefront-api").unwrap();
        assert_eq!(decoded.subject_id().unwrap(), 42);
        assert_eq!(decoded.role, Role::Customer);
        assert_eq!(decoded.email.as_deref(), Some("ada@example.com"));
        assert!(decoded.phone.is_none());
    }

    #[test]
    fn rejects_wrong_secret_issuer_and_expiry() {
        let token = encode_with_secret(&claims(3600), "s3cret").unwrap();
        assert!(decode_with_secret(&token, "other", "storefront-api").is_err());
        assert!(decode_with_secret(&token, "s3cret", "someone-else").is_err());

        let expired = encode_with_secret(&claims(-3600), "s3cret").unwrap();
        assert!(matches!(
            decode_with_secret(&expired, "s3cret", "storefront-api"),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn empty_secret_is_refused() {
        assert!(matches!(encode_with_secret(&claims(60), ""), Err(AuthError::InvalidSecret)));
    }

    #[test]
    fn optional_claims_are_omitted_when_absent() {
        let mut c = claims(60);
        c.email = None;
        let json = serde_json::to_value(&c).unwrap();
        assert!(json.get("email").is_none());
        assert!(json.get("phone").is_none());
        assert_eq!(json["role"], "Customer");
    }

    #[test]
    fn non_numeric_subject_is_invalid() {
        let mut c = claims(60);
        c.sub = "abc".to_string();
        assert!(c.subject_id().is_err());
        c.sub = "0".to_string();
        assert!(c.subject_id().is_err());
    }

    #[test]
    fn parses_roles() {
        assert_eq!("Admin".parse::<Role>().unwrap(), Role::Admin);
        assert!("admin".parse::<Role>().is_err());
        assert!(Role::Employee.is_staff());
        assert!(!Role::Customer.is_staff());
    }
}
