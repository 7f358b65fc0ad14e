use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use validator::Validate;

use super::{CustomerService, ServiceResult};
use crate::auth::{generate_jwt, password, AuthError, Claims, Role};
use crate::database::models::NewCustomer;
use crate::database::{CustomerRepository, EmployeeRepository};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email or phone number
    #[validate(length(min = 1, max = 255))]
    pub login: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthenticatedUser {
    pub id: i32,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: &'static str,
    /// Seconds until the token expires
    pub expires_in: i64,
    pub user: AuthenticatedUser,
}

impl LoginResponse {
    fn issue(user: AuthenticatedUser) -> Result<Self, AuthError> {
        let claims = Claims::new(user.id, Some(user.email.clone()), user.phone.clone(), user.role);
        let token = generate_jwt(&claims)?;
        Ok(Self { token, token_type: "Bearer", expires_in: claims.exp - claims.iat, user })
    }
}

pub struct AuthService {
    customers: CustomerRepository,
    employees: EmployeeRepository,
    registration: CustomerService,
}

impl AuthService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            customers: CustomerRepository::new(pool.clone()),
            employees: EmployeeRepository::new(pool.clone()),
            registration: CustomerService::new(pool),
        }
    }

    /// Unknown login, inactive account and wrong password all answer with
    /// the same error.
    pub async fn login_customer(&self, request: &LoginRequest) -> ServiceResult<LoginResponse> {
        request.validate()?;
        let Some(account) = self.customers.find_credentials_by_login(request.login.trim()).await? else {
            tracing::warn!("Customer login failed: unknown login");
            return Err(AuthError::InvalidCredentials.into());
        };
        if !account.is_active || !password::verify_password(request.password.clone(), account.password_hash).await {
            tracing::warn!("Customer login failed for customer {}", account.customer_id);
            return Err(AuthError::InvalidCredentials.into());
        }

        let user = AuthenticatedUser {
            id: account.customer_id,
            email: account.email,
            phone: account.phone,
            role: Role::Customer,
        };
        tracing::info!("Customer {} logged in", user.id);
        Ok(LoginResponse::issue(user)?)
    }

    pub async fn login_employee(&self, request: &LoginRequest) -> ServiceResult<LoginResponse> {
        request.validate()?;
        let Some(account) = self.employees.find_credentials_by_login(request.login.trim()).await? else {
            tracing::warn!("Employee login failed: unknown login");
            return Err(AuthError::InvalidCredentials.into());
        };
        if !account.is_active || !password::verify_password(request.password.clone(), account.password_hash).await {
            tracing::warn!("Employee login failed for employee {}", account.employee_id);
            return Err(AuthError::InvalidCredentials.into());
        }

        let user = AuthenticatedUser {
            id: account.employee_id,
            email: account.email,
            phone: account.phone,
            role: account.role,
        };
        tracing::info!("Employee {} logged in as {}", user.id, user.role);
        Ok(LoginResponse::issue(user)?)
    }

    /// Creates the customer and signs them in
    pub async fn register(&self, input: &NewCustomer) -> ServiceResult<LoginResponse> {
        let customer = self.registration.register(input).await?;
        let user = AuthenticatedUser {
            id: customer.customer_id,
            email: customer.email,
            phone: customer.phone,
            role: Role::Customer,
        };
        Ok(LoginResponse::issue(user)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_carries_the_user() {
        let user = AuthenticatedUser { id: 5, email: "ops@example.com".into(), phone: None, role: Role::Admin };
        let response = LoginResponse::issue(user).unwrap();
        assert_eq!(response.token_type, "Bearer");
        assert!(response.expires_in > 0);

        let claims = crate::auth::validate_jwt(&response.token).unwrap();
        assert_eq!(claims.subject_id().unwrap(), 5);
        assert_eq!(claims.role, Role::Admin);
    }

    #[test]
    fn blank_login_fails_validation() {
        let request = LoginRequest { login: String::new(), password: "pw".into() };
        assert!(request.validate().is_err());
    }
}
