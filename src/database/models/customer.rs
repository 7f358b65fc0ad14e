use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Public projection; the password hash is never selected into it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "PascalCase")]
pub struct Customer {
    pub customer_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

pub const CUSTOMER_COLUMNS: &str =
    "customer_id, first_name, last_name, email, phone, address, is_active, created_at";

#[derive(Debug, Clone, FromRow)]
pub struct CustomerCredentials {
    pub customer_id: i32,
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerFilter {
    /// Matches the first name
    pub name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_active: Option<bool>,
    #[serde(default, deserialize_with = "super::deserialize_opt_datetime")]
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "PascalCase")]
pub struct NewCustomer {
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 5, max = 32))]
    pub phone: Option<String>,
    #[validate(length(max = 500))]
    pub address: Option<String>,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

/// Absent fields keep their stored value
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateCustomer {
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 5, max = 32))]
    pub phone: Option<String>,
    #[validate(length(max = 500))]
    pub address: Option<String>,
    pub is_active: Option<bool>,
}
