use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError};

use crate::auth::Role;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "PascalCase")]
pub struct Employee {
    pub employee_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub hire_date: NaiveDateTime,
    pub is_active: bool,
}

pub const EMPLOYEE_COLUMNS: &str =
    "employee_id, first_name, last_name, email, phone, role, hire_date, is_active";

#[derive(Debug, Clone, FromRow)]
pub struct EmployeeCredentials {
    pub employee_id: i32,
    pub email: String,
    pub phone: Option<String>,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub password_hash: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeFilter {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    #[serde(default, deserialize_with = "super::deserialize_opt_datetime")]
    pub hire_date: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "PascalCase")]
pub struct NewEmployee {
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 5, max = 32))]
    pub phone: Option<String>,
    #[validate(custom = "staff_role")]
    pub role: Role,
    #[serde(default, deserialize_with = "super::deserialize_opt_datetime")]
    pub hire_date: Option<NaiveDateTime>,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

/// Absent fields keep their stored value
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateEmployee {
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 5, max = 32))]
    pub phone: Option<String>,
    #[validate(custom = "staff_role")]
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

fn staff_role(role: &Role) -> Result<(), ValidationError> {
    if role.is_staff() {
        Ok(())
    } else {
        Err(ValidationError::new("staff_role"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn employees_cannot_hold_the_customer_role() {
        let input = UpdateEmployee { role: Some(Role::Customer), ..Default::default() };
        assert!(input.validate().unwrap_err().field_errors().contains_key("role"));
        let input = UpdateEmployee { role: Some(Role::Admin), ..Default::default() };
        assert!(input.validate().is_ok());
    }

    #[test]
    fn filter_parses_role_and_hire_date() {
        let f: EmployeeFilter = serde_json::from_str(r#"{"role": "Admin", "hireDate": "2023-09-01T08:00:00"}"#).unwrap();
        assert_eq!(f.role, Some(Role::Admin));
        assert_eq!(f.hire_date.unwrap().to_string(), "2023-09-01 08:00:00");
    }
}
