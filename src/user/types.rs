use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::models::UserModel;
use crate::shared::AppError;

/// Request payload for registering a new user
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub date_of_birth: String,
}

/// Request payload for logging in
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Public view of a user. Deliberately omits the password hash and date of
/// birth; this is the only user shape that crosses the HTTP boundary.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct UserResponse {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<&UserModel> for UserResponse {
    fn from(user: &UserModel) -> Self {
        Self {
            email: user.email.clone(),
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        }
    }
}

/// Parses a date of birth in `DD-MM-YYYY` or `DD/MM/YYYY` form. Anything
/// else is a validation failure.
pub fn parse_date_of_birth(date: &str) -> Result<NaiveDate, AppError> {
    let format = if date.contains('-') {
        "%d-%m-%Y"
    } else if date.contains('/') {
        "%d/%m/%Y"
    } else {
        return Err(AppError::Validation("invalid date format".to_string()));
    };

    NaiveDate::parse_from_str(date, format)
        .map_err(|_| AppError::Validation("invalid date format".to_string()))
}
