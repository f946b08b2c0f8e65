use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Database model for the users table
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserModel {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub hashed_password: String,
    pub date_of_birth: NaiveDate,
    pub verified: bool,
}

impl UserModel {
    /// Creates a new unverified user record. Verification only ever flips
    /// the flag through the store, never back.
    pub fn new(
        email: String,
        username: String,
        first_name: String,
        last_name: String,
        hashed_password: String,
        date_of_birth: NaiveDate,
    ) -> Self {
        Self {
            email,
            username,
            first_name,
            last_name,
            hashed_password,
            date_of_birth,
            verified: false,
        }
    }
}
