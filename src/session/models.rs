use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for the auth_sessions table. One row per login (or per
/// issued verification link); deleting the row revokes every token that
/// references it.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SessionModel {
    pub id: String, // UUID v4 as string
    pub user_email: String,
    pub created_at: DateTime<Utc>,
}

impl SessionModel {
    /// Creates a new session record with a fresh random identifier
    pub fn new(user_email: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_email,
            created_at: Utc::now(),
        }
    }
}
