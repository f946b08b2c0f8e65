use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::models::UserModel;
use crate::shared::AppError;

/// Trait for user directory operations
#[async_trait]
pub trait UserRepository {
    /// Inserts a user relying on the store's uniqueness constraint; a
    /// duplicate email is reported as [`AppError::Conflict`]. There is no
    /// pre-check, so concurrent registrations cannot race past it.
    async fn create_user(&self, user: &UserModel) -> Result<UserModel, AppError>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<UserModel>, AppError>;
    async fn list_users(&self) -> Result<Vec<UserModel>, AppError>;
    async fn delete_user(&self, email: &str) -> Result<(), AppError>;
    /// One-way transition of the verified flag to true.
    async fn set_verified(&self, email: &str) -> Result<(), AppError>;
    async fn is_verified(&self, email: &str) -> Result<Option<bool>, AppError>;
}

/// In-memory implementation of UserRepository for development and testing
///
/// Keyed by email, matching the primary key of the production table. Data
/// is lost when the process exits.
pub struct InMemoryUserRepository {
    users: Mutex<HashMap<String, UserModel>>,
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryUserRepository {
    /// Creates a new empty in-memory repository
    pub fn new() -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
        }
    }

    /// Creates an in-memory repository with pre-populated users
    pub fn with_users(users: Vec<UserModel>) -> Self {
        let mut user_map = HashMap::new();
        for user in users {
            user_map.insert(user.email.clone(), user);
        }

        Self {
            users: Mutex::new(user_map),
        }
    }

    /// Returns the current number of users in the repository
    pub fn user_count(&self) -> usize {
        self.users.lock().unwrap().len()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    #[instrument(skip(self, user))]
    async fn create_user(&self, user: &UserModel) -> Result<UserModel, AppError> {
        debug!(email = %user.email, "Creating user in memory");

        let mut users = self.users.lock().unwrap();
        if users.contains_key(&user.email) {
            warn!(email = %user.email, "Email already registered");
            return Err(AppError::Conflict(
                "the email is already registered".to_string(),
            ));
        }
        users.insert(user.email.clone(), user.clone());

        debug!(email = %user.email, "User created successfully in memory");
        Ok(user.clone())
    }

    #[instrument(skip(self))]
    async fn get_user_by_email(&self, email: &str) -> Result<Option<UserModel>, AppError> {
        debug!(email = %email, "Fetching user from memory");

        let users = self.users.lock().unwrap();
        Ok(users.get(email).cloned())
    }

    #[instrument(skip(self))]
    async fn list_users(&self) -> Result<Vec<UserModel>, AppError> {
        debug!("Listing all users in memory");

        let users = self.users.lock().unwrap();
        Ok(users.values().cloned().collect())
    }

    #[instrument(skip(self))]
    async fn delete_user(&self, email: &str) -> Result<(), AppError> {
        debug!(email = %email, "Deleting user from memory");

        let mut users = self.users.lock().unwrap();
        if users.remove(email).is_none() {
            warn!(email = %email, "User not found for deletion");
            return Err(AppError::NotFound("user not found".to_string()));
        }

        debug!(email = %email, "User deleted successfully from memory");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn set_verified(&self, email: &str) -> Result<(), AppError> {
        debug!(email = %email, "Marking user verified in memory");

        let mut users = self.users.lock().unwrap();
        match users.get_mut(email) {
            Some(user) => {
                user.verified = true;
                Ok(())
            }
            None => {
                warn!(email = %email, "User not found for verification");
                Err(AppError::NotFound("user not found".to_string()))
            }
        }
    }

    #[instrument(skip(self))]
    async fn is_verified(&self, email: &str) -> Result<Option<bool>, AppError> {
        let users = self.users.lock().unwrap();
        Ok(users.get(email).map(|user| user.verified))
    }
}

/// PostgreSQL implementation of the user repository
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_user(row: &sqlx::postgres::PgRow) -> UserModel {
    UserModel {
        email: row.get("email"),
        username: row.get("username"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        hashed_password: row.get("hashed_password"),
        date_of_birth: row.get("date_of_birth"),
        verified: row.get("verified"),
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    #[instrument(skip(self, user))]
    async fn create_user(&self, user: &UserModel) -> Result<UserModel, AppError> {
        debug!(email = %user.email, "Creating user in database");

        let row = sqlx::query(
            "INSERT INTO users (email, username, first_name, last_name, hashed_password, date_of_birth, verified) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING email, username, first_name, last_name, hashed_password, date_of_birth, verified",
        )
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.hashed_password)
        .bind(user.date_of_birth)
        .bind(user.verified)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            // Typed constraint classification; the unique violation on the
            // email primary key is the single source of conflict truth.
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                warn!(email = %user.email, "Email already registered");
                AppError::Conflict("the email is already registered".to_string())
            }
            _ => {
                warn!(error = %e, "Failed to create user in database");
                AppError::Database(e.to_string())
            }
        })?;

        debug!(email = %user.email, "User created successfully in database");
        Ok(row_to_user(&row))
    }

    #[instrument(skip(self))]
    async fn get_user_by_email(&self, email: &str) -> Result<Option<UserModel>, AppError> {
        debug!(email = %email, "Fetching user from database");

        let row = sqlx::query(
            "SELECT email, username, first_name, last_name, hashed_password, date_of_birth, verified \
             FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, email = %email, "Failed to fetch user from database");
            AppError::Database(e.to_string())
        })?;

        Ok(row.map(|row| row_to_user(&row)))
    }

    #[instrument(skip(self))]
    async fn list_users(&self) -> Result<Vec<UserModel>, AppError> {
        debug!("Listing all users from database");

        let rows = sqlx::query(
            "SELECT email, username, first_name, last_name, hashed_password, date_of_birth, verified \
             FROM users ORDER BY email",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to list users from database");
            AppError::Database(e.to_string())
        })?;

        Ok(rows.iter().map(row_to_user).collect())
    }

    #[instrument(skip(self))]
    async fn delete_user(&self, email: &str) -> Result<(), AppError> {
        debug!(email = %email, "Deleting user from database");

        let result = sqlx::query("DELETE FROM users WHERE email = $1")
            .bind(email)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, email = %email, "Failed to delete user from database");
                AppError::Database(e.to_string())
            })?;

        if result.rows_affected() == 0 {
            warn!(email = %email, "User not found for deletion");
            return Err(AppError::NotFound("user not found".to_string()));
        }

        debug!(email = %email, "User deleted successfully from database");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn set_verified(&self, email: &str) -> Result<(), AppError> {
        debug!(email = %email, "Marking user verified in database");

        let result = sqlx::query("UPDATE users SET verified = TRUE WHERE email = $1")
            .bind(email)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, email = %email, "Failed to mark user verified");
                AppError::Database(e.to_string())
            })?;

        if result.rows_affected() == 0 {
            warn!(email = %email, "User not found for verification");
            return Err(AppError::NotFound("user not found".to_string()));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn is_verified(&self, email: &str) -> Result<Option<bool>, AppError> {
        let row = sqlx::query("SELECT verified FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, email = %email, "Failed to read verified flag");
                AppError::Database(e.to_string())
            })?;

        Ok(row.map(|row| row.get("verified")))
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::Arc;

    /// Test helper functions for creating test data
    mod helpers {
        use super::*;
        use chrono::NaiveDate;

        /// Creates a valid user for testing
        pub fn create_test_user(email: &str) -> UserModel {
            UserModel::new(
                email.to_string(),
                "test-user".to_string(),
                "Test".to_string(),
                "User".to_string(),
                "$2b$12$abcdefghijklmnopqrstuv".to_string(),
                NaiveDate::from_ymd_opt(1990, 2, 1).unwrap(),
            )
        }
    }

    use helpers::*;

    #[tokio::test]
    async fn test_create_and_get_user() {
        let repo = InMemoryUserRepository::new();
        let user = create_test_user("a@x.com");

        repo.create_user(&user).await.unwrap();

        let retrieved = repo.get_user_by_email("a@x.com").await.unwrap();
        assert!(retrieved.is_some());
        let retrieved_user = retrieved.unwrap();
        assert_eq!(retrieved_user.email, user.email);
        assert!(!retrieved_user.verified);
    }

    #[tokio::test]
    async fn test_get_nonexistent_user() {
        let repo = InMemoryUserRepository::new();

        let result = repo.get_user_by_email("nobody@x.com").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let repo = InMemoryUserRepository::new();
        let user = create_test_user("a@x.com");

        repo.create_user(&user).await.unwrap();

        let result = repo.create_user(&user).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert_eq!(repo.user_count(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_registrations_one_wins() {
        let repo = Arc::new(InMemoryUserRepository::new());

        let handles = (0..2)
            .map(|_| {
                let repo = Arc::clone(&repo);
                tokio::spawn(async move {
                    let user = create_test_user("a@x.com");
                    repo.create_user(&user).await
                })
            })
            .collect::<Vec<_>>();

        let results = futures::future::join_all(handles).await;
        let successes = results
            .iter()
            .filter(|r| r.as_ref().unwrap().is_ok())
            .count();
        let conflicts = results
            .iter()
            .filter(|r| {
                matches!(r.as_ref().unwrap(), Err(AppError::Conflict(_)))
            })
            .count();

        assert_eq!(successes, 1);
        assert_eq!(conflicts, 1);
        assert_eq!(repo.user_count(), 1);
    }

    #[tokio::test]
    async fn test_list_users() {
        let repo = InMemoryUserRepository::with_users(vec![
            create_test_user("a@x.com"),
            create_test_user("b@x.com"),
            create_test_user("c@x.com"),
        ]);

        let users = repo.list_users().await.unwrap();
        assert_eq!(users.len(), 3);

        let emails: std::collections::HashSet<String> =
            users.iter().map(|u| u.email.clone()).collect();
        assert!(emails.contains("a@x.com"));
        assert!(emails.contains("b@x.com"));
        assert!(emails.contains("c@x.com"));
    }

    #[tokio::test]
    async fn test_delete_user() {
        let repo = InMemoryUserRepository::new();
        let user = create_test_user("a@x.com");

        repo.create_user(&user).await.unwrap();
        repo.delete_user("a@x.com").await.unwrap();

        let result = repo.get_user_by_email("a@x.com").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_delete_nonexistent_user() {
        let repo = InMemoryUserRepository::new();

        let result = repo.delete_user("nobody@x.com").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_set_verified_transitions_once() {
        let repo = InMemoryUserRepository::new();
        let user = create_test_user("a@x.com");

        repo.create_user(&user).await.unwrap();
        assert_eq!(repo.is_verified("a@x.com").await.unwrap(), Some(false));

        repo.set_verified("a@x.com").await.unwrap();
        assert_eq!(repo.is_verified("a@x.com").await.unwrap(), Some(true));

        // Setting again keeps it true
        repo.set_verified("a@x.com").await.unwrap();
        assert_eq!(repo.is_verified("a@x.com").await.unwrap(), Some(true));
    }

    #[tokio::test]
    async fn test_set_verified_unknown_user() {
        let repo = InMemoryUserRepository::new();

        let result = repo.set_verified("nobody@x.com").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_is_verified_unknown_user() {
        let repo = InMemoryUserRepository::new();

        let result = repo.is_verified("nobody@x.com").await.unwrap();
        assert!(result.is_none());
    }
}
