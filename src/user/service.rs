use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::{
    models::UserModel,
    password,
    repository::UserRepository,
    types::{parse_date_of_birth, CreateUserRequest, UserResponse},
};
use crate::shared::AppError;

/// Service for user directory business logic
pub struct UserService {
    repository: Arc<dyn UserRepository + Send + Sync>,
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepository + Send + Sync>) -> Self {
        Self { repository }
    }

    /// Validates and stores a new registration. The email must look like an
    /// address, the date of birth must be `DD-MM-YYYY` or `DD/MM/YYYY`, and
    /// the password is hashed before anything touches the store.
    #[instrument(skip(self, request))]
    pub async fn register(&self, request: CreateUserRequest) -> Result<UserResponse, AppError> {
        if request.email.parse::<lettre::Address>().is_err() {
            return Err(AppError::Validation("invalid email address".to_string()));
        }
        if request.username.is_empty() {
            return Err(AppError::Validation("username not provided".to_string()));
        }
        if request.password.is_empty() {
            return Err(AppError::Validation("password not provided".to_string()));
        }

        let date_of_birth = parse_date_of_birth(&request.date_of_birth)?;
        let hashed_password = password::hash_password(&request.password)?;

        let user = UserModel::new(
            request.email,
            request.username,
            request.first_name,
            request.last_name,
            hashed_password,
            date_of_birth,
        );

        let stored = self.repository.create_user(&user).await?;

        info!(email = %stored.email, "User registered");
        Ok(UserResponse::from(&stored))
    }

    /// Checks login credentials. Unknown emails and wrong passwords collapse
    /// into one generic rejection so callers can't enumerate accounts;
    /// unverified accounts are rejected before the password is checked.
    #[instrument(skip(self, password_attempt))]
    pub async fn authenticate(&self, email: &str, password_attempt: &str) -> Result<(), AppError> {
        let user = match self.repository.get_user_by_email(email).await? {
            Some(user) => user,
            None => {
                debug!(email = %email, "Login attempt for unknown email");
                return Err(AppError::Unauthorized(
                    "incorrect email or password".to_string(),
                ));
            }
        };

        if !user.verified {
            warn!(email = %email, "Login attempt on unverified account");
            return Err(AppError::Unauthorized("email not verified".to_string()));
        }

        if !password::verify_password(&user.hashed_password, password_attempt)? {
            debug!(email = %email, "Login attempt with wrong password");
            return Err(AppError::Unauthorized(
                "incorrect email or password".to_string(),
            ));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_user(&self, email: &str) -> Result<UserResponse, AppError> {
        self.repository
            .get_user_by_email(email)
            .await?
            .map(|user| UserResponse::from(&user))
            .ok_or_else(|| AppError::NotFound("user not found".to_string()))
    }

    #[instrument(skip(self))]
    pub async fn list_users(&self) -> Result<Vec<UserResponse>, AppError> {
        let users = self.repository.list_users().await?;
        Ok(users.iter().map(UserResponse::from).collect())
    }

    #[instrument(skip(self))]
    pub async fn delete_user(&self, email: &str) -> Result<(), AppError> {
        self.repository.delete_user(email).await
    }

    #[instrument(skip(self))]
    pub async fn set_verified(&self, email: &str) -> Result<(), AppError> {
        self.repository.set_verified(email).await
    }

    #[instrument(skip(self))]
    pub async fn is_verified(&self, email: &str) -> Result<bool, AppError> {
        self.repository
            .is_verified(email)
            .await?
            .ok_or_else(|| AppError::NotFound("user not found".to_string()))
    }
}
