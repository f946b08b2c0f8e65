use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::{models::SessionModel, repository::SessionRepository, token::TokenConfig};
use crate::shared::AppError;

/// Service for session business logic: opening a session produces the
/// bearer token for it, revoking one kills every copy of that token.
pub struct SessionService {
    repository: Arc<dyn SessionRepository + Send + Sync>,
    token_config: TokenConfig,
}

impl SessionService {
    pub fn new(
        repository: Arc<dyn SessionRepository + Send + Sync>,
        token_config: TokenConfig,
    ) -> Self {
        Self {
            repository,
            token_config,
        }
    }

    /// Persists a fresh session for the email and returns its signed token
    #[instrument(skip(self))]
    pub async fn open_session(&self, user_email: &str) -> Result<String, AppError> {
        let session = SessionModel::new(user_email.to_string());
        self.repository.create_session(&session).await?;

        let token = self.token_config.issue(&session)?;

        info!(
            user_email = %user_email,
            session_id = %session.id,
            "Session opened"
        );
        Ok(token)
    }

    /// Revokes a single session; revoking an already-gone session succeeds
    #[instrument(skip(self))]
    pub async fn revoke(&self, user_email: &str, session_id: &str) -> Result<(), AppError> {
        self.repository
            .delete_session(user_email, session_id)
            .await?;

        info!(user_email = %user_email, session_id = %session_id, "Session revoked");
        Ok(())
    }

    /// Revokes every session for the email
    #[instrument(skip(self))]
    pub async fn revoke_all(&self, user_email: &str) -> Result<u64, AppError> {
        let removed = self.repository.delete_all_sessions(user_email).await?;

        if removed > 0 {
            info!(
                user_email = %user_email,
                sessions_removed = removed,
                "All sessions revoked for email"
            );
        } else {
            warn!(user_email = %user_email, "No sessions to revoke for email");
        }
        Ok(removed)
    }
}
