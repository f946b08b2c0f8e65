use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::models::SessionModel;
use crate::shared::AppError;

/// Trait for session store operations. The store is the source of truth for
/// revocation: a session id that is not here is not valid, whatever its
/// token says.
#[async_trait]
pub trait SessionRepository {
    async fn create_session(&self, session: &SessionModel) -> Result<(), AppError>;
    async fn session_exists(&self, user_email: &str, session_id: &str) -> Result<bool, AppError>;
    /// Idempotent: revoking a session that is already gone is not an error.
    async fn delete_session(&self, user_email: &str, session_id: &str) -> Result<(), AppError>;
    /// Removes every session for the email, returning how many were dropped.
    async fn delete_all_sessions(&self, user_email: &str) -> Result<u64, AppError>;
}

/// In-memory implementation of SessionRepository for development and testing
pub struct InMemorySessionRepository {
    sessions: Mutex<HashMap<String, SessionModel>>,
}

impl Default for InMemorySessionRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySessionRepository {
    /// Creates a new empty in-memory repository
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the current number of sessions in the repository
    pub fn session_count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    #[instrument(skip(self, session))]
    async fn create_session(&self, session: &SessionModel) -> Result<(), AppError> {
        debug!(session_id = %session.id, user_email = %session.user_email, "Creating session in memory");

        let mut sessions = self.sessions.lock().unwrap();
        if sessions.contains_key(&session.id) {
            warn!(session_id = %session.id, "Session identifier collision");
            return Err(AppError::Database(
                "session identifier collision".to_string(),
            ));
        }
        sessions.insert(session.id.clone(), session.clone());

        debug!(session_id = %session.id, "Session created successfully in memory");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn session_exists(&self, user_email: &str, session_id: &str) -> Result<bool, AppError> {
        let sessions = self.sessions.lock().unwrap();
        let exists = sessions
            .get(session_id)
            .map(|session| session.user_email == user_email)
            .unwrap_or(false);

        debug!(
            session_id = %session_id,
            user_email = %user_email,
            exists = exists,
            "Checked session existence in memory"
        );
        Ok(exists)
    }

    #[instrument(skip(self))]
    async fn delete_session(&self, user_email: &str, session_id: &str) -> Result<(), AppError> {
        debug!(session_id = %session_id, user_email = %user_email, "Deleting session from memory");

        let mut sessions = self.sessions.lock().unwrap();
        let matches_owner = sessions
            .get(session_id)
            .map(|session| session.user_email == user_email)
            .unwrap_or(false);
        if matches_owner {
            sessions.remove(session_id);
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_all_sessions(&self, user_email: &str) -> Result<u64, AppError> {
        let mut sessions = self.sessions.lock().unwrap();
        let initial_count = sessions.len();

        sessions.retain(|_, session| session.user_email != user_email);

        let removed = (initial_count - sessions.len()) as u64;
        debug!(
            user_email = %user_email,
            sessions_removed = removed,
            "Removed all sessions for email from memory"
        );
        Ok(removed)
    }
}

/// PostgreSQL implementation of the session repository
pub struct PostgresSessionRepository {
    pool: PgPool,
}

impl PostgresSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for PostgresSessionRepository {
    #[instrument(skip(self, session))]
    async fn create_session(&self, session: &SessionModel) -> Result<(), AppError> {
        debug!(session_id = %session.id, user_email = %session.user_email, "Creating session in database");

        sqlx::query(
            "INSERT INTO auth_sessions (id, user_email, created_at) VALUES ($1, $2, $3)",
        )
        .bind(&session.id)
        .bind(&session.user_email)
        .bind(session.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to create session in database");
            AppError::Database(e.to_string())
        })?;

        debug!(session_id = %session.id, "Session created successfully in database");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn session_exists(&self, user_email: &str, session_id: &str) -> Result<bool, AppError> {
        let row = sqlx::query(
            "SELECT EXISTS(SELECT 1 FROM auth_sessions WHERE user_email = $1 AND id = $2)",
        )
        .bind(user_email)
        .bind(session_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, session_id = %session_id, "Failed to check session existence");
            AppError::Database(e.to_string())
        })?;

        Ok(row.get(0))
    }

    #[instrument(skip(self))]
    async fn delete_session(&self, user_email: &str, session_id: &str) -> Result<(), AppError> {
        debug!(session_id = %session_id, user_email = %user_email, "Deleting session from database");

        // Idempotent by design: zero affected rows is fine
        sqlx::query("DELETE FROM auth_sessions WHERE user_email = $1 AND id = $2")
            .bind(user_email)
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, session_id = %session_id, "Failed to delete session from database");
                AppError::Database(e.to_string())
            })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_all_sessions(&self, user_email: &str) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM auth_sessions WHERE user_email = $1")
            .bind(user_email)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, user_email = %user_email, "Failed to delete sessions for email");
                AppError::Database(e.to_string())
            })?;

        let removed = result.rows_affected();
        debug!(
            user_email = %user_email,
            sessions_removed = removed,
            "Removed all sessions for email from database"
        );
        Ok(removed)
    }
}
