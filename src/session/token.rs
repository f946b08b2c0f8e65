use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::models::SessionModel;
use super::types::SessionClaims;
use crate::shared::AppError;

/// Issuer claim stamped into every token and required on verification
pub const TOKEN_ISSUER: &str = "userauth";

/// Configuration for JWT token operations. The secret is guaranteed present
/// by the startup config loader; construction never reads the environment.
#[derive(Clone)]
pub struct TokenConfig {
    secret: String,
    pub expiration_days: i64,
}

impl TokenConfig {
    pub fn new(secret: String, expiration_days: i64) -> Self {
        Self {
            secret,
            expiration_days,
        }
    }

    /// Signs a bearer token referencing the given session
    #[instrument(skip(self, session))]
    pub fn issue(&self, session: &SessionModel) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = SessionClaims {
            email: session.user_email.clone(),
            session_id: session.id.clone(),
            iss: TOKEN_ISSUER.to_string(),
            exp: (now + Duration::days(self.expiration_days)).timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_ref()),
        )
        .map_err(|e| {
            debug!(error = %e, "Failed to encode JWT token");
            AppError::Internal(format!("could not sign token: {}", e))
        })
    }

    /// Checks signature, algorithm, issuer, and expiry, then type-checks the
    /// identity claims. Only HS256 is accepted; a token signed with any
    /// other algorithm fails before its claims are looked at. Store
    /// membership is the middleware's job, not this function's.
    #[instrument(skip(self, token))]
    pub fn verify(&self, token: &str) -> Result<SessionClaims, AppError> {
        debug!("Decoding and validating JWT token");

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[TOKEN_ISSUER]);

        let claims = decode::<SessionClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_ref()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| {
            debug!(error = %e, "Failed to decode JWT token");
            AppError::Unauthorized(format!("invalid token: {}", e))
        })?;

        if claims.email.is_empty() {
            return Err(AppError::Unauthorized("invalid email claim".to_string()));
        }
        if Uuid::parse_str(&claims.session_id).is_err() {
            return Err(AppError::Unauthorized(
                "invalid session identifier claim".to_string(),
            ));
        }

        debug!(
            email = %claims.email,
            session_id = %claims.session_id,
            "JWT token decoded successfully"
        );
        Ok(claims)
    }
}
