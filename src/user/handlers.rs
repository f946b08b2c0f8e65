use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::{
    service::UserService,
    types::{CreateUserRequest, UserResponse},
};
use crate::mail::verification_link;
use crate::session::{service::SessionService, AuthedUser};
use crate::shared::{AppError, AppState};

const VERIFICATION_SUBJECT: &str = "Verify your email";

/// Query shape for the endpoints addressed by email instead of by token
#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    pub email: Option<String>,
}

fn sessions(state: &AppState) -> SessionService {
    SessionService::new(
        Arc::clone(&state.session_repository),
        state.token_config.clone(),
    )
}

fn verification_mail_body(state: &AppState, token: &str) -> String {
    format!(
        "Click here to verify your email: {}",
        verification_link(&state.backend_url, token)
    )
}

/// HTTP handler for registering a new user
///
/// POST /user
/// Returns 201 with the public user view. A failed verification mail is
/// reported inside the 201 body, never as a failure status.
#[instrument(name = "create_user", skip(state, request))]
pub async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<Response, AppError> {
    let users = UserService::new(Arc::clone(&state.user_repository));
    let user = users.register(request).await?;

    // Session and token failures are fatal; only the mail itself is not
    let token = sessions(&state).open_session(&user.email).await?;

    info!(email = %user.email, "User created, sending verification mail");

    let mail_result = state
        .mailer
        .send(
            &user.email,
            VERIFICATION_SUBJECT,
            &verification_mail_body(&state, &token),
        )
        .await;

    match mail_result {
        Ok(()) => Ok((StatusCode::CREATED, Json(user)).into_response()),
        Err(e) => {
            warn!(email = %user.email, error = %e, "Could not send verification mail");
            Ok((
                StatusCode::CREATED,
                Json(json!({
                    "message": "account created, but could not send email",
                    "user": user,
                    "error": "email not sent",
                })),
            )
                .into_response())
        }
    }
}

/// HTTP handler for listing all users
///
/// GET /users
/// Returns the public view of every user
#[instrument(name = "list_users", skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let users = UserService::new(Arc::clone(&state.user_repository));
    let all = users.list_users().await?;

    info!(user_count = all.len(), "Users listed successfully");
    Ok(Json(all))
}

/// HTTP handler for fetching the authenticated user's own record
///
/// GET /user (bearer)
#[instrument(name = "get_user", skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthedUser>,
) -> Result<Json<UserResponse>, AppError> {
    let users = UserService::new(Arc::clone(&state.user_repository));
    let user = users.get_user(&caller.email).await?;
    Ok(Json(user))
}

/// HTTP handler for deleting the authenticated user's account
///
/// DELETE /user (bearer)
/// Revokes the calling session, deletes the record, then drops whatever
/// sessions remain so stale tokens die with the account.
#[instrument(name = "delete_user", skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthedUser>,
) -> Result<Json<serde_json::Value>, AppError> {
    let sessions = sessions(&state);
    sessions.revoke(&caller.email, &caller.session_id).await?;

    let users = UserService::new(Arc::clone(&state.user_repository));
    users.delete_user(&caller.email).await?;

    if let Err(e) = sessions.revoke_all(&caller.email).await {
        warn!(email = %caller.email, error = %e, "Could not clear remaining sessions for deleted account");
    }

    info!(email = %caller.email, "User deleted");
    Ok(Json(json!({ "deleted": caller.email })))
}

/// HTTP handler for consuming an emailed verification link
///
/// GET /user/verify?token=... (verification token)
/// Marks the user verified, then revokes all sessions for the email: the
/// verification session is single-use and must not live on as a bearer
/// token. A failed revoke is logged, not surfaced.
#[instrument(name = "verify_user", skip(state))]
pub async fn verify_user(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthedUser>,
) -> Result<Json<serde_json::Value>, AppError> {
    let users = UserService::new(Arc::clone(&state.user_repository));
    users.set_verified(&caller.email).await?;

    if let Err(e) = sessions(&state).revoke_all(&caller.email).await {
        warn!(email = %caller.email, error = %e, "Could not revoke sessions after verification");
    }

    info!(email = %caller.email, "User verified");
    Ok(Json(json!({ "verified": caller.email })))
}

/// HTTP handler for checking a verification flag
///
/// GET /user/isVerified?email=...
#[instrument(name = "is_verified", skip(state))]
pub async fn is_verified(
    State(state): State<AppState>,
    Query(query): Query<EmailQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let email = query
        .email
        .filter(|email| !email.is_empty())
        .ok_or_else(|| AppError::Validation("email not provided".to_string()))?;

    let users = UserService::new(Arc::clone(&state.user_repository));
    let verified = users.is_verified(&email).await?;

    Ok(Json(json!({ "verified": verified })))
}

/// HTTP handler for re-sending the verification mail
///
/// GET /user/resendVerificationMail?email=...
/// Unknown and already-verified emails are client errors here; a delivery
/// failure is a server error because delivery is the whole point.
#[instrument(name = "resend_verification_mail", skip(state))]
pub async fn resend_verification_mail(
    State(state): State<AppState>,
    Query(query): Query<EmailQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let email = query
        .email
        .filter(|email| !email.is_empty())
        .ok_or_else(|| AppError::Validation("email not provided".to_string()))?;

    let users = UserService::new(Arc::clone(&state.user_repository));
    match users.is_verified(&email).await {
        Ok(false) => {}
        Ok(true) => {
            return Err(AppError::Validation(
                "email is already verified".to_string(),
            ))
        }
        Err(AppError::NotFound(_)) => {
            return Err(AppError::Validation(
                "email is not registered".to_string(),
            ))
        }
        Err(e) => return Err(e),
    }

    let token = sessions(&state).open_session(&email).await?;
    state
        .mailer
        .send(
            &email,
            VERIFICATION_SUBJECT,
            &verification_mail_body(&state, &token),
        )
        .await?;

    info!(email = %email, "Verification mail re-sent");
    Ok(Json(json!({ "message": "verification mail sent" })))
}
